//! Numerus rules: map a count to the index of the `<numerusform>` a
//! translator wrote for it.
//!
//! Slot order follows the order Linguist presents numerus forms for each
//! language, so slot `i` is the `i`-th `<numerusform>` in the catalog.

use crate::LocaleTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluralRule {
    /// One form for every count (Japanese, Chinese, Persian, ...).
    NoPlural,
    /// `1` / everything else.
    Germanic,
    /// `0` and `1` / everything else.
    French,
    /// Ends in 1 except 11 / ends in 2-4 except 12-14 / everything else.
    Slavic,
    /// `1` / `2-4` / everything else.
    Czech,
    /// `1` / ends in 2-4 except 12-14 / everything else.
    Polish,
    /// Ends in 1 except 11 / non-zero / zero.
    Latvian,
    /// Ends in 1 except 11 / ends in 2-9 except 12-19 / everything else.
    Lithuanian,
    /// `1` / `0` or ends in 01-19 / everything else.
    Romanian,
    /// Ends in 01 / ends in 02 / ends in 03-04 / everything else.
    Slovenian,
    /// `1` / `2` / everything else.
    Irish,
    /// `1` / `0` or ends in 01-10 / ends in 11-19 / everything else.
    Maltese,
    /// `0` / `1` / `2` / ends in 03-10 / ends in 11-99 / everything else.
    Arabic,
    /// `1` / `2` / `8` and `11` / everything else.
    Welsh,
    /// Ends in 1 except 11 / everything else.
    Icelandic,
    /// Ends in 1 / ends in 2 / everything else.
    Macedonian,
}

/// Rules keyed by full locale first, then by language. Anything not listed
/// uses [`PluralRule::Germanic`].
const RULE_TABLE: &[(&str, PluralRule)] = &[
    ("pt_BR", PluralRule::French),
    ("ar", PluralRule::Arabic),
    ("be", PluralRule::Slavic),
    ("bo", PluralRule::NoPlural),
    ("bs", PluralRule::Slavic),
    ("cs", PluralRule::Czech),
    ("cy", PluralRule::Welsh),
    ("dz", PluralRule::NoPlural),
    ("fa", PluralRule::NoPlural),
    ("fil", PluralRule::French),
    ("fr", PluralRule::French),
    ("ga", PluralRule::Irish),
    ("hr", PluralRule::Slavic),
    ("id", PluralRule::NoPlural),
    ("is", PluralRule::Icelandic),
    ("ja", PluralRule::NoPlural),
    ("jv", PluralRule::NoPlural),
    ("ka", PluralRule::NoPlural),
    ("km", PluralRule::NoPlural),
    ("ko", PluralRule::NoPlural),
    ("lo", PluralRule::NoPlural),
    ("lt", PluralRule::Lithuanian),
    ("lv", PluralRule::Latvian),
    ("mk", PluralRule::Macedonian),
    ("ms", PluralRule::NoPlural),
    ("mt", PluralRule::Maltese),
    ("my", PluralRule::NoPlural),
    ("pl", PluralRule::Polish),
    ("ro", PluralRule::Romanian),
    ("ru", PluralRule::Slavic),
    ("sk", PluralRule::Czech),
    ("sl", PluralRule::Slovenian),
    ("sr", PluralRule::Slavic),
    ("th", PluralRule::NoPlural),
    ("tr", PluralRule::NoPlural),
    ("uk", PluralRule::Slavic),
    ("vi", PluralRule::NoPlural),
    ("zh", PluralRule::NoPlural),
];

impl PluralRule {
    pub fn for_locale(locale: &LocaleTag) -> Self {
        for tag in locale.fallback_tags() {
            if let Some((_, rule)) = RULE_TABLE
                .iter()
                .find(|(key, _)| *key == tag.normalized())
            {
                return *rule;
            }
        }
        PluralRule::Germanic
    }

    pub fn form_count(self) -> usize {
        match self {
            PluralRule::NoPlural => 1,
            PluralRule::Germanic | PluralRule::French | PluralRule::Icelandic => 2,
            PluralRule::Slavic
            | PluralRule::Czech
            | PluralRule::Polish
            | PluralRule::Latvian
            | PluralRule::Lithuanian
            | PluralRule::Romanian
            | PluralRule::Irish
            | PluralRule::Macedonian => 3,
            PluralRule::Slovenian | PluralRule::Maltese | PluralRule::Welsh => 4,
            PluralRule::Arabic => 6,
        }
    }

    pub fn slot(self, count: u64) -> usize {
        let n = count;
        let mod10 = n % 10;
        let mod100 = n % 100;
        match self {
            PluralRule::NoPlural => 0,
            PluralRule::Germanic => usize::from(n != 1),
            PluralRule::French => usize::from(n > 1),
            PluralRule::Icelandic => usize::from(!(mod10 == 1 && mod100 != 11)),
            PluralRule::Slavic => {
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if (2..=4).contains(&mod10) && !(10..=19).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Czech => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            PluralRule::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&mod10) && !(10..=19).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Latvian => {
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            PluralRule::Lithuanian => {
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if mod10 >= 2 && !(10..=19).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (1..=19).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Slovenian => match mod100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            PluralRule::Irish => match n {
                1 => 0,
                2 => 1,
                _ => 2,
            },
            PluralRule::Maltese => {
                if n == 1 {
                    0
                } else if n == 0 || (1..=10).contains(&mod100) {
                    1
                } else if (11..=19).contains(&mod100) {
                    2
                } else {
                    3
                }
            }
            PluralRule::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ if (3..=10).contains(&mod100) => 3,
                _ if (11..=99).contains(&mod100) => 4,
                _ => 5,
            },
            PluralRule::Welsh => match n {
                1 => 0,
                2 => 1,
                8 | 11 => 2,
                _ => 3,
            },
            PluralRule::Macedonian => match mod10 {
                1 => 0,
                2 => 1,
                _ => 2,
            },
        }
    }

    /// Picks the variant to show out of `available` authored forms. A
    /// catalog written with fewer forms than this rule knows gets variant 0;
    /// a slot past the end clamps to the last variant.
    pub fn select_variant(self, count: u64, available: usize) -> usize {
        if available == 0 || available < self.form_count() {
            return 0;
        }
        self.slot(count).min(available - 1)
    }
}

/// Slot for `count` under the rule configured for `locale`.
pub fn resolve(locale: &LocaleTag, count: u64) -> usize {
    PluralRule::for_locale(locale).slot(count)
}
