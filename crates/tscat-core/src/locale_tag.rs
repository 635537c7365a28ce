use crate::{CoreError, CoreResult};

/// A locale identifier in Qt's underscore form (`fa_IR`, `zh_Hant_TW`).
/// Hyphenated BCP 47 input is accepted and normalized to the same form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocaleTag {
    normalized: String,
    match_subtags: Vec<String>,
}

impl LocaleTag {
    pub fn parse(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput("locale tag is empty"));
        }

        // `ru_RU.UTF-8` and `sr_RS@latin` carry POSIX suffixes that do not
        // select a catalog.
        let trimmed = trimmed
            .split(['.', '@'])
            .next()
            .unwrap_or(trimmed);

        let subtags: Vec<&str> = trimmed.split(['_', '-']).collect();
        if subtags.iter().any(|part| part.is_empty()) {
            return Err(CoreError::InvalidInput("locale tag has empty subtag"));
        }

        let mut normalized_parts = Vec::with_capacity(subtags.len());
        let mut match_parts = Vec::with_capacity(subtags.len());
        let mut script_seen = false;
        let mut region_seen = false;
        let mut stop_for_match = false;

        for (idx, part) in subtags.iter().enumerate() {
            if idx == 0 {
                if !is_alpha(part) || !(2..=8).contains(&part.len()) {
                    return Err(CoreError::InvalidInput("invalid language subtag"));
                }
                let lower = part.to_ascii_lowercase();
                normalized_parts.push(lower.clone());
                match_parts.push(lower);
                continue;
            }

            if part.len() == 1 {
                stop_for_match = true;
                normalized_parts.push(part.to_ascii_lowercase());
                continue;
            }

            let normalized = if !script_seen && part.len() == 4 && is_alpha(part) {
                script_seen = true;
                titlecase(part)
            } else if !region_seen && is_region(part) {
                region_seen = true;
                part.to_ascii_uppercase()
            } else {
                part.to_ascii_lowercase()
            };

            normalized_parts.push(normalized.clone());
            if !stop_for_match {
                match_parts.push(normalized);
            }
        }

        Ok(Self {
            normalized: normalized_parts.join("_"),
            match_subtags: match_parts,
        })
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn language(&self) -> &str {
        self.match_subtags
            .first()
            .map(String::as_str)
            .unwrap_or(self.normalized.as_str())
    }

    pub fn match_subtags(&self) -> &[String] {
        &self.match_subtags
    }

    /// This tag followed by each less specific truncation, most specific
    /// first: `sr_Latn_RS`, `sr_Latn`, `sr`.
    pub fn fallback_tags(&self) -> Vec<LocaleTag> {
        let mut tags = vec![self.clone()];
        let mut parts = self.match_subtags.clone();
        if parts.join("_") != self.normalized {
            tags.push(Self::from_parts(&parts));
        }
        while parts.len() > 1 {
            parts.pop();
            tags.push(Self::from_parts(&parts));
        }
        tags
    }

    fn from_parts(parts: &[String]) -> Self {
        Self {
            normalized: parts.join("_"),
            match_subtags: parts.to_vec(),
        }
    }
}

impl core::fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl core::str::FromStr for LocaleTag {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LocaleTag::parse(value)
    }
}

/// Expands a preference list into catalog lookup order: every requested tag
/// is followed by its truncations, and a tag already placed is not repeated.
pub fn expand_locale_order(requested: &[LocaleTag]) -> Vec<LocaleTag> {
    let mut order: Vec<LocaleTag> = Vec::new();
    for tag in requested {
        for candidate in tag.fallback_tags() {
            if !order
                .iter()
                .any(|placed| placed.normalized() == candidate.normalized())
            {
                order.push(candidate);
            }
        }
    }
    order
}

fn is_alpha(value: &str) -> bool {
    value.chars().all(|ch| ch.is_ascii_alphabetic())
}

fn is_region(value: &str) -> bool {
    (value.len() == 2 && is_alpha(value))
        || (value.len() == 3 && value.chars().all(|ch| ch.is_ascii_digit()))
}

fn titlecase(value: &str) -> String {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut output = String::with_capacity(value.len());
    output.push(first.to_ascii_uppercase());
    for ch in chars {
        output.push(ch.to_ascii_lowercase());
    }
    output
}
