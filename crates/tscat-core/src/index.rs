use std::collections::HashMap;

use crate::{Catalog, CatalogStats, Entry, EntryStatus, LocaleTag, PluralRule};

/// Read-only lookup table over one catalog.
///
/// Entries are bucketed by context, then by source text; each bucket holds
/// one entry per distinct disambiguation, so a lookup is two hash probes
/// plus a scan of what is almost always a single element.
#[derive(Debug)]
pub struct CatalogIndex {
    locale: LocaleTag,
    source_language: Option<LocaleTag>,
    plural_rule: PluralRule,
    contexts: HashMap<String, HashMap<String, Vec<Entry>>>,
    stats: CatalogStats,
    len: usize,
}

impl CatalogIndex {
    /// Indexes `catalog` under `locale`, which takes precedence over the
    /// catalog's declared language. Vanished entries are dropped. When
    /// several entries share a key the last finished one is kept, or the
    /// first one if none is finished.
    pub fn build(locale: LocaleTag, catalog: Catalog) -> Self {
        let stats = catalog.stats();
        let source_language = catalog.source_language().cloned();

        let mut grouped: HashMap<String, HashMap<String, Vec<Vec<Entry>>>> = HashMap::new();
        for context in catalog.into_contexts() {
            for entry in context.entries {
                if entry.status() == EntryStatus::Vanished {
                    continue;
                }
                let buckets = grouped
                    .entry(entry.context().to_string())
                    .or_default()
                    .entry(entry.source().to_string())
                    .or_default();
                match buckets
                    .iter_mut()
                    .find(|group| group[0].disambiguation() == entry.disambiguation())
                {
                    Some(group) => group.push(entry),
                    None => buckets.push(vec![entry]),
                }
            }
        }

        let mut len = 0usize;
        let contexts: HashMap<String, HashMap<String, Vec<Entry>>> = grouped
            .into_iter()
            .map(|(context, sources)| {
                let sources: HashMap<String, Vec<Entry>> = sources
                    .into_iter()
                    .map(|(source, groups)| {
                        let picked: Vec<Entry> = groups.into_iter().filter_map(pick).collect();
                        len += picked.len();
                        (source, picked)
                    })
                    .collect();
                (context, sources)
            })
            .collect();

        Self {
            plural_rule: PluralRule::for_locale(&locale),
            locale,
            source_language,
            contexts,
            stats,
            len,
        }
    }

    /// Exact match on all three key parts. A missing or empty
    /// disambiguation only matches entries that have none.
    pub fn lookup(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
    ) -> Option<&Entry> {
        let disambiguation = disambiguation.filter(|value| !value.is_empty());
        self.contexts
            .get(context)?
            .get(source)?
            .iter()
            .find(|entry| entry.disambiguation() == disambiguation)
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn source_language(&self) -> Option<&LocaleTag> {
        self.source_language.as_ref()
    }

    /// Counts over every entry of the source catalog, vanished included.
    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    /// Number of distinct keys held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.contexts
            .values()
            .flat_map(|sources| sources.values())
            .flat_map(|entries| entries.iter())
    }

    /// The variant of `entry` to show for `count`. Negative or absent counts
    /// select the first variant.
    pub fn text_of<'a>(&self, entry: &'a Entry, count: Option<i64>) -> &'a str {
        let translations = entry.translations();
        let slot = match count {
            Some(count) if count >= 0 && translations.len() > 1 => self
                .plural_rule
                .select_variant(count.unsigned_abs(), translations.len()),
            _ => 0,
        };
        translations.get(slot).map(String::as_str).unwrap_or("")
    }
}

fn pick(group: Vec<Entry>) -> Option<Entry> {
    let last_finished = group
        .iter()
        .rposition(|entry| entry.status() == EntryStatus::Finished);
    let position = last_finished.unwrap_or(0);
    group.into_iter().nth(position)
}
