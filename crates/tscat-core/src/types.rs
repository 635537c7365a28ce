use core::fmt;

use crate::LocaleTag;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Finished,
    Unfinished,
    Vanished,
}

impl EntryStatus {
    pub fn from_type_attr(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(EntryStatus::Finished),
            Some("unfinished") => Some(EntryStatus::Unfinished),
            Some("vanished") | Some("obsolete") => Some(EntryStatus::Vanished),
            Some(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Finished => "finished",
            EntryStatus::Unfinished => "unfinished",
            EntryStatus::Vanished => "vanished",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a message was extracted from. Carried for tooling only; lookups
/// never consult it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub filename: Option<String>,
    pub line: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    context: String,
    source: String,
    disambiguation: Option<String>,
    translations: Vec<String>,
    status: EntryStatus,
    numerus: bool,
    extra_comment: Option<String>,
    locations: Vec<Location>,
}

impl Entry {
    pub fn new(context: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
            disambiguation: None,
            translations: vec![String::new()],
            status: EntryStatus::Unfinished,
            numerus: false,
            extra_comment: None,
            locations: Vec::new(),
        }
    }

    /// An empty disambiguation is the same as none.
    pub fn with_disambiguation(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.disambiguation = if value.is_empty() { None } else { Some(value) };
        self
    }

    pub fn with_translation(mut self, value: impl Into<String>) -> Self {
        self.translations = vec![value.into()];
        self.numerus = false;
        self
    }

    pub fn with_plural_forms<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translations = forms.into_iter().map(Into::into).collect();
        if self.translations.is_empty() {
            self.translations.push(String::new());
        }
        self.numerus = true;
        self
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_extra_comment(mut self, value: impl Into<String>) -> Self {
        self.extra_comment = Some(value.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// A finished entry whose every variant is empty carries nothing to show.
    pub(crate) fn normalize_status(mut self) -> Self {
        if self.status == EntryStatus::Finished && !self.has_text() {
            self.status = EntryStatus::Unfinished;
        }
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn disambiguation(&self) -> Option<&str> {
        self.disambiguation.as_deref()
    }

    pub fn translations(&self) -> &[String] {
        &self.translations
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn is_numerus(&self) -> bool {
        self.numerus
    }

    pub fn extra_comment(&self) -> Option<&str> {
        self.extra_comment.as_deref()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn has_text(&self) -> bool {
        self.translations.iter().any(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub finished: usize,
    pub unfinished: usize,
    pub vanished: usize,
}

impl CatalogStats {
    pub fn total(&self) -> usize {
        self.finished + self.unfinished + self.vanished
    }

    /// Share of live (non-vanished) entries that are finished, in percent.
    pub fn percent_finished(&self) -> f64 {
        let live = self.finished + self.unfinished;
        if live == 0 {
            100.0
        } else {
            (self.finished as f64 / live as f64) * 100.0
        }
    }
}

/// Every context of one locale's catalog, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    language: Option<LocaleTag>,
    source_language: Option<LocaleTag>,
    contexts: Vec<Context>,
}

impl Catalog {
    pub fn new(language: Option<LocaleTag>, source_language: Option<LocaleTag>) -> Self {
        Self {
            language,
            source_language,
            contexts: Vec::new(),
        }
    }

    /// Appends an entry to its context, opening the context if this is the
    /// first entry seen for it.
    pub fn push_entry(&mut self, entry: Entry) {
        let entry = entry.normalize_status();
        match self
            .contexts
            .iter_mut()
            .find(|context| context.name == entry.context)
        {
            Some(context) => context.entries.push(entry),
            None => self.contexts.push(Context {
                name: entry.context.clone(),
                entries: vec![entry],
            }),
        }
    }

    pub(crate) fn push_context(&mut self, context: Context) {
        self.contexts.push(context);
    }

    pub fn language(&self) -> Option<&LocaleTag> {
        self.language.as_ref()
    }

    pub fn source_language(&self) -> Option<&LocaleTag> {
        self.source_language.as_ref()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn into_contexts(self) -> Vec<Context> {
        self.contexts
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.contexts.iter().flat_map(|context| context.entries.iter())
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for entry in self.entries() {
            match entry.status() {
                EntryStatus::Finished => stats.finished += 1,
                EntryStatus::Unfinished => stats.unfinished += 1,
                EntryStatus::Vanished => stats.vanished += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Entry, EntryStatus};

    #[test]
    fn status_from_type_attribute() {
        assert_eq!(EntryStatus::from_type_attr(None), Some(EntryStatus::Finished));
        assert_eq!(
            EntryStatus::from_type_attr(Some("unfinished")),
            Some(EntryStatus::Unfinished)
        );
        assert_eq!(
            EntryStatus::from_type_attr(Some("obsolete")),
            Some(EntryStatus::Vanished)
        );
        assert_eq!(EntryStatus::from_type_attr(Some("done")), None);
    }

    #[test]
    fn empty_disambiguation_is_none() {
        let entry = Entry::new("Account", "Ready").with_disambiguation("");
        assert_eq!(entry.disambiguation(), None);
    }

    #[test]
    fn finished_without_text_becomes_unfinished() {
        let mut catalog = Catalog::new(None, None);
        catalog.push_entry(
            Entry::new("Account", "Ready")
                .with_translation("")
                .with_status(EntryStatus::Finished),
        );
        let entry = catalog.entries().next().expect("entry");
        assert_eq!(entry.status(), EntryStatus::Unfinished);
    }

    #[test]
    fn push_entry_groups_by_context() {
        let mut catalog = Catalog::new(None, None);
        catalog.push_entry(Entry::new("Account", "Ready"));
        catalog.push_entry(Entry::new("Call", "Ringing"));
        catalog.push_entry(Entry::new("Account", "Error"));
        assert_eq!(catalog.contexts().len(), 2);
        assert_eq!(catalog.contexts()[0].entries.len(), 2);
    }

    #[test]
    fn stats_count_each_status() {
        let mut catalog = Catalog::new(None, None);
        catalog.push_entry(
            Entry::new("A", "one")
                .with_translation("uno")
                .with_status(EntryStatus::Finished),
        );
        catalog.push_entry(Entry::new("A", "two"));
        catalog.push_entry(
            Entry::new("A", "three")
                .with_translation("tres")
                .with_status(EntryStatus::Vanished),
        );
        let stats = catalog.stats();
        assert_eq!(stats.finished, 1);
        assert_eq!(stats.unfinished, 1);
        assert_eq!(stats.vanished, 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.percent_finished(), 50.0);
    }
}
