use std::sync::Arc;

use crate::{CatalogIndex, EntryStatus, LocaleTag};

/// One lookup request: a key plus an optional count for numerus entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationQuery<'a> {
    pub context: &'a str,
    pub source: &'a str,
    pub disambiguation: Option<&'a str>,
    pub count: Option<i64>,
}

impl<'a> TranslationQuery<'a> {
    pub fn new(context: &'a str, source: &'a str) -> Self {
        Self {
            context,
            source,
            disambiguation: None,
            count: None,
        }
    }

    pub fn disambiguation(mut self, value: Option<&'a str>) -> Self {
        self.disambiguation = value;
        self
    }

    pub fn count(mut self, value: Option<i64>) -> Self {
        self.count = value;
        self
    }
}

/// Which link, if any, produced a resolved string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin<'a> {
    Finished(&'a LocaleTag),
    Unfinished(&'a LocaleTag),
    Source,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub text: &'a str,
    pub origin: Origin<'a>,
}

/// Catalog indexes in lookup order, most specific first. The source text
/// itself is the implicit last link.
#[derive(Clone, Debug, Default)]
pub struct FallbackChain {
    links: Vec<Arc<CatalogIndex>>,
}

impl FallbackChain {
    pub fn new(links: Vec<Arc<CatalogIndex>>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[Arc<CatalogIndex>] {
        &self.links
    }

    pub fn locales(&self) -> impl Iterator<Item = &LocaleTag> {
        self.links.iter().map(|link| link.locale())
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The first finished translation wins. Failing that, the first
    /// unfinished translation with text is used, and failing that the
    /// source text is returned unchanged.
    pub fn resolve<'a>(&'a self, query: &TranslationQuery<'a>) -> Resolution<'a> {
        let mut candidate: Option<Resolution<'a>> = None;
        for link in &self.links {
            let Some(entry) = link.lookup(query.context, query.source, query.disambiguation)
            else {
                continue;
            };
            let text = link.text_of(entry, query.count);
            match entry.status() {
                EntryStatus::Finished if !text.is_empty() => {
                    return Resolution {
                        text,
                        origin: Origin::Finished(link.locale()),
                    };
                }
                EntryStatus::Finished | EntryStatus::Unfinished => {
                    if candidate.is_none() && !text.is_empty() {
                        candidate = Some(Resolution {
                            text,
                            origin: Origin::Unfinished(link.locale()),
                        });
                    }
                }
                EntryStatus::Vanished => {}
            }
        }
        candidate.unwrap_or(Resolution {
            text: query.source,
            origin: Origin::Source,
        })
    }

    pub fn lookup(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        count: Option<i64>,
    ) -> String {
        let query = TranslationQuery::new(context, source)
            .disambiguation(disambiguation)
            .count(count);
        self.resolve(&query).text.to_string()
    }
}

/// Replaces `%n` and `%Ln` with `count`, the substitution Qt applies to
/// numerus messages. Negative counts leave the text untouched.
pub fn substitute_count(text: &str, count: i64) -> String {
    if count < 0 || !text.contains('%') {
        return text.to_string();
    }
    let value = count.to_string();
    let mut output = String::with_capacity(text.len() + value.len());
    let mut rest = text;
    while let Some(percent) = rest.find('%') {
        output.push_str(&rest[..percent]);
        let after = &rest[percent + 1..];
        if let Some(tail) = after.strip_prefix('n') {
            output.push_str(&value);
            rest = tail;
        } else if let Some(tail) = after.strip_prefix("Ln") {
            output.push_str(&value);
            rest = tail;
        } else {
            output.push('%');
            rest = after;
        }
    }
    output.push_str(rest);
    output
}
