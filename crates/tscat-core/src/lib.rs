#![forbid(unsafe_code)]

mod chain;
mod error;
mod index;
mod lexer;
mod locale_tag;
mod parser;
mod plural;
mod types;

pub use chain::{FallbackChain, Origin, Resolution, TranslationQuery, substitute_count};
pub use error::{CoreError, CoreResult, ParseError, ParseErrorKind};
pub use index::CatalogIndex;
pub use locale_tag::{LocaleTag, expand_locale_order};
pub use parser::{parse, parse_str};
pub use plural::{PluralRule, resolve as resolve_plural};
pub use types::{Catalog, CatalogStats, Context, Entry, EntryStatus, Location};
