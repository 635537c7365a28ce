#![forbid(unsafe_code)]

mod error;
mod loader;
mod manager;
mod manifest;

pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::loader::{load_catalog, load_catalog_verified, parse_sha256, sha256};
pub use crate::manager::{
    CatalogManager, ChainSnapshot, RetranslateEvent, RetranslateReason, Subscription,
};
pub use crate::manifest::{Manifest, ManifestCatalog, load_manifest};
