use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RuntimeResult;

/// Describes which catalogs to install and in which order to consult them.
///
/// ```toml
/// locale_order = ["fa_IR", "ru_RU"]
///
/// [[catalog]]
/// locale = "fa_IR"
/// path = "translations/lrc_fa_IR.ts"
/// sha256 = "sha256:..."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub locale_order: Vec<String>,
    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<ManifestCatalog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestCatalog {
    pub locale: String,
    pub path: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

impl Manifest {
    pub fn from_toml(contents: &str) -> RuntimeResult<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl ManifestCatalog {
    /// Relative paths are taken from the manifest's directory.
    pub fn resolve_path(&self, manifest_path: &Path) -> PathBuf {
        let path = PathBuf::from(&self.path);
        if path.is_absolute() {
            return path;
        }
        manifest_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(path)
    }
}

pub fn load_manifest(path: &Path) -> RuntimeResult<Manifest> {
    let contents = fs::read_to_string(path)?;
    Manifest::from_toml(&contents)
}
