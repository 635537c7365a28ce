use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Catalog manifest used when a command is given no catalogs.
    pub manifest: String,
    /// Filter directives used when `TSCAT_LOG` is unset.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            manifest: "translations/catalogs.toml".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    pub fn manifest_path(&self, config_path: &Path) -> PathBuf {
        let path = PathBuf::from(&self.manifest);
        if path.is_absolute() {
            return path;
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(path)
    }
}

pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> Result<CliConfig, CliError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(CliConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{load_config_or_default, CliConfig};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("tscat_{name}_{nanos}.toml"));
        path
    }

    #[test]
    fn uses_default_when_missing() {
        let path = temp_path("missing");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn loads_partial_file() {
        let path = temp_path("config");
        fs::write(&path, "log_level = \"tscat_runtime=debug\"\n").expect("write");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.log_level, "tscat_runtime=debug");
        assert_eq!(config.manifest, "translations/catalogs.toml");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_invalid_toml() {
        let path = temp_path("invalid");
        fs::write(&path, "log_level = [").expect("write");
        assert!(load_config_or_default(&path).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn manifest_resolves_next_to_config() {
        let config = CliConfig::default();
        assert_eq!(
            config.manifest_path(Path::new("/srv/app/tscat.toml")),
            PathBuf::from("/srv/app/translations/catalogs.toml")
        );
    }
}
