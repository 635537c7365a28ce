use std::path::{Path, PathBuf};

use tscat_core::LocaleTag;
use tscat_runtime::{RuntimeResult, load_manifest};

use crate::config::CliConfig;

/// A catalog file a command works on, with the locale it is meant for when
/// one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTarget {
    pub path: PathBuf,
    pub locale: Option<LocaleTag>,
}

/// Catalogs named on the command line, or every catalog in the configured
/// manifest when none are.
pub fn resolve_targets(
    paths: &[PathBuf],
    locale: Option<&str>,
    config: &CliConfig,
    config_path: &Path,
) -> RuntimeResult<Vec<CatalogTarget>> {
    let locale = locale.map(LocaleTag::parse).transpose()?;
    if !paths.is_empty() {
        return Ok(paths
            .iter()
            .map(|path| CatalogTarget {
                path: path.clone(),
                locale: locale.clone(),
            })
            .collect());
    }

    let manifest_path = config.manifest_path(config_path);
    let manifest = load_manifest(&manifest_path)?;
    manifest
        .catalogs
        .iter()
        .map(|entry| -> RuntimeResult<CatalogTarget> {
            Ok(CatalogTarget {
                path: entry.resolve_path(&manifest_path),
                locale: Some(LocaleTag::parse(&entry.locale)?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::resolve_targets;
    use crate::config::CliConfig;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tscat_runtime::RuntimeError;

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("tscat_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("dir");
        path
    }

    #[test]
    fn explicit_paths_share_locale() {
        let paths = vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")];
        let targets = resolve_targets(
            &paths,
            Some("fa-IR"),
            &CliConfig::default(),
            &PathBuf::from("tscat.toml"),
        )
        .expect("targets");
        assert_eq!(targets.len(), 2);
        assert_eq!(
            targets[1].locale.as_ref().map(|tag| tag.normalized()),
            Some("fa_IR")
        );
    }

    #[test]
    fn falls_back_to_manifest() {
        let root = temp_dir("targets");
        fs::create_dir_all(root.join("translations")).expect("dir");
        fs::write(
            root.join("translations/catalogs.toml"),
            "[[catalog]]\nlocale = \"ru_RU\"\npath = \"lrc_ru_RU.ts\"\n",
        )
        .expect("write");
        let targets = resolve_targets(&[], None, &CliConfig::default(), &root.join("tscat.toml"))
            .expect("targets");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].path, root.join("translations/lrc_ru_RU.ts"));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let root = temp_dir("targets_missing");
        let err = resolve_targets(&[], None, &CliConfig::default(), &root.join("tscat.toml"))
            .expect_err("missing manifest");
        assert!(matches!(err, RuntimeError::Io(_)));
        fs::remove_dir_all(&root).ok();
    }
}
