use std::path::PathBuf;

use thiserror::Error;
use tscat_core::{Origin, TranslationQuery, substitute_count};
use tscat_runtime::{CatalogManager, RuntimeError};

use crate::config::CliConfig;

#[derive(Debug, Error)]
pub enum LookupCommandError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub context: String,
    pub source: String,
    pub disambiguation: Option<String>,
    pub count: Option<i64>,
    pub locales: Vec<String>,
    /// `(locale, path)` pairs installed in order; the manifest is skipped
    /// when any are given.
    pub catalogs: Vec<(String, PathBuf)>,
    pub manifest_path: Option<PathBuf>,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub text: String,
    pub origin: String,
}

pub fn run_lookup(
    options: &LookupOptions,
    config: &CliConfig,
) -> Result<LookupOutcome, LookupCommandError> {
    let manager = if options.catalogs.is_empty() {
        let manifest_path = options
            .manifest_path
            .clone()
            .unwrap_or_else(|| config.manifest_path(&options.config_path));
        CatalogManager::from_manifest(&manifest_path)?
    } else {
        let manager = CatalogManager::new();
        for (locale, path) in &options.catalogs {
            manager.install_catalog_from_file(path, locale)?;
        }
        manager
    };
    if !options.locales.is_empty() {
        manager.set_locale_order(options.locales.as_slice())?;
    }

    let snapshot = manager.snapshot();
    let query = TranslationQuery::new(&options.context, &options.source)
        .disambiguation(options.disambiguation.as_deref())
        .count(options.count);
    let resolution = snapshot.resolve(&query);
    let text = match options.count {
        Some(count) => substitute_count(resolution.text, count),
        None => resolution.text.to_string(),
    };
    let origin = match resolution.origin {
        Origin::Finished(locale) => format!("finished {locale}"),
        Origin::Unfinished(locale) => format!("unfinished {locale}"),
        Origin::Source => "source".to_string(),
    };
    Ok(LookupOutcome { text, origin })
}

#[cfg(test)]
mod tests {
    use super::{LookupCommandError, LookupOptions, run_lookup};
    use crate::config::CliConfig;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tscat_core::ParseErrorKind;
    use tscat_runtime::RuntimeError;

    const FA: &str = r#"<TS language="fa"><context><name>Call</name>
<message><source>Error</source><translation>خطا</translation></message>
<message numerus="yes"><source>%n call(s)</source><translation><numerusform>%n تماس</numerusform></translation></message>
</context></TS>"#;

    const FA_IR: &str = r#"<TS language="fa_IR"><context><name>Call</name>
<message><source>Ringing</source><translation>در حال زنگ</translation></message>
<message><source>Error</source><translation type="unfinished">پیش‌نویس</translation></message>
</context></TS>"#;

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

    fn options(root: &Path, source: &str) -> LookupOptions {
        LookupOptions {
            context: "Call".to_string(),
            source: source.to_string(),
            disambiguation: None,
            count: None,
            locales: vec!["fa_IR".to_string()],
            catalogs: vec![
                ("fa".to_string(), root.join("fa.ts")),
                ("fa_IR".to_string(), root.join("fa_IR.ts")),
            ],
            manifest_path: None,
            config_path: root.join("tscat.toml"),
        }
    }

    fn write_catalogs(root: &Path) {
        fs::write(root.join("fa.ts"), FA).expect("write");
        fs::write(root.join("fa_IR.ts"), FA_IR).expect("write");
    }

    #[test]
    fn resolves_through_fallback_chain() {
        let root = temp_dir("lookup");
        write_catalogs(&root);

        let outcome = run_lookup(&options(&root, "Ringing"), &CliConfig::default()).expect("lookup");
        assert_eq!(outcome.text, "در حال زنگ");
        assert_eq!(outcome.origin, "finished fa_IR");

        let outcome = run_lookup(&options(&root, "Error"), &CliConfig::default()).expect("lookup");
        assert_eq!(outcome.text, "خطا");
        assert_eq!(outcome.origin, "finished fa");

        let outcome = run_lookup(&options(&root, "Hang up"), &CliConfig::default()).expect("lookup");
        assert_eq!(outcome.text, "Hang up");
        assert_eq!(outcome.origin, "source");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn count_is_substituted() {
        let root = temp_dir("lookup_count");
        write_catalogs(&root);
        let mut options = options(&root, "%n call(s)");
        options.count = Some(4);
        let outcome = run_lookup(&options, &CliConfig::default()).expect("lookup");
        assert_eq!(outcome.text, "4 تماس");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn uses_configured_manifest() {
        let root = temp_dir("lookup_manifest");
        write_catalogs(&root);
        fs::write(
            root.join("catalogs.toml"),
            "locale_order = [\"fa_IR\"]\n\n[[catalog]]\nlocale = \"fa\"\npath = \"fa.ts\"\n\n[[catalog]]\nlocale = \"fa_IR\"\npath = \"fa_IR.ts\"\n",
        )
        .expect("write");
        let config = CliConfig {
            manifest: "catalogs.toml".to_string(),
            ..CliConfig::default()
        };
        let mut options = options(&root, "Error");
        options.catalogs.clear();
        options.locales.clear();
        let outcome = run_lookup(&options, &config).expect("lookup");
        assert_eq!(outcome.text, "خطا");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn parse_failure_is_reported() {
        let root = temp_dir("lookup_bad");
        fs::write(root.join("fa.ts"), "<TS><context><name>Call</name>").expect("write");
        fs::write(root.join("fa_IR.ts"), FA_IR).expect("write");
        let err = run_lookup(&options(&root, "Error"), &CliConfig::default()).expect_err("bad");
        assert!(matches!(
            err,
            LookupCommandError::Runtime(RuntimeError::Parse(ref parse))
                if parse.kind == ParseErrorKind::MalformedStructure
        ));
        fs::remove_dir_all(&root).ok();
    }
}
