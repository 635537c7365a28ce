use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tscat_core::CatalogStats;
use tscat_runtime::{RuntimeError, load_catalog};

use crate::config::CliConfig;
use crate::targets::resolve_targets;

#[derive(Debug, Error)]
pub enum CoverageCommandError {
    #[error(transparent)]
    Catalog(#[from] RuntimeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CoverageOptions {
    pub catalog_paths: Vec<PathBuf>,
    pub locale: Option<String>,
    pub out_path: Option<PathBuf>,
    pub config_path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CoverageReport {
    pub catalogs: Vec<CatalogCoverage>,
    pub totals: Counts,
}

#[derive(Debug, Serialize)]
pub struct CatalogCoverage {
    pub path: String,
    pub locale: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Counts {
    pub finished: usize,
    pub unfinished: usize,
    pub vanished: usize,
    pub total: usize,
    pub percent: f64,
}

impl From<CatalogStats> for Counts {
    fn from(stats: CatalogStats) -> Self {
        Self {
            finished: stats.finished,
            unfinished: stats.unfinished,
            vanished: stats.vanished,
            total: stats.total(),
            percent: stats.percent_finished(),
        }
    }
}

/// Builds the report and writes it as JSON to `out_path` when one is set.
pub fn run_coverage(
    options: &CoverageOptions,
    config: &CliConfig,
) -> Result<CoverageReport, CoverageCommandError> {
    let targets = resolve_targets(
        &options.catalog_paths,
        options.locale.as_deref(),
        config,
        &options.config_path,
    )?;

    let mut catalogs = Vec::with_capacity(targets.len());
    let mut totals = CatalogStats::default();
    for target in targets {
        let catalog = load_catalog(&target.path)?;
        let stats = catalog.stats();
        totals.finished += stats.finished;
        totals.unfinished += stats.unfinished;
        totals.vanished += stats.vanished;
        let locale = target.locale.as_ref().or(catalog.language());
        catalogs.push(CatalogCoverage {
            path: target.path.display().to_string(),
            locale: locale.map(ToString::to_string),
            counts: stats.into(),
        });
    }

    let report = CoverageReport {
        catalogs,
        totals: totals.into(),
    };
    if let Some(out_path) = &options.out_path {
        fs::write(out_path, render(&report)?)?;
    }
    Ok(report)
}

pub fn render(report: &CoverageReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::{CoverageCommandError, CoverageOptions, run_coverage};
    use crate::config::CliConfig;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    const FA: &str = r#"<TS language="fa_IR"><context><name>Call</name>
<message><source>Ringing</source><translation>در حال زنگ</translation></message>
<message><source>Error</source><translation type="unfinished"></translation></message>
<message><source>Old</source><translation type="vanished">قدیمی</translation></message>
<message><source>Older</source><translation type="obsolete">قدیمی‌تر</translation></message>
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

    #[test]
    fn writes_coverage_report() {
        let root = temp_dir("coverage");
        let catalog = root.join("lrc_fa_IR.ts");
        fs::write(&catalog, FA).expect("write");
        let out_path = root.join("coverage.json");
        let options = CoverageOptions {
            catalog_paths: vec![catalog],
            locale: None,
            out_path: Some(out_path.clone()),
            config_path: root.join("tscat.toml"),
        };
        let report = run_coverage(&options, &CliConfig::default()).expect("coverage");
        let entry = &report.catalogs[0];
        assert_eq!(entry.locale.as_deref(), Some("fa_IR"));
        assert_eq!(entry.counts.finished, 1);
        assert_eq!(entry.counts.unfinished, 1);
        assert_eq!(entry.counts.vanished, 2);
        assert_eq!(entry.counts.percent, 50.0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out_path).expect("read")).expect("json");
        assert_eq!(json["catalogs"][0]["finished"], 1);
        assert_eq!(json["totals"]["total"], 4);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn unreadable_catalog_fails() {
        let root = temp_dir("coverage_bad");
        let catalog = root.join("broken.ts");
        fs::write(&catalog, "<TS><context>").expect("write");
        let options = CoverageOptions {
            catalog_paths: vec![catalog],
            locale: Some("ru".to_string()),
            out_path: None,
            config_path: root.join("tscat.toml"),
        };
        let err = run_coverage(&options, &CliConfig::default()).expect_err("broken");
        assert!(matches!(err, CoverageCommandError::Catalog(_)));
        fs::remove_dir_all(&root).ok();
    }
}
