use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tscat_core::{Catalog, CatalogStats, EntryStatus, LocaleTag, ParseErrorKind, PluralRule};
use tscat_runtime::RuntimeError;

use crate::config::CliConfig;
use crate::diagnostic::Diagnostic;
use crate::targets::{CatalogTarget, resolve_targets};

#[derive(Debug, Error)]
pub enum ValidateCommandError {
    #[error(transparent)]
    Targets(#[from] RuntimeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("validation failed with {0} errors")]
    Failed(usize),
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub catalog_paths: Vec<PathBuf>,
    pub locale: Option<String>,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CatalogReport {
    pub path: PathBuf,
    pub stats: Option<CatalogStats>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CatalogReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.is_error())
            .count()
    }
}

pub fn run_validate(
    options: &ValidateOptions,
    config: &CliConfig,
) -> Result<Vec<CatalogReport>, ValidateCommandError> {
    let targets = resolve_targets(
        &options.catalog_paths,
        options.locale.as_deref(),
        config,
        &options.config_path,
    )?;
    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        let bytes = fs::read(&target.path)?;
        reports.push(validate_bytes(&target, &bytes));
    }
    Ok(reports)
}

pub fn ensure_valid(reports: &[CatalogReport]) -> Result<(), ValidateCommandError> {
    let errors: usize = reports.iter().map(CatalogReport::error_count).sum();
    if errors == 0 {
        Ok(())
    } else {
        Err(ValidateCommandError::Failed(errors))
    }
}

pub fn validate_bytes(target: &CatalogTarget, bytes: &[u8]) -> CatalogReport {
    let file = target.path.display().to_string();
    let mut diagnostics = Vec::new();
    let stats = match tscat_core::parse(bytes) {
        Ok(catalog) => {
            check_catalog(&catalog, target.locale.as_ref(), &file, &mut diagnostics);
            Some(catalog.stats())
        }
        Err(err) => {
            let code = match err.kind {
                ParseErrorKind::MalformedStructure => "TSE001",
                ParseErrorKind::EncodingError => "TSE002",
            };
            diagnostics.push(
                Diagnostic::error(code, err.message)
                    .with_file(file)
                    .with_position(err.line, err.column),
            );
            None
        }
    };
    CatalogReport {
        path: target.path.clone(),
        stats,
        diagnostics,
    }
}

fn check_catalog(
    catalog: &Catalog,
    locale: Option<&LocaleTag>,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let (Some(expected), Some(declared)) = (locale, catalog.language())
        && expected.normalized() != declared.normalized()
    {
        diagnostics.push(
            Diagnostic::warning(
                "TSW103",
                format!("catalog declares language {declared} but is installed as {expected}"),
            )
            .with_file(file),
        );
    }

    let mut seen = HashSet::new();
    for entry in catalog.entries() {
        if entry.status() == EntryStatus::Vanished {
            continue;
        }
        if !seen.insert((entry.context(), entry.source(), entry.disambiguation())) {
            diagnostics.push(
                Diagnostic::warning(
                    "TSW102",
                    format!(
                        "duplicate message `{}` in context `{}`",
                        entry.source(),
                        entry.context()
                    ),
                )
                .with_file(file),
            );
        }
    }

    let Some(locale) = locale.or(catalog.language()) else {
        diagnostics.push(
            Diagnostic::warning("TSW104", "no language declared, plural forms not checked")
                .with_file(file),
        );
        return;
    };
    let rule = PluralRule::for_locale(locale);
    for entry in catalog.entries() {
        if !entry.is_numerus() || entry.status() == EntryStatus::Vanished || !entry.has_text() {
            continue;
        }
        let forms = entry.translations().len();
        if forms != rule.form_count() {
            diagnostics.push(
                Diagnostic::warning(
                    "TSW100",
                    format!(
                        "message `{}` in context `{}` has {forms} plural forms, {locale} uses {}",
                        entry.source(),
                        entry.context(),
                        rule.form_count()
                    ),
                )
                .with_file(file),
            );
        }
    }
}
