use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::command_coverage::{CoverageCommandError, CoverageOptions, render, run_coverage};
use crate::command_lookup::{LookupCommandError, LookupOptions, run_lookup};
use crate::command_validate::{
    ValidateCommandError, ValidateOptions, ensure_valid, run_validate,
};
use crate::config::{CliConfig, load_config_or_default};
use crate::error::CliError;
use crate::logging;

const DEFAULT_CONFIG: &str = "tscat.toml";

#[derive(Debug, Error)]
pub enum CliAppError {
    #[error("{0}")]
    Usage(String),
    #[error("config error: {0}")]
    Config(#[from] CliError),
    #[error(transparent)]
    Validate(#[from] ValidateCommandError),
    #[error(transparent)]
    Coverage(#[from] CoverageCommandError),
    #[error(transparent)]
    Lookup(#[from] LookupCommandError),
}

pub fn run() -> Result<(), CliAppError> {
    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or_else(|| CliAppError::Usage(usage()))?;
    match command.as_str() {
        "validate" => {
            let options = parse_validate_options(args.collect())?;
            let config = configure(&options.config_path)?;
            let reports = run_validate(&options, &config)?;
            for report in &reports {
                for diagnostic in &report.diagnostics {
                    eprintln!("{diagnostic}");
                }
                if let Some(stats) = report.stats {
                    println!(
                        "{}: ok ({} finished, {} unfinished, {} vanished)",
                        report.path.display(),
                        stats.finished,
                        stats.unfinished,
                        stats.vanished
                    );
                }
            }
            ensure_valid(&reports)?;
            Ok(())
        }
        "coverage" => {
            let options = parse_coverage_options(args.collect())?;
            let config = configure(&options.config_path)?;
            let report = run_coverage(&options, &config)?;
            if options.out_path.is_none() {
                let json = render(&report).map_err(CoverageCommandError::from)?;
                println!("{json}");
            }
            Ok(())
        }
        "lookup" => {
            let options = parse_lookup_options(args.collect())?;
            let config = configure(&options.config_path)?;
            let outcome = run_lookup(&options, &config)?;
            println!("{}", outcome.text);
            tracing::info!(origin = %outcome.origin, "lookup resolved");
            Ok(())
        }
        "--help" | "-h" | "help" => {
            println!("{}", usage());
            Ok(())
        }
        _ => Err(CliAppError::Usage(usage())),
    }
}

fn configure(config_path: &Path) -> Result<CliConfig, CliAppError> {
    let config = load_config_or_default(config_path)?;
    logging::init(&config.log_level);
    Ok(config)
}

fn usage() -> String {
    "usage: tscat validate [--catalog <path>...] [--locale <tag>] [--config <path>]\n       tscat coverage [--catalog <path>...] [--locale <tag>] [--out <path>] [--config <path>]\n       tscat lookup --context <name> --source <text> [--disambiguation <text>] [--count <n>] [--locale <tag>...] [--catalog <tag>=<path>...] [--manifest <path>] [--config <path>]".to_string()
}

fn next_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String, CliAppError> {
    iter.next()
        .ok_or_else(|| CliAppError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn parse_validate_options(args: Vec<String>) -> Result<ValidateOptions, CliAppError> {
    let mut catalog_paths = Vec::new();
    let mut locale = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--catalog" => catalog_paths.push(PathBuf::from(next_value("--catalog", &mut iter)?)),
            "--locale" => locale = Some(next_value("--locale", &mut iter)?),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    Ok(ValidateOptions {
        catalog_paths,
        locale,
        config_path,
    })
}

fn parse_coverage_options(args: Vec<String>) -> Result<CoverageOptions, CliAppError> {
    let mut catalog_paths = Vec::new();
    let mut locale = None;
    let mut out_path = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--catalog" => catalog_paths.push(PathBuf::from(next_value("--catalog", &mut iter)?)),
            "--locale" => locale = Some(next_value("--locale", &mut iter)?),
            "--out" => out_path = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    Ok(CoverageOptions {
        catalog_paths,
        locale,
        out_path,
        config_path,
    })
}

fn parse_lookup_options(args: Vec<String>) -> Result<LookupOptions, CliAppError> {
    let mut context = None;
    let mut source = None;
    let mut disambiguation = None;
    let mut count = None;
    let mut locales = Vec::new();
    let mut catalogs = Vec::new();
    let mut manifest_path = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--context" => context = Some(next_value("--context", &mut iter)?),
            "--source" => source = Some(next_value("--source", &mut iter)?),
            "--disambiguation" => disambiguation = Some(next_value("--disambiguation", &mut iter)?),
            "--count" => {
                let value = next_value("--count", &mut iter)?;
                let parsed = value.parse::<i64>().map_err(|_| {
                    CliAppError::Usage(format!("--count expects an integer, got `{value}`"))
                })?;
                count = Some(parsed);
            }
            "--locale" => locales.push(next_value("--locale", &mut iter)?),
            "--catalog" => {
                let value = next_value("--catalog", &mut iter)?;
                let (locale, path) = value.split_once('=').ok_or_else(|| {
                    CliAppError::Usage(format!("--catalog expects <tag>=<path>, got `{value}`"))
                })?;
                catalogs.push((locale.to_string(), PathBuf::from(path)));
            }
            "--manifest" => manifest_path = Some(PathBuf::from(next_value("--manifest", &mut iter)?)),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    let context = context.ok_or_else(|| CliAppError::Usage(usage()))?;
    let source = source.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(LookupOptions {
        context,
        source,
        disambiguation,
        count,
        locales,
        catalogs,
        manifest_path,
        config_path,
    })
}
