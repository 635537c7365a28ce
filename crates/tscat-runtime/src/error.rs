use thiserror::Error;

use tscat_core::{CoreError, ParseError};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid hash format")]
    InvalidHash,
    #[error("catalog hash mismatch for {0}")]
    HashMismatch(String),
    #[error("locale {locale} is listed more than once in the manifest")]
    DuplicateLocale { locale: String },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
