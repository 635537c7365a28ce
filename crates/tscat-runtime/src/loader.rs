use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tscat_core::Catalog;

use crate::error::{RuntimeError, RuntimeResult};

pub fn load_catalog(path: &Path) -> RuntimeResult<Catalog> {
    let bytes = fs::read(path)?;
    Ok(tscat_core::parse(&bytes)?)
}

/// Reads a catalog and, when `expected_hash` is given, checks the file's
/// SHA-256 before parsing it.
pub fn load_catalog_verified(path: &Path, expected_hash: Option<&str>) -> RuntimeResult<Catalog> {
    let bytes = fs::read(path)?;
    if let Some(expected) = expected_hash {
        let expected = parse_sha256(expected)?;
        if sha256(&bytes) != expected {
            return Err(RuntimeError::HashMismatch(path.display().to_string()));
        }
    }
    Ok(tscat_core::parse(&bytes)?)
}

pub fn parse_sha256(value: &str) -> RuntimeResult<[u8; 32]> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix("sha256:").unwrap_or(trimmed);
    let bytes = hex::decode(hex).map_err(|_| RuntimeError::InvalidHash)?;
    if bytes.len() != 32 {
        return Err(RuntimeError::InvalidHash);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}
