use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::{EnvVarError, lookup_env_var};

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    EnvVar(#[from] EnvVarError),

    /// A key file was named but could not be read.
    #[error("Failed to read key file {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Neither the environment variable nor a non-empty key file supplied a secret.
    #[error("No key data: set {env_name} or provide a non-empty key file")]
    NoKeyData { env_name: String },
}

/// Reads a secret from a file, trimming surrounding whitespace.
///
/// Returns `Ok(None)` when the file exists but holds nothing besides whitespace.
pub fn read_key_file(path: impl AsRef<Path>) -> Result<Option<String>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
        path: path.to_path_buf(),
        source,
    })?;

    let key = raw.trim();
    if key.is_empty() {
        return Ok(None);
    }
    Ok(Some(key.to_string()))
}

/// Resolves a secret, preferring the environment variable `env_name` over `key_file`.
///
/// The environment wins whenever the variable is set, even to an empty value.
/// A value that is not unicode is an error rather than a fallback. Otherwise the trimmed
/// contents of `key_file` are used. An unreadable or blank file, or no file at
/// all, yields [`ConfigError::NoKeyData`] so callers can refuse to start.
pub fn resolve_secret(env_name: &str, key_file: Option<&Path>) -> Result<String, ConfigError> {
    if let Some(value) = lookup_env_var(env_name)? {
        return Ok(value);
    }

    let no_key = || ConfigError::NoKeyData {
        env_name: env_name.to_string(),
    };

    match key_file {
        Some(path) => match read_key_file(path) {
            Ok(Some(key)) => Ok(key),
            Ok(None) | Err(ConfigError::KeyFile { .. }) => Err(no_key()),
            Err(e) => Err(e),
        },
        None => Err(no_key()),
    }
}
