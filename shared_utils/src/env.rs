use std::env::VarError;

use thiserror::Error;

/// An environment variable is set to something that is not valid unicode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Environment variable {0} is not valid unicode")]
pub struct EnvVarError(pub String);

/// Reads an optional variable.
///
/// `Ok(None)` when unset. An empty value counts as set.
pub fn lookup_env_var(name: &str) -> Result<Option<String>, EnvVarError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(EnvVarError(name.to_string())),
    }
}
