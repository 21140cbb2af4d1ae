use thiserror::Error;

use crate::http::Method;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache name: {0:?}")]
    InvalidName(String),

    #[error("Only GET requests can be cached, got {0}")]
    UnsupportedMethod(Method),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache index: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

/// Longest generation name accepted by any store.
const MAX_NAME_LENGTH: usize = 128;

/// Reject names that could not safely become a directory name.
pub fn validate_name(name: &str) -> Result<(), CacheError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidName(name.to_string()))
    }
}
