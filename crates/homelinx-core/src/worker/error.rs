use thiserror::Error;

use crate::cache::CacheError;

use super::WorkerState;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    #[error("Failed to pre-cache {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Cache generation {0} is not installed")]
    NotInstalled(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
