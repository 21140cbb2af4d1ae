//! Network primitive used by the worker.
//!
//! `Network::fetch` resolves with whatever status the server sends; 4xx and
//! 5xx are responses, not failures. It only fails when no response arrives
//! at all (offline, DNS, TLS, timeout).

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::http::{Request, Response};

pub use self::http::HttpNetwork;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else {
            NetworkError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
