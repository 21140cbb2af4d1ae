use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::{Method, Request, Response};

use super::CacheError;

/// A value together with the moment it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// A stored response snapshot.
pub type CachedResponse = CachedData<Response>;

/// Persistent request → response store, partitioned into named generations.
///
/// All operations address a generation by name. Writing to a generation that
/// does not exist yet creates it; reading from one that does not exist finds
/// nothing. Only GET requests can be stored.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named generation if it is absent.
    async fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of every generation currently present.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Remove a generation and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// Store a snapshot of `response` under `request`, replacing any previous entry.
    async fn put(&self, name: &str, request: &Request, response: &Response)
        -> Result<(), CacheError>;

    /// Store every entry or none of them.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), CacheError>;

    /// Find the stored response for `request` in the named generation.
    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError>;

    /// All entries of a generation, keyed by request URL.
    async fn entries(&self, name: &str) -> Result<Vec<(String, CachedResponse)>, CacheError>;
}

pub(crate) fn ensure_cacheable(request: &Request) -> Result<(), CacheError> {
    if request.method == Method::Get {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod(request.method))
    }
}
