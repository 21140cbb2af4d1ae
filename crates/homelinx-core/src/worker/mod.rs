//! Offline cache worker.
//!
//! A `ServiceWorker` owns one cache generation and moves through
//! `Parsed → Installing → Installed → Activating → Activated`:
//!
//! - **install** pre-caches the static asset manifest, all or nothing
//! - **activate** deletes every other generation and claims open pages
//! - **handle_fetch** answers GET requests network-first, falling back to
//!   the cache and finally to an offline response
//!
//! The generation name is plain configuration handed to the worker, so every
//! stage is a function of (manifest, generation, store, network).

pub mod clients;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CacheStorage;
use crate::network::Network;

pub use clients::{Client, ClientId, Clients};
pub use error::WorkerError;
pub use fetch::{FetchEvent, FetchOutcome, FetchState};
pub use lifecycle::{ActivationReport, InstallOutcome, StaleCacheFailure};
pub use registration::{Registration, UpdateOutcome};

/// Default generation identifier. Bump on every release.
pub const DEFAULT_CACHE_NAME: &str = "homelinx-v1";

/// Default offline fallback page for navigations.
pub const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";

/// Default static asset manifest.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/manifest.json",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
    "/offline.html",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Current cache generation identifier.
    pub cache_name: String,
    /// Paths pre-cached at install, in order.
    pub manifest: Vec<String>,
    /// Cached page served to navigations when offline.
    pub offline_page: String,
    /// Activate as soon as install completes, even while pages controlled
    /// by an older generation are open.
    pub skip_waiting: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            offline_page: DEFAULT_OFFLINE_PAGE.to_string(),
            skip_waiting: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    clients: Arc<Clients>,
    state: WorkerState,
}

impl ServiceWorker {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<Clients>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            network,
            clients,
            state: WorkerState::Parsed,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}
