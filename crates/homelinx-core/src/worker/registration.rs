use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::cache::CacheStorage;
use crate::network::Network;

use super::{ActivationReport, Clients, ServiceWorker, WorkerConfig, WorkerError};

#[derive(Debug)]
pub enum UpdateOutcome {
    Activated(ActivationReport),
    /// Installed, but pages controlled by an older generation are still open.
    Waiting,
}

/// Host side of a worker registration: one scope, its open pages, and the
/// workers installed for it.
#[derive(Debug, Clone)]
pub struct Registration {
    clients: Arc<Clients>,
}

impl Registration {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            clients: Arc::new(Clients::new(scope)),
        }
    }

    /// Registration for a worker served from `origin`, so absolute URLs on
    /// that origin are intercepted too.
    pub fn with_origin(scope: impl Into<String>, origin: Url) -> Self {
        Self {
            clients: Arc::new(Clients::new(scope).with_origin(origin)),
        }
    }

    pub fn scope(&self) -> &str {
        self.clients.scope()
    }

    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    /// A new worker for this scope, sharing its clients.
    pub fn worker(
        &self,
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> ServiceWorker {
        ServiceWorker::new(config, storage, network, Arc::clone(&self.clients))
    }

    /// Install `worker`, then activate it straight away if it asked to skip
    /// waiting or no page is held by another generation.
    pub async fn update(&self, worker: &mut ServiceWorker) -> Result<UpdateOutcome, WorkerError> {
        let installed = worker.install().await?;

        let blocked = self.clients.controlled_by_other(worker.cache_name()).await;
        if installed.skip_waiting || !blocked {
            Ok(UpdateOutcome::Activated(worker.activate().await?))
        } else {
            info!(cache = worker.cache_name(), "Installed, waiting for old pages to close");
            Ok(UpdateOutcome::Waiting)
        }
    }
}
