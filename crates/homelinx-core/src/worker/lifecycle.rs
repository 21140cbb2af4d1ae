use std::collections::HashSet;

use futures::future::{join_all, try_join_all};
use tracing::{debug, info, warn};

use crate::cache::CacheError;
use crate::http::{Request, Response};

use super::{ServiceWorker, WorkerError, WorkerState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Number of manifest assets stored.
    pub cached: usize,
    /// The worker asks to be activated without waiting for old pages to close.
    pub skip_waiting: bool,
}

#[derive(Debug)]
pub struct StaleCacheFailure {
    pub name: String,
    pub error: CacheError,
}

#[derive(Debug, Default)]
pub struct ActivationReport {
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations that could not be removed. Each failure is isolated.
    pub failed: Vec<StaleCacheFailure>,
    /// Pages taken over by this generation.
    pub claimed: usize,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ServiceWorker {
    /// Pre-cache the static asset manifest into the current generation.
    ///
    /// Every asset is fetched before anything is written; a network error or
    /// non-2xx status on any of them fails the install and stores nothing.
    /// The worker then returns to `Parsed` so the host can retry later.
    pub async fn install(&mut self) -> Result<InstallOutcome, WorkerError> {
        self.expect_state(WorkerState::Parsed)?;
        self.state = WorkerState::Installing;
        info!(
            cache = %self.config.cache_name,
            assets = self.config.manifest.len(),
            "Installing cache generation"
        );

        match self.precache().await {
            Ok(cached) => {
                self.state = WorkerState::Installed;
                info!(cache = %self.config.cache_name, cached, "Install complete");
                Ok(InstallOutcome {
                    cached,
                    skip_waiting: self.config.skip_waiting,
                })
            }
            Err(e) => {
                self.state = WorkerState::Parsed;
                warn!(cache = %self.config.cache_name, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    /// The generation is created by the final `put_all`, so a failed install
    /// leaves no trace in the store.
    async fn precache(&self) -> Result<usize, WorkerError> {
        let name = &self.config.cache_name;
        let fetches = self.config.manifest.iter().map(|path| async move {
            let request = Request::get(path.clone());
            match self.network.fetch(&request).await {
                Ok(response) if response.is_success() => Ok((request, response)),
                Ok(response) => Err(WorkerError::Install {
                    url: path.clone(),
                    reason: format!("status {}", response.status),
                }),
                Err(e) => Err(WorkerError::Install {
                    url: path.clone(),
                    reason: e.to_string(),
                }),
            }
        });
        let entries: Vec<(Request, Response)> = try_join_all(fetches).await?;

        self.storage.put_all(name, &entries).await?;
        Ok(entries.len())
    }

    /// Delete every other generation, then claim open pages.
    ///
    /// Deletions run concurrently and all of them are awaited; one failing
    /// never stops the others. Failures are returned in the report. Only
    /// failing to list generations fails activation.
    pub async fn activate(&mut self) -> Result<ActivationReport, WorkerError> {
        self.expect_state(WorkerState::Installed)?;
        self.state = WorkerState::Activating;
        info!(cache = %self.config.cache_name, "Activating cache generation");

        let mut report = match self.purge_stale().await {
            Ok(report) => report,
            Err(e) => {
                self.state = WorkerState::Installed;
                warn!(error = %e, "Activation failed");
                return Err(e);
            }
        };

        report.claimed = self.clients.claim(&self.config.cache_name).await;
        self.state = WorkerState::Activated;
        info!(
            cache = %self.config.cache_name,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            claimed = report.claimed,
            "Activation complete"
        );
        Ok(report)
    }

    /// Bring back a worker whose generation was installed by an earlier
    /// process. The generation must hold every manifest asset; anything less
    /// is an install that never completed. Stale generations left by a
    /// crash between install and activate are purged here, as activation
    /// would have done.
    pub async fn resume(&mut self) -> Result<ActivationReport, WorkerError> {
        self.expect_state(WorkerState::Parsed)?;
        if !self.is_precached().await? {
            return Err(WorkerError::NotInstalled(self.config.cache_name.clone()));
        }

        self.state = WorkerState::Activating;
        let mut report = match self.purge_stale().await {
            Ok(report) => report,
            Err(e) => {
                self.state = WorkerState::Parsed;
                warn!(error = %e, "Resume failed");
                return Err(e);
            }
        };

        report.claimed = self.clients.claim(&self.config.cache_name).await;
        self.state = WorkerState::Activated;
        debug!(
            cache = %self.config.cache_name,
            deleted = report.deleted.len(),
            "Resumed active cache generation"
        );
        Ok(report)
    }

    /// Whether the current generation exists and holds the whole manifest.
    async fn is_precached(&self) -> Result<bool, WorkerError> {
        let name = &self.config.cache_name;
        if !self.storage.keys().await?.iter().any(|k| k == name) {
            return Ok(false);
        }

        let stored: HashSet<String> = self
            .storage
            .entries(name)
            .await?
            .into_iter()
            .map(|(url, _)| url)
            .collect();
        Ok(self
            .config
            .manifest
            .iter()
            .all(|path| stored.contains(Request::get(path.clone()).cache_key())))
    }

    async fn purge_stale(&self) -> Result<ActivationReport, WorkerError> {
        let current = &self.config.cache_name;
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let deletions = stale.into_iter().map(|name| async move {
            let result = self.storage.delete(&name).await;
            (name, result)
        });

        let mut report = ActivationReport::default();
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(_) => {
                    debug!(cache = %name, "Deleted stale cache generation");
                    report.deleted.push(name);
                }
                Err(error) => {
                    warn!(cache = %name, error = %error, "Failed to delete stale cache generation");
                    report.failed.push(StaleCacheFailure { name, error });
                }
            }
        }
        Ok(report)
    }
}
