use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::http::{Method, Request, Response};

use super::{ServiceWorker, WorkerState};

/// Steps of the network-first policy for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    NetworkAttempt,
    NetworkSuccess,
    NetworkFailure,
    CacheLookup,
    CacheHit,
    CacheMiss,
    FallbackResolution,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker declined; the host's default networking handles the request.
    PassThrough,
    /// Exactly one response for the page.
    Respond(Response),
}

/// One intercepted request.
///
/// Background work started while answering (the cache write after a
/// successful network fetch) is attached with `wait_until`; a host that may
/// shut the worker down should `settled()` the event first.
#[derive(Debug)]
pub struct FetchEvent {
    outcome: FetchOutcome,
    trace: Vec<FetchState>,
    pending: Vec<JoinHandle<()>>,
}

impl FetchEvent {
    fn new() -> Self {
        Self {
            outcome: FetchOutcome::PassThrough,
            trace: vec![FetchState::Idle],
            pending: Vec::new(),
        }
    }

    fn transition(&mut self, request: &Request, state: FetchState) {
        debug!(url = %request.url, ?state, "Fetch state");
        self.trace.push(state);
    }

    fn resolve(mut self, request: &Request, response: Response) -> Self {
        self.transition(request, FetchState::Resolved);
        self.outcome = FetchOutcome::Respond(response);
        self
    }

    pub fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    /// The response for the page, or None when the worker passed the request through.
    pub fn response(&self) -> Option<&Response> {
        match &self.outcome {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::PassThrough => None,
        }
    }

    /// States visited, in order.
    pub fn trace(&self) -> &[FetchState] {
        &self.trace
    }

    /// Keep the event alive until `task` finishes.
    pub fn wait_until(&mut self, task: JoinHandle<()>) {
        self.pending.push(task);
    }

    /// Wait for all background work, then hand back the outcome.
    pub async fn settled(self) -> FetchOutcome {
        for task in self.pending {
            if let Err(e) = task.await {
                warn!(error = %e, "Background fetch task failed");
            }
        }
        self.outcome
    }
}

impl ServiceWorker {
    /// Answer one request network-first.
    ///
    /// Never fails: a GET in scope always resolves to a response, falling back
    /// from network to cache to the offline page (navigations) or a 503.
    pub async fn handle_fetch(&self, request: Request) -> FetchEvent {
        let event = FetchEvent::new();

        if self.state != WorkerState::Activated {
            debug!(url = %request.url, state = ?self.state, "Worker not active, passing through");
            return event;
        }
        if request.method != Method::Get {
            debug!(url = %request.url, method = %request.method, "Non-GET request, passing through");
            return event;
        }
        if !self.clients.in_scope(&request.url) {
            debug!(url = %request.url, "Request outside scope, passing through");
            return event;
        }

        self.network_first(request, event).await
    }

    async fn network_first(&self, request: Request, mut event: FetchEvent) -> FetchEvent {
        event.transition(&request, FetchState::NetworkAttempt);

        match self.network.fetch(&request).await {
            Ok(response) => {
                event.transition(&request, FetchState::NetworkSuccess);
                let task = self.store_in_background(request.clone(), response.clone());
                event.wait_until(task);
                event.resolve(&request, response)
            }
            Err(e) => {
                event.transition(&request, FetchState::NetworkFailure);
                debug!(url = %request.url, error = %e, "Network failed, trying cache");
                self.cache_fallback(request, event).await
            }
        }
    }

    /// Write a snapshot to the current generation off the response path.
    /// Errors are logged; the page already has its response.
    fn store_in_background(&self, request: Request, snapshot: Response) -> JoinHandle<()> {
        let storage = Arc::clone(&self.storage);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            if let Err(e) = storage.put(&config.cache_name, &request, &snapshot).await {
                warn!(url = %request.url, error = %e, "Failed to cache network response");
            }
        })
    }

    async fn cache_fallback(&self, request: Request, mut event: FetchEvent) -> FetchEvent {
        event.transition(&request, FetchState::CacheLookup);

        match self.lookup(&request).await {
            Some(cached) => {
                event.transition(&request, FetchState::CacheHit);
                return event.resolve(&request, cached);
            }
            None => event.transition(&request, FetchState::CacheMiss),
        }

        event.transition(&request, FetchState::FallbackResolution);
        if request.is_navigation() {
            let offline_page = Request::get(self.config.offline_page.clone());
            if let Some(page) = self.lookup(&offline_page).await {
                return event.resolve(&request, page);
            }
            warn!(page = %self.config.offline_page, "Offline page missing from cache");
        }
        event.resolve(&request, Response::offline())
    }

    /// Cache read in the current generation. Read errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.storage.lookup(&self.config.cache_name, request).await {
            Ok(found) => found,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Cache lookup failed");
                None
            }
        }
    }
}
