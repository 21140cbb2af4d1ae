//! Test doubles for the network and cache store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::cache::{CacheError, CacheStorage, CachedResponse, MemoryCacheStorage};
use crate::http::{Request, Response};
use crate::network::{Network, NetworkError};

use super::{Clients, ServiceWorker, WorkerConfig};

/// Serves fixed routes; unknown paths get a 404. Can be switched offline,
/// and individual paths can be made to fail at the network level.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    broken: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, path: &str, response: Response) -> Self {
        self.routes.lock().unwrap().insert(path.to_string(), response);
        self
    }

    pub fn break_path(&self, path: &str) {
        self.broken.lock().unwrap().insert(path.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("offline".to_string()));
        }
        let broken = self.broken.lock().unwrap().contains(&request.url);
        if broken {
            return Err(NetworkError::Unreachable(format!("{} refused", request.url)));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found")))
    }
}

/// Memory store whose deletes and writes can be made to fail per generation.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryCacheStorage,
    failing_deletes: Mutex<HashSet<String>>,
    failing_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_delete(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), CacheError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let failing = self.failing_deletes.lock().unwrap().contains(name);
        if failing {
            return Err(CacheError::Unavailable(format!("{} is locked", name)));
        }
        self.inner.delete(name).await
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> Result<(), CacheError> {
        self.write_guard()?;
        self.inner.put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), CacheError> {
        self.write_guard()?;
        self.inner.put_all(name, entries).await
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError> {
        self.inner.lookup(name, request).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<(String, CachedResponse)>, CacheError> {
        self.inner.entries(name).await
    }
}

/// Network serving every default manifest asset.
pub fn site() -> FakeNetwork {
    FakeNetwork::new()
        .with_route("/", Response::ok("<h1>Homelinx</h1>"))
        .with_route("/manifest.json", Response::ok("{\"name\":\"Homelinx\"}"))
        .with_route("/icons/icon-192.png", Response::ok(vec![0x89, b'P', b'N', b'G']))
        .with_route("/icons/icon-512.png", Response::ok(vec![0x89, b'P', b'N', b'G']))
        .with_route("/offline.html", Response::ok("<h1>You are offline</h1>"))
        .with_route("/listings", Response::ok("[]"))
}

pub fn worker(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> ServiceWorker {
    ServiceWorker::new(
        WorkerConfig::default(),
        storage,
        network,
        Arc::new(Clients::new("/")),
    )
}
