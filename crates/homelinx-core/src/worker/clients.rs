use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use url::Url;

pub type ClientId = u64;

/// An open page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub url: String,
    /// Generation controlling this page, if any.
    pub controller: Option<String>,
}

#[derive(Debug, Default)]
struct ClientsInner {
    pages: BTreeMap<ClientId, Client>,
    /// Generation that controls newly opened in-scope pages.
    active: Option<String>,
}

/// Pages open under one registration scope.
#[derive(Debug)]
pub struct Clients {
    scope: String,
    /// Worker origin. Absolute URLs on it are matched by path.
    origin: Option<Url>,
    next_id: AtomicU64,
    inner: RwLock<ClientsInner>,
}

impl Clients {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            origin: None,
            next_id: AtomicU64::new(1),
            inner: RwLock::new(ClientsInner::default()),
        }
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether a request URL falls under the scope. Scope is a path prefix on
    /// the worker's own origin: relative paths are matched directly, absolute
    /// URLs only when they share that origin.
    pub fn in_scope(&self, url: &str) -> bool {
        if url.starts_with('/') && !url.starts_with("//") {
            return url.starts_with(&self.scope);
        }
        match (&self.origin, Url::parse(url)) {
            (Some(origin), Ok(parsed)) if parsed.origin() == origin.origin() => {
                parsed.path().starts_with(&self.scope)
            }
            _ => false,
        }
    }

    /// Record a newly loaded page. In-scope pages are controlled by the
    /// active generation, if there is one.
    pub async fn open(&self, url: impl Into<String>) -> ClientId {
        let url = url.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.write().await;
        let controller = if self.in_scope(&url) {
            inner.active.clone()
        } else {
            None
        };
        inner.pages.insert(id, Client { id, url, controller });
        id
    }

    pub async fn close(&self, id: ClientId) -> bool {
        self.inner.write().await.pages.remove(&id).is_some()
    }

    pub async fn get(&self, id: ClientId) -> Option<Client> {
        self.inner.read().await.pages.get(&id).cloned()
    }

    pub async fn controller(&self, id: ClientId) -> Option<String> {
        self.get(id).await.and_then(|c| c.controller)
    }

    pub async fn all(&self) -> Vec<Client> {
        self.inner.read().await.pages.values().cloned().collect()
    }

    /// Whether any open page is controlled by a generation other than `generation`.
    pub async fn controlled_by_other(&self, generation: &str) -> bool {
        self.inner
            .read()
            .await
            .pages
            .values()
            .any(|c| c.controller.as_deref().is_some_and(|g| g != generation))
    }

    /// Make `generation` the controller of every in-scope page, including
    /// pages loaded before it existed. Returns the number of pages claimed.
    pub async fn claim(&self, generation: &str) -> usize {
        let mut inner = self.inner.write().await;
        inner.active = Some(generation.to_string());

        let mut claimed = 0;
        for client in inner.pages.values_mut() {
            if self.in_scope(&client.url) {
                client.controller = Some(generation.to_string());
                claimed += 1;
            }
        }
        claimed
    }
}
