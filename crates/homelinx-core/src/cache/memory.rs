use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::http::{Request, Response};

use super::error::validate_name;
use super::storage::{ensure_cacheable, CachedData, CachedResponse};
use super::{CacheError, CacheStorage};

type Generation = HashMap<String, CachedResponse>;

/// Process-local cache store. Generations are kept in creation order.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<Vec<(String, Generation)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(generations: &[(String, Generation)], name: &str) -> Option<usize> {
        generations.iter().position(|(n, _)| n == name)
    }

    fn generation_mut<'a>(
        generations: &'a mut Vec<(String, Generation)>,
        name: &str,
    ) -> &'a mut Generation {
        let idx = match Self::position(generations, name) {
            Some(idx) => idx,
            None => {
                generations.push((name.to_string(), Generation::new()));
                generations.len() - 1
            }
        };
        &mut generations[idx].1
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        validate_name(name)?;
        let mut generations = self.generations.write().await;
        Self::generation_mut(&mut generations, name);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let mut generations = self.generations.write().await;
        match Self::position(&generations, name) {
            Some(idx) => {
                generations.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> Result<(), CacheError> {
        validate_name(name)?;
        ensure_cacheable(request)?;
        let mut generations = self.generations.write().await;
        Self::generation_mut(&mut generations, name).insert(
            request.cache_key().to_string(),
            CachedData::new(response.clone()),
        );
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), CacheError> {
        validate_name(name)?;
        for (request, _) in entries {
            ensure_cacheable(request)?;
        }

        let mut generations = self.generations.write().await;
        let generation = Self::generation_mut(&mut generations, name);
        for (request, response) in entries {
            generation.insert(
                request.cache_key().to_string(),
                CachedData::new(response.clone()),
            );
        }
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError> {
        let generations = self.generations.read().await;
        Ok(Self::position(&generations, name)
            .and_then(|idx| generations[idx].1.get(request.cache_key()))
            .map(|cached| cached.data.clone()))
    }

    async fn entries(&self, name: &str) -> Result<Vec<(String, CachedResponse)>, CacheError> {
        let generations = self.generations.read().await;
        let mut entries: Vec<_> = Self::position(&generations, name)
            .map(|idx| {
                generations[idx]
                    .1
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let storage = MemoryCacheStorage::new();
        storage.open("homelinx-v1").await.unwrap();
        storage.open("homelinx-v0").await.unwrap();
        storage.open("homelinx-v1").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["homelinx-v1", "homelinx-v0"]);
    }

    #[tokio::test]
    async fn test_put_then_lookup() {
        let storage = MemoryCacheStorage::new();
        let request = Request::get("/listings");
        storage
            .put("v1", &request, &Response::ok("cached"))
            .await
            .unwrap();

        let found = storage.lookup("v1", &request).await.unwrap();
        assert_eq!(found.map(|r| r.text()), Some("cached".to_string()));
        assert_eq!(storage.lookup("v2", &request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_ignores_fragment() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("v1", &Request::get("/about"), &Response::ok("about"))
            .await
            .unwrap();

        let found = storage
            .lookup("v1", &Request::get("/about#team"))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let storage = MemoryCacheStorage::new();
        let request = Request::new(Method::Post, "/enquiries");
        let result = storage.put("v1", &request, &Response::ok("")).await;
        assert!(matches!(result, Err(CacheError::UnsupportedMethod(Method::Post))));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_all_is_all_or_nothing() {
        let storage = MemoryCacheStorage::new();
        let entries = vec![
            (Request::get("/"), Response::ok("home")),
            (Request::new(Method::Delete, "/x"), Response::ok("")),
        ];
        assert!(storage.put_all("v1", &entries).await.is_err());
        assert_eq!(storage.lookup("v1", &Request::get("/")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = MemoryCacheStorage::new();
        storage.open("v0").await.unwrap();
        assert!(storage.delete("v0").await.unwrap());
        assert!(!storage.delete("v0").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_copy_is_snapshot() {
        let storage = MemoryCacheStorage::new();
        let request = Request::get("/");
        let mut live = Response::ok("v1 body");
        storage.put("v1", &request, &live).await.unwrap();

        live.body = b"mutated".to_vec();
        let stored = storage.lookup("v1", &request).await.unwrap().unwrap();
        assert_eq!(stored.text(), "v1 body");
    }
}
