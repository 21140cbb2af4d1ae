//! Durable cache store.
//!
//! Each generation is a directory under the cache root holding a single
//! `entries.json` index of URL → response snapshot, bodies base64-encoded. Writes replace the index
//! atomically (write to a temp file, then rename), so a reader sees either
//! the old index or the new one, never a torn file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::http::{Request, Response};

use super::error::validate_name;
use super::storage::{ensure_cacheable, CachedData, CachedResponse};
use super::{CacheError, CacheStorage};

/// Index file name inside each generation directory
const INDEX_FILE: &str = "entries.json";

/// Scratch file the index is written to before being renamed into place
const INDEX_TMP_FILE: &str = "entries.json.tmp";

type Index = BTreeMap<String, CachedResponse>;

pub struct DiskCacheStorage {
    cache_dir: PathBuf,
    /// Serializes every read-modify-write of an index.
    write_lock: Mutex<()>,
}

impl DiskCacheStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    fn index_path(&self, name: &str) -> PathBuf {
        self.generation_dir(name).join(INDEX_FILE)
    }

    /// Read a generation's index. Ok(None) if the generation does not exist.
    async fn load(&self, name: &str) -> Result<Option<Index>, CacheError> {
        match tokio::fs::read_to_string(self.index_path(name)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, name: &str, index: &Index) -> Result<(), CacheError> {
        let dir = self.generation_dir(name);
        tokio::fs::create_dir_all(&dir).await?;

        let contents = serde_json::to_vec(index)?;
        let tmp = dir.join(INDEX_TMP_FILE);
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, dir.join(INDEX_FILE)).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        validate_name(name)?;
        let _guard = self.write_lock.lock().await;
        if self.load(name).await?.is_none() {
            debug!(cache = name, "Creating cache generation");
            self.save(name, &Index::new()).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            match file_name.to_str() {
                Some(name) if validate_name(name).is_ok() => names.push(name.to_string()),
                _ => warn!(
                    path = %entry.path().display(),
                    "Skipping directory that is not a valid cache generation name"
                ),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        if validate_name(name).is_err() {
            return Ok(false);
        }
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_dir_all(self.generation_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
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

        let _guard = self.write_lock.lock().await;
        let mut index = self.load(name).await?.unwrap_or_default();
        index.insert(
            request.cache_key().to_string(),
            CachedData::new(response.clone()),
        );
        self.save(name, &index).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), CacheError> {
        validate_name(name)?;
        for (request, _) in entries {
            ensure_cacheable(request)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut index = self.load(name).await?.unwrap_or_default();
        for (request, response) in entries {
            index.insert(
                request.cache_key().to_string(),
                CachedData::new(response.clone()),
            );
        }
        self.save(name, &index).await
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError> {
        if validate_name(name).is_err() {
            return Ok(None);
        }
        Ok(self
            .load(name)
            .await?
            .and_then(|mut index| index.remove(request.cache_key()))
            .map(|cached| cached.data))
    }

    async fn entries(&self, name: &str) -> Result<Vec<(String, CachedResponse)>, CacheError> {
        if validate_name(name).is_err() {
            return Ok(Vec::new());
        }
        Ok(self
            .load(name)
            .await?
            .map(|index| index.into_iter().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, DiskCacheStorage) {
        let dir = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(dir.path().join("caches")).unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_open_creates_generation() {
        let (_dir, storage) = storage();
        storage.open("homelinx-v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["homelinx-v1"]);
        assert!(storage.entries("homelinx-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_survive_new_instance() {
        let (dir, storage) = storage();
        let request = Request::get("/manifest.json");
        storage
            .put("homelinx-v1", &request, &Response::ok("{}"))
            .await
            .unwrap();
        drop(storage);

        let reopened = DiskCacheStorage::new(dir.path().join("caches")).unwrap();
        let found = reopened.lookup("homelinx-v1", &request).await.unwrap();
        assert_eq!(found.map(|r| r.text()), Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_keys_skip_stray_files() {
        let (_dir, storage) = storage();
        storage.open("v1").await.unwrap();
        std::fs::write(storage.cache_dir().join("notes.txt"), "x").unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_keys_skip_invalid_generation_dirs() {
        let (_dir, storage) = storage();
        storage.open("v1").await.unwrap();
        std::fs::create_dir(storage.cache_dir().join("old cache")).unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        assert!(storage.cache_dir().join("old cache").exists());
    }

    #[tokio::test]
    async fn test_bodies_are_stored_as_base64() {
        let (_dir, storage) = storage();
        let request = Request::get("/icons/icon-192.png");
        let png = Response::ok(vec![0x89, b'P', b'N', b'G']);
        storage.put("v1", &request, &png).await.unwrap();

        let raw = std::fs::read_to_string(storage.cache_dir().join("v1").join(INDEX_FILE)).unwrap();
        assert!(raw.contains("\"iVBORw==\""), "unexpected index: {}", raw);
        assert_eq!(storage.lookup("v1", &request).await.unwrap(), Some(png));
    }

    #[tokio::test]
    async fn test_delete_removes_directory() {
        let (_dir, storage) = storage();
        storage.open("v0").await.unwrap();
        assert!(storage.delete("v0").await.unwrap());
        assert!(!storage.delete("v0").await.unwrap());
        assert!(!storage.cache_dir().join("v0").exists());
    }

    #[tokio::test]
    async fn test_put_all_writes_every_entry() {
        let (_dir, storage) = storage();
        let entries = vec![
            (Request::get("/"), Response::ok("home")),
            (Request::get("/offline.html"), Response::ok("offline")),
        ];
        storage.put_all("v1", &entries).await.unwrap();

        let stored = storage.entries("v1").await.unwrap();
        let urls: Vec<_> = stored.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(urls, vec!["/", "/offline.html"]);
        assert!(!storage.cache_dir().join("v1").join(INDEX_TMP_FILE).exists());
    }

    #[tokio::test]
    async fn test_corrupt_index_is_reported() {
        let (_dir, storage) = storage();
        storage.open("v1").await.unwrap();
        std::fs::write(storage.cache_dir().join("v1").join(INDEX_FILE), "not json").unwrap();

        let result = storage.lookup("v1", &Request::get("/")).await;
        assert!(matches!(result, Err(CacheError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.open("../escape").await,
            Err(CacheError::InvalidName(_))
        ));
        assert_eq!(storage.lookup("../escape", &Request::get("/")).await.unwrap(), None);
    }
}
