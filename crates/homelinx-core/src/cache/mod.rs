//! Versioned response cache.
//!
//! A `CacheStorage` holds any number of named generations, each a map of
//! request URL → response snapshot. Exactly one generation is current at a
//! time; the worker deletes the others when it activates.
//!
//! Two stores are provided:
//! - `MemoryCacheStorage`: process-local, for tests and short-lived hosts
//! - `DiskCacheStorage`: one directory per generation under the cache root

pub mod disk;
pub mod error;
pub mod memory;
pub mod storage;

pub use disk::DiskCacheStorage;
pub use error::CacheError;
pub use memory::MemoryCacheStorage;
pub use storage::{CacheStorage, CachedData, CachedResponse};
