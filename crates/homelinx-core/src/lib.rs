//! Homelinx core library.
//!
//! Data-access layer for the Homelinx property-listing front-end:
//!
//! - `worker`: offline cache worker (install, activate, network-first fetch)
//! - `cache`: versioned response stores the worker reads and writes
//! - `network`: the network primitive the worker fetches through
//! - `api`: listings API client with mock fallback
//! - `models`: property listing types
//! - `config`: application configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod http;
pub mod models;
pub mod network;
pub mod utils;
pub mod worker;

pub use api::{ApiError, ListingsClient};
pub use cache::{CacheError, CacheStorage, DiskCacheStorage, MemoryCacheStorage};
pub use config::Config;
pub use http::{Method, Request, RequestMode, Response};
pub use network::{HttpNetwork, Network, NetworkError};
pub use worker::{
    ActivationReport, FetchEvent, FetchOutcome, FetchState, Registration, ServiceWorker,
    UpdateOutcome, WorkerConfig, WorkerError, WorkerState,
};
