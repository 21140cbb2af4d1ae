//! REST client module for the listings API.
//!
//! This module provides the `ListingsClient` used by the front-end to search
//! property listings and fetch individual listings, with a built-in mock
//! dataset standing in when no API URL is configured.

pub mod client;
pub mod error;
pub mod mock;

pub use client::ListingsClient;
pub use error::ApiError;
