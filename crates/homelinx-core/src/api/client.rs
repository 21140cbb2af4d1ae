//! Client for the remote listings API.
//!
//! Both operations swallow failures the way the front-end expects: a search
//! that fails yields an empty result set, a lookup that fails yields None.
//! Without a configured base URL the built-in mock listings answer instead.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::models::{Property, SearchParams, SearchResults};

use super::{mock, ApiError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Listings API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ListingsClient {
    client: Client,
    base_url: Option<String>,
}

impl ListingsClient {
    /// Create a client. A missing or blank base URL selects the mock listings.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Self { client, base_url })
    }

    pub fn is_mock(&self) -> bool {
        self.base_url.is_none()
    }

    /// Search listings. Failures are logged and yield an empty result set.
    pub async fn search_properties(&self, params: &SearchParams) -> SearchResults {
        let Some(base_url) = &self.base_url else {
            debug!("No listings API configured, searching mock listings");
            return mock::search(params);
        };

        match self.try_search(base_url, params).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Search failed");
                SearchResults::default()
            }
        }
    }

    /// Fetch one listing. Failures (including 404) are logged and yield None.
    pub async fn get_property_by_id(&self, id: &str) -> Option<Property> {
        let Some(base_url) = &self.base_url else {
            debug!(id, "No listings API configured, using mock listing");
            return mock::find(id);
        };

        let url = format!("{}/properties/{}", base_url, id);
        match self.get(&url, &[]).await {
            Ok(property) => Some(property),
            Err(e) => {
                error!(id, error = %e, "Fetch property failed");
                None
            }
        }
    }

    async fn try_search(&self, base_url: &str, params: &SearchParams) -> Result<SearchResults> {
        let url = format!("{}/properties", base_url);
        self.get(&url, &params.query_pairs()).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}
