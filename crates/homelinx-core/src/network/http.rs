use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;
use url::Url;

use crate::http::{Method, Request, Response};

use super::{Network, NetworkError};

/// HTTP request timeout in seconds.
/// Long enough for a slow mobile link, short enough that the cache fallback
/// kicks in before the page gives up.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `Network` backed by reqwest. Relative request URLs resolve against `origin`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: &str) -> Result<Self, NetworkError> {
        let origin = Url::parse(origin)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", origin, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a request URL (path or absolute) against the origin.
    pub fn resolve(&self, url: &str) -> Result<Url, NetworkError> {
        self.origin
            .join(url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }

    fn headers(request: &Request) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        for (name, value) in &request.headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        headers
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = self.resolve(&request.url)?;
        debug!(method = %request.method, url = %url, "Fetching from network");

        let response = self
            .client
            .request(Self::method(request.method), url)
            .headers(Self::headers(request))
            .send()
            .await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}
