//! reqwest-backed fetcher.

use super::Fetcher;
use crate::error::{Result, SwError};
use crate::models::{Request, Response};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Headers that describe the hop to the engine, not the upstream request.
const SKIPPED_REQUEST_HEADERS: [&str; 5] = [
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "upgrade",
];

/// Fetches requests over HTTP(S).
///
/// The client is built without a request timeout: a hanging upstream stalls
/// only the handler waiting on it.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub const USER_AGENT: &'static str = "AZFanpage-SW/1.0";

    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(Self::USER_AGENT)
            .build()
            .map_err(|e| SwError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            if SKIPPED_REQUEST_HEADERS
                .iter()
                .any(|h| name.eq_ignore_ascii_case(h))
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let upstream = builder
            .send()
            .await
            .map_err(|e| SwError::network(request.url.as_str(), e.to_string()))?;

        let status = upstream.status().as_u16();
        let headers = upstream
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = upstream
            .bytes()
            .await
            .map_err(|e| SwError::network(request.url.as_str(), e.to_string()))?;

        debug!("{} {} -> {}", request.method, request.url, status);
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
