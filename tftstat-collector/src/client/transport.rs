//! HTTP transport seam
//!
//! The rate-limited client talks to the network only through `HttpTransport`,
//! so retry and status handling can be exercised without sockets.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use thiserror::Error;

/// Header carrying the provider API key
pub const API_KEY_HEADER: &str = "X-Riot-Token";

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("tftstat/", env!("CARGO_PKG_VERSION"));

/// Status, body and rate-limit metadata of a completed request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Parsed `Retry-After` header (seconds form only)
    pub retry_after: Option<Duration>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }
}

/// Request never produced a response (connect, TLS, timeout, body read)
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Authenticated GET against an absolute URL
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, api_key: &str) -> Result<RawResponse, TransportFailure>;
}

/// Production transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, TransportFailure> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TransportFailure(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, api_key: &str) -> Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure(format!("Failed to read body: {}", e)))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
            retry_after,
        })
    }
}
