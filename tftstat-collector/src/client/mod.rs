//! Region-aware rate-limited API client
//!
//! One client per platform region. Every request:
//! 1. Waits for an in-flight slot (semaphore) and a token (token bucket)
//! 2. Honors any cooldown set by a previous 429 `Retry-After`
//! 3. Dispatches through the `HttpTransport`
//! 4. Classifies the response: 200 → payload, 403 → `Auth`, other → `SoftHttp`
//!
//! A 429 with `Retry-After` holds the request (and every later dispatch of the
//! region) for the advertised interval before surfacing `SoftHttp(429)`.
//!
//! Transport failures are retried with a fixed backoff; a call with
//! `retries_remaining = n` makes at most `n + 1` attempts. Nothing else is
//! retried. All waits race the run's cancellation token.

pub mod transport;

pub use transport::{
    HttpTransport, RawResponse, ReqwestTransport, TransportFailure, API_KEY_HEADER,
};

use crate::api::endpoints::PLATFORM_STATUS;
use crate::error::FetchError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tftstat_common::config::{ClientConfig, RegionHosts};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest `Retry-After` the client will honor
const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Client tuning resolved from configuration
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub requests_per_second: u32,
    pub rate_limit: bool,
    pub max_in_flight: usize,
    pub retry_count: u32,
    pub retry_backoff: Duration,
    pub show_logs: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for ClientSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            requests_per_second: config.requests_per_second,
            rate_limit: config.rate_limit,
            max_in_flight: config.max_in_flight,
            retry_count: config.retry_count,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            show_logs: config.show_logs,
        }
    }
}

/// Authenticated, retrying, rate-limited GET client for one region
pub struct RateLimitedClient {
    hosts: RegionHosts,
    api_key: String,
    transport: Arc<dyn HttpTransport>,
    /// Minimum spacing between dispatches (burst of one)
    limiter: Option<DefaultDirectRateLimiter>,
    in_flight: Semaphore,
    /// Dispatch is held until this instant after a 429
    cooldown: Mutex<Option<Instant>>,
    settings: ClientSettings,
    cancel: CancellationToken,
    dispatches: AtomicU64,
}

impl RateLimitedClient {
    pub fn new(
        hosts: RegionHosts,
        api_key: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        settings: ClientSettings,
        cancel: CancellationToken,
    ) -> Self {
        let limiter = if settings.rate_limit {
            let per_second = NonZeroU32::new(settings.requests_per_second.max(1))
                .unwrap_or(NonZeroU32::MIN);
            let quota = Quota::per_second(per_second).allow_burst(NonZeroU32::MIN);
            Some(RateLimiter::direct(quota))
        } else {
            None
        };

        Self {
            in_flight: Semaphore::new(settings.max_in_flight.max(1)),
            hosts,
            api_key: api_key.into(),
            transport,
            limiter,
            cooldown: Mutex::new(None),
            settings,
            cancel,
            dispatches: AtomicU64::new(0),
        }
    }

    /// Platform id this client serves
    pub fn region(&self) -> &str {
        &self.hosts.platform_id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Requests handed to the transport so far, retries included
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Absolute URL for a path on the platform or cluster host
    pub fn url_for(&self, path: &str, use_cluster_host: bool) -> String {
        let base = if use_cluster_host {
            &self.hosts.cluster_base
        } else {
            &self.hosts.platform_base
        };
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Fetch and decode into JSON, retrying transport failures `retries_remaining` times
    pub async fn fetch(
        &self,
        path: &str,
        use_cluster_host: bool,
        retries_remaining: u32,
    ) -> Result<serde_json::Value, FetchError> {
        let body = self.fetch_body(path, use_cluster_host, retries_remaining).await?;
        decode(path, &body)
    }

    /// Fetch with the configured retry count and decode into `T`
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        use_cluster_host: bool,
    ) -> Result<T, FetchError> {
        let body = self
            .fetch_body(path, use_cluster_host, self.settings.retry_count)
            .await?;
        decode(path, &body)
    }

    /// Check the API key against the platform status endpoint
    pub async fn validate_api_key(&self) -> Result<(), FetchError> {
        self.fetch(PLATFORM_STATUS, false, self.settings.retry_count)
            .await
            .map(|_| ())
    }

    async fn fetch_body(
        &self,
        path: &str,
        use_cluster_host: bool,
        retries_remaining: u32,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path, use_cluster_host);
        let mut remaining = retries_remaining;
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            attempt += 1;

            let outcome = {
                let _permit = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                    permit = self.in_flight.acquire() => permit.map_err(|_| FetchError::Cancelled)?,
                };
                self.wait_for_rate_limit().await?;

                self.dispatches.fetch_add(1, Ordering::Relaxed);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                    outcome = self.transport.get(&url, &self.api_key) => outcome,
                }
            };

            match outcome {
                Ok(response) => {
                    self.log_dispatch(use_cluster_host, path, Some(response.status), attempt);
                    if response.status == 429 {
                        if let Some(wait) = response.retry_after {
                            let wait = wait.min(MAX_RETRY_AFTER);
                            self.start_cooldown(wait);
                            self.pause(wait).await?;
                        }
                    }
                    return classify(path, response);
                }
                Err(failure) => {
                    self.log_dispatch(use_cluster_host, path, None, attempt);

                    if remaining == 0 {
                        return Err(FetchError::Transport {
                            attempts: attempt,
                            message: failure.0,
                        });
                    }

                    warn!(
                        region = %self.hosts.platform_id,
                        path,
                        attempt,
                        retries_left = remaining,
                        error = %failure,
                        "Transport error, retrying after backoff"
                    );
                    remaining -= 1;
                    self.pause(self.settings.retry_backoff).await?;
                }
            }
        }
    }

    async fn wait_for_rate_limit(&self) -> Result<(), FetchError> {
        if let Some(until) = self.cooldown_deadline() {
            let now = Instant::now();
            if until > now {
                debug!(
                    region = %self.hosts.platform_id,
                    wait_ms = (until - now).as_millis() as u64,
                    "Honoring Retry-After cooldown"
                );
                self.pause(until - now).await?;
            }
        }

        if let Some(limiter) = &self.limiter {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = limiter.until_ready() => {}
            }
        }

        Ok(())
    }

    fn cooldown_deadline(&self) -> Option<Instant> {
        self.cooldown.lock().map(|guard| *guard).unwrap_or(None)
    }

    fn start_cooldown(&self, wait: Duration) {
        let until = Instant::now() + wait;
        if let Ok(mut guard) = self.cooldown.lock() {
            if guard.map_or(true, |current| current < until) {
                *guard = Some(until);
            }
        }
        warn!(
            region = %self.hosts.platform_id,
            wait_secs = wait.as_secs(),
            "Rate limited (429), pausing dispatch"
        );
    }

    /// Sleep unless the run is cancelled first
    async fn pause(&self, duration: Duration) -> Result<(), FetchError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn log_dispatch(&self, use_cluster_host: bool, path: &str, status: Option<u16>, attempt: u32) {
        let host = if use_cluster_host {
            &self.hosts.cluster_base
        } else {
            &self.hosts.platform_base
        };

        if self.settings.show_logs {
            info!(region = %self.hosts.platform_id, host = %host, path, status, attempt, "API request");
        } else {
            debug!(region = %self.hosts.platform_id, host = %host, path, status, attempt, "API request");
        }
    }
}

fn classify(path: &str, response: RawResponse) -> Result<Vec<u8>, FetchError> {
    match response.status {
        200 => Ok(response.body),
        403 => Err(FetchError::Auth {
            path: path.to_string(),
        }),
        status => Err(FetchError::SoftHttp {
            status,
            path: path.to_string(),
        }),
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}
