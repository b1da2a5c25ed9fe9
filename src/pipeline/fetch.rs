//! Registry HTTP access: the transport seam and the retry loop.
//!
//! ## Retry Strategy
//!
//! Only failures that may clear up on their own are retried: no response at
//! all (timeout, connection reset) or a 5xx status. A 4xx is the registry's
//! definitive answer for this DOI and is returned immediately. Backoff starts
//! at `retry_backoff_ms` and doubles per retry, so with the defaults the wait
//! sequence is 600 ms → 1.2 s across three attempts.

use crate::config::RenameConfig;
use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Status and body of one registry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RegistryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Sends a JSON `GET` to a registry.
///
/// Implemented by [`ReqwestTransport`] for real traffic; tests substitute
/// scripted transports.
pub trait RegistryTransport: Send + Sync {
    fn get(&self, url: &str)
        -> impl Future<Output = Result<RegistryResponse, TransportError>> + Send;
}

/// [`RegistryTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Build a client with the configured timeout and identifying User-Agent.
    pub fn new(config: &RenameConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }
}

impl RegistryTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RegistryResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(RegistryResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl ReqwestTransport {
    fn classify(&self, e: reqwest::Error) -> TransportError {
        // Drop the URL from the message; it only repeats the DOI.
        let e = e.without_url();
        if e.is_timeout() {
            TransportError::Timeout {
                secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// How often and how patiently one registry call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RenameConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff(),
        }
    }

    /// Delay before retry number `retry` (1-based): `initial * 2^(retry-1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// What a registry call finally produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with its body.
    Success(Vec<u8>),
    /// A non-2xx status: a 4xx, or a 5xx that outlasted every retry.
    Status(u16),
    /// No response after every retry.
    Unreachable(TransportError),
}

/// `GET url`, retrying transport failures and 5xx per `policy`.
pub async fn fetch_with_retry<T: RegistryTransport>(
    transport: &T,
    url: &str,
    policy: RetryPolicy,
) -> FetchOutcome {
    let mut attempt = 0u32;
    loop {
        let retries_left = attempt < policy.max_retries;
        let reason = match transport.get(url).await {
            Ok(response) if response.is_success() => {
                debug!("GET {} → {} ({} bytes)", url, response.status, response.body.len());
                return FetchOutcome::Success(response.body);
            }
            Ok(response) if response.is_server_error() && retries_left => {
                format!("HTTP {}", response.status)
            }
            Ok(response) => {
                debug!("GET {} → {}", url, response.status);
                return FetchOutcome::Status(response.status);
            }
            Err(e) if retries_left => e.to_string(),
            Err(e) => {
                warn!("GET {} failed after {} attempts: {}", url, attempt + 1, e);
                return FetchOutcome::Unreachable(e);
            }
        };

        attempt += 1;
        let backoff = policy.backoff(attempt);
        warn!(
            "GET {}: {}, retry {}/{} after {}ms",
            url,
            reason,
            attempt,
            policy.max_retries,
            backoff.as_millis()
        );
        sleep(backoff).await;
    }
}
