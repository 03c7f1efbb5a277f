//! Shared HTTP transport with retry on transient failures.

use reelforge_core::truncate_chars;
use reelforge_error::{ProviderError, ProviderErrorKind};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, error, instrument, warn};

/// How transient provider failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// First backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Ceiling on a single backoff delay
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_delay_secs: 10,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Credential placement for a request.
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <key>`
    Bearer(&'a str),
    /// `x-goog-api-key: <key>`
    GoogleKey(&'a str),
}

/// reqwest client plus retry policy, shared by all adapters.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport with a per-request timeout.
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!(error = ?e, "Failed to build HTTP client");
            ProviderError::new(ProviderErrorKind::Request(e.to_string()))
        })?;
        Ok(Self { client, retry })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// POST a JSON body and decode a JSON response.
    #[instrument(skip(self, auth, body))]
    pub async fn post_json<B, T>(&self, url: &str, auth: Auth<'_>, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.with_retry(|| self.client.post(url).json(body), auth)
            .await
    }

    /// GET and decode a JSON response.
    #[instrument(skip(self, auth))]
    pub async fn get_json<T>(&self, url: &str, auth: Auth<'_>) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        self.with_retry(|| self.client.get(url), auth).await
    }

    /// GET raw bytes without credentials, retrying transient failures.
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let strategy = self.strategy();
        Retry::spawn(strategy, || async move {
            match fetch_bytes(self.client.get(url)).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.is_transient() => {
                    warn!(error = %e.kind, "Transient download error, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        })
        .await
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBackoff::from_millis(self.retry.initial_backoff_ms)
            .factor(2)
            .max_delay(Duration::from_secs(self.retry.max_delay_secs))
            .map(jitter)
            .take(self.retry.max_retries)
    }

    async fn with_retry<F, T>(&self, build: F, auth: Auth<'_>) -> Result<T, ProviderError>
    where
        F: Fn() -> RequestBuilder,
        T: DeserializeOwned,
    {
        Retry::spawn(self.strategy(), || {
            let request = build();
            async move {
                match send(request, auth).await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_transient() => {
                        warn!(error = %e.kind, "Transient provider error, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => Err(RetryError::Permanent(e)),
                }
            }
        })
        .await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, auth: Auth<'_>) -> Result<T, ProviderError> {
    let request = match auth {
        Auth::Bearer(key) => request.bearer_auth(key),
        Auth::GoogleKey(key) => request.header("x-goog-api-key", key),
    };

    let response = request.send().await.map_err(|e| {
        error!(error = ?e, "Failed to send provider request");
        ProviderError::new(ProviderErrorKind::Request(e.to_string()))
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        error!(error = ?e, "Failed to read provider response body");
        ProviderError::new(ProviderErrorKind::Request(e.to_string()))
    })?;

    if !status.is_success() {
        let message = truncate_chars(&body, 500);
        error!(status = %status, body = %message, "Provider returned error status");
        return Err(ProviderError::new(ProviderErrorKind::Api {
            status: status.as_u16(),
            message,
        }));
    }

    debug!(bytes = body.len(), "Received provider response");
    serde_json::from_str(&body).map_err(|e| {
        error!(error = ?e, "Failed to decode provider response");
        ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
            "{}: {}",
            e,
            truncate_chars(&body, 200)
        )))
    })
}

async fn fetch_bytes(request: RequestBuilder) -> Result<Vec<u8>, ProviderError> {
    let response = request.send().await.map_err(|e| {
        error!(error = ?e, "Failed to send download request");
        ProviderError::new(ProviderErrorKind::Request(e.to_string()))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::new(ProviderErrorKind::Api {
            status: status.as_u16(),
            message: format!("download failed with status {}", status),
        }));
    }

    let bytes = response.bytes().await.map_err(|e| {
        error!(error = ?e, "Failed to read download body");
        ProviderError::new(ProviderErrorKind::Request(e.to_string()))
    })?;
    debug!(bytes = bytes.len(), "Downloaded media");
    Ok(bytes.to_vec())
}

/// Parse a `WIDTHxHEIGHT` size string; anything else yields `(0, 0)`.
pub(crate) fn parse_size(size: Option<&str>) -> (u32, u32) {
    size.and_then(|s| s.split_once(['x', 'X', '*']))
        .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
        .unwrap_or((0, 0))
}
