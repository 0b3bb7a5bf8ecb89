use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use http::{HeaderMap, Method};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::TransportError;
use super::response::RawResponse;

/// A fully built request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Maximum time to wait for the whole exchange.
    pub timeout: Option<Duration>,
}

/// Sends requests and hands back raw responses.
///
/// Timeouts and retries live here; the response interpreter never retries.
pub trait Transport: Send + Sync {
    /// Sends one request.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T> Transport for Arc<T>
where
    T: Transport,
{
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        T::send(self, request)
    }
}

/// Exponential backoff for transient transport failures.
///
/// Only connection and timeout errors are retried. An HTTP response, whatever
/// its status, is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound of the delay between retries.
    pub max_delay: Duration,
    /// Number of retries after the first attempt.
    pub max_retries: usize,
    /// Randomize delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            max_retries: 3,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry: Option<RetryPolicy>,
}

impl ReqwestTransport {
    /// Creates a transport with its own connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: None,
        }
    }

    /// Enables retries of transient failures.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    async fn send_once(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.url, "sending...");
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, length = bytes.len(), "...receiving");

        Ok(RawResponse::new(status, decode_body(&bytes)))
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let Some(policy) = self.retry else {
            return self.send_once(&request).await;
        };

        (|| self.send_once(&request))
            .retry(policy.backoff())
            .when(TransportError::is_transient)
            .notify(|error: &TransportError, delay: Duration| {
                warn!(%error, ?delay, "transient transport failure, retrying");
            })
            .await
    }
}

/// Empty bodies become `None`; bodies that are not JSON are kept as a JSON string.
fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let value = serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()));
    Some(value)
}
