//! HTTP transport seam.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

use entsoe_types::{EntsoeError, Result};

use crate::ClientConfig;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A request that never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// Whether retrying may succeed (connect refused, DNS, reset, timeout).
    pub transient: bool,
    /// Description of the failure.
    pub message: String,
}

impl TransportError {
    /// Creates a retryable error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            message: message.into(),
        }
    }

    /// Creates a non-retryable error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            message: message.into(),
        }
    }
}

/// Performs a single GET request attempt.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends a GET request with the given query parameters.
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// Transport backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport honouring the timeout, proxy and user agent of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| EntsoeError::Config(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| EntsoeError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Determines if an error is retryable.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        if error.is_builder() {
            return false;
        }
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportError> {
        let classify = |e: reqwest::Error| TransportError {
            transient: Self::is_retryable_error(&e),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}
