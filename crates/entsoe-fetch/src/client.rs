//! Client configuration and the request path shared by every endpoint.

use std::sync::Arc;
use std::time::Duration;

use entsoe_types::{EntsoeError, Result};

use crate::{
    Clock, Payload, Query, RateLimit, RateLimiter, RawResponse, ReqwestTransport, RetryPolicy,
    SystemClock, Transport, classify,
};

/// Production API endpoint.
pub const API_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "ENTSOE_API_KEY";

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Security token; falls back to `ENTSOE_API_KEY` when unset.
    pub api_key: Option<String>,
    /// API endpoint.
    pub base_url: String,
    /// Total attempts per request on connection failures (0 is treated as 1).
    pub retry_count: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Proxy URL for all requests.
    pub proxy: Option<String>,
    /// User agent string.
    pub user_agent: String,
    /// Request-window limit.
    pub rate_limit: RateLimit,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: API_URL.to_string(),
            retry_count: 1,
            retry_delay: Duration::ZERO,
            timeout: None,
            proxy: None,
            user_agent: format!("entsoe/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: RateLimit::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration with the given API key.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Resolves the API key from the configuration or the environment.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::Config`] if neither provides a non-empty key.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                EntsoeError::Config(format!("API key missing: pass one or set {API_KEY_ENV}"))
            })
    }

    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, self.retry_delay)
    }
}

/// Low-level client returning raw payloads.
///
/// Every request passes the rate limiter, is retried on transient failures and
/// has its error payloads classified.
#[derive(Debug, Clone)]
pub struct RawClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ClientConfig,
    api_key: String,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
}

impl RawClient {
    /// Creates a client using the reqwest transport and the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(SystemClock))
    }

    /// Creates a client with an explicit transport and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let limiter = RateLimiter::new(config.rate_limit);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                api_key,
                transport,
                clock,
                limiter,
            }),
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends one query and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns the classified provider error, or [`EntsoeError::Transport`] once
    /// the retry budget is spent.
    pub async fn request(&self, query: &Query) -> Result<Payload> {
        let inner = self.inner.as_ref();
        let params = query.to_params(&inner.api_key);
        let params = params.as_slice();
        let url = inner.config.base_url.as_str();

        tracing::debug!(%query, "requesting");
        let response = inner
            .config
            .retry_policy()
            .run(inner.clock.as_ref(), move || async move {
                inner.limiter.acquire(inner.clock.as_ref()).await;
                inner.transport.get(url, params).await
            })
            .await?;

        into_payload(response)
    }
}

fn into_payload(response: RawResponse) -> Result<Payload> {
    if !response.is_success() {
        let err = classify::into_error(response.status, &response.text());
        tracing::debug!(status = response.status, error = %err, "request failed");
        return Err(err);
    }
    if let Some(err) = classify::acknowledgement(response.status, &response.body) {
        return Err(err);
    }
    Ok(Payload::new(response.body))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ManualClock, TransportError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use entsoe_types::Interval;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport replaying canned outcomes and recording the parameters it saw.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        outcomes: Mutex<VecDeque<std::result::Result<RawResponse, TransportError>>>,
        pub(crate) seen: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(
            outcomes: Vec<std::result::Result<RawResponse, TransportError>>,
        ) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            _url: &str,
            params: &[(String, String)],
        ) -> std::result::Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(params.to_vec());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(500, "script exhausted")))
        }
    }

    pub(crate) fn test_client(
        transport: Arc<ScriptedTransport>,
        retry_count: u32,
    ) -> (RawClient, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = ClientConfig {
            retry_count,
            retry_delay: Duration::from_secs(1),
            ..ClientConfig::with_api_key("test-key")
        };
        let client = RawClient::with_transport(config, transport, clock.clone()).unwrap();
        (client, clock)
    }

    fn query() -> Query {
        let interval = Interval::new(
            UTC.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            UTC.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();
        Query::new(interval).param("documentType", "A44")
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.base_url, API_URL);
        assert_eq!(config.rate_limit, RateLimit::default());
        assert_eq!(ClientConfig::with_api_key("k").resolve_api_key().unwrap(), "k");
    }

    #[tokio::test]
    async fn test_request_success() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(
            200,
            "<Publication_MarketDocument/>",
        ))]));
        let (client, _) = test_client(transport.clone(), 1);

        let payload = client.request(&query()).await.unwrap();
        assert_eq!(payload.body().as_ref(), b"<Publication_MarketDocument/>");

        let seen = transport.seen.lock().unwrap();
        assert!(seen[0].contains(&("securityToken".to_string(), "test-key".to_string())));
    }

    #[tokio::test]
    async fn test_request_retries_connection_errors() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::transient("connection refused")),
            Ok(RawResponse::new(200, "<doc/>")),
        ]));
        let (client, clock) = test_client(transport.clone(), 3);

        assert!(client.request(&query()).await.is_ok());
        assert_eq!(transport.seen.lock().unwrap().len(), 2);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_http_errors_are_classified_not_retried() {
        let body = "<Acknowledgement_MarketDocument><Reason><text>No matching data found</text></Reason></Acknowledgement_MarketDocument>";
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(400, body))]));
        let (client, _) = test_client(transport.clone(), 3);

        assert!(matches!(
            client.request(&query()).await,
            Err(EntsoeError::NoData)
        ));
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }
}
