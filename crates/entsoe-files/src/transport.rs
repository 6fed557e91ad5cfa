//! HTTP calls made by the file library client.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::{FileConfig, FileError, Result};

/// Performs the two kinds of POST the file library needs.
#[async_trait]
pub trait FileTransport: Send + Sync + std::fmt::Debug {
    /// Posts a url-encoded form and returns the response body.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Bytes>;

    /// Posts a JSON body with a bearer token and returns the response body.
    async fn post_json(&self, url: &str, token: &str, body: &serde_json::Value) -> Result<Bytes>;
}

/// Transport backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFileTransport {
    client: Client,
}

impl ReqwestFileTransport {
    /// Creates a transport honouring the timeout and user agent of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent).gzip(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FileError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<Bytes> {
        let response = request
            .send()
            .await
            .map_err(|e| FileError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FileError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(FileError::Status {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl FileTransport for ReqwestFileTransport {
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Bytes> {
        Self::send(self.client.post(url).form(form)).await
    }

    async fn post_json(&self, url: &str, token: &str, body: &serde_json::Value) -> Result<Bytes> {
        Self::send(self.client.post(url).bearer_auth(token).json(body)).await
    }
}
