//! Error types for the file library client.

use thiserror::Error;

/// Errors returned by the file library client.
#[derive(Error, Debug)]
pub enum FileError {
    /// Username or password missing from configuration and environment.
    #[error("file library credentials not set (ENTSOE_USERNAME / ENTSOE_PWD)")]
    MissingCredentials,

    /// The server answered with an error status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Response(String),

    /// Downloaded archive could not be read.
    #[error(transparent)]
    Archive(#[from] entsoe_types::EntsoeError),

    /// Tab-separated content could not be parsed.
    #[error("TSV error: {0}")]
    Tsv(#[from] csv_async::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the file library client.
pub type Result<T> = std::result::Result<T, FileError>;
