//! Error types for entsoe.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for entsoe operations.
pub type Result<T> = std::result::Result<T, EntsoeError>;

/// Errors that can occur while querying and decoding transparency data.
#[derive(Error, Debug)]
pub enum EntsoeError {
    /// Connection-level failure that survived the retry budget.
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// The query (or every chunk of it) legitimately returned nothing.
    #[error("No matching data found")]
    NoData,

    /// The provider refused the request because it would return too many items.
    ///
    /// Consumed internally by interval bisection; never expected at the caller.
    #[error("Requested data exceeds the provider limit (requested {requested:?}, allowed {allowed:?})")]
    PaginationRequired {
        /// Number of documents the request would have produced, if stated.
        requested: Option<u64>,
        /// Number of documents the provider allows per request, if stated.
        allowed: Option<u64>,
    },

    /// Bisection gave up before the provider accepted the request.
    #[error("Pagination limit exceeded for {start} to {end} at depth {depth}")]
    PaginationLimitExceeded {
        /// Start of the window that could not be resolved.
        start: DateTime<Utc>,
        /// End of the window that could not be resolved.
        end: DateTime<Utc>,
        /// Recursion depth reached.
        depth: u32,
    },

    /// The combination of business parameters is rejected by the provider.
    #[error("Invalid business parameter: {0}")]
    InvalidBusinessParameter(String),

    /// A parameter is not valid for the requested area.
    #[error("Invalid parameter for area: {0}")]
    InvalidParameterForArea(String),

    /// HTTP error whose body did not match any known provider message.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// ZIP archive could not be read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Area alias or code not found in the registry.
    #[error("Unknown area: {0}")]
    UnknownArea(String),

    /// Client configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid interval.
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EntsoeError {
    /// Returns true if this error signals an empty result rather than a failure.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Returns true if the provider asked for a narrower request.
    #[must_use]
    pub const fn is_pagination_required(&self) -> bool {
        matches!(self, Self::PaginationRequired { .. })
    }
}

/// Error for invalid intervals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// Start is after end.
    #[error("Invalid interval: {start} > {end}")]
    Reversed {
        /// The start instant.
        start: DateTime<Utc>,
        /// The end instant.
        end: DateTime<Utc>,
    },
}
