//! HTTP transport and raw endpoints for the entsoe transparency client.
//!
//! This crate provides the request path below the stitching layer:
//!
//! - [`RawClient`] - Rate-limited, retrying client returning raw [`Payload`]s
//! - [`Transport`] - Single-attempt HTTP seam, backed by [`ReqwestTransport`]
//! - [`RetryPolicy`] - Bounded retry on transient connection failures
//! - [`RateLimiter`] - Sliding request window driven by a [`Clock`]
//! - [`classify`] - Provider error text to error kind mapping
//! - [`endpoints`] - Query builders for every documented endpoint
//! - [`xml::Element`] - Element tree used by the decoders

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod classify;
mod client;
pub mod endpoints;
mod payload;
mod query;
mod retry;
mod throttle;
mod transport;
pub mod xml;

pub use classify::ErrorKind;
pub use client::{API_KEY_ENV, API_URL, ClientConfig, RawClient};
pub use endpoints::{Horizon, Outage};
pub use payload::{Payload, PayloadKind};
pub use query::{Query, format_period};
pub use retry::RetryPolicy;
pub use throttle::{Clock, ManualClock, RateLimit, RateLimiter, SystemClock};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
