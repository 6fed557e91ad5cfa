//! High-level client for the ENTSO-E transparency platform.
//!
//! Every query returns one [`Frame`](entsoe_types::Frame) covering the requested
//! interval, however many provider requests it took:
//!
//! - [`EntsoeClient`] - Typed queries by area alias or EIC code
//! - [`Endpoint`] - Catalogue of queries and their stitching policies
//! - [`decode`] - Document decoders producing frames

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
pub mod decode;
mod endpoint;
mod source;

pub use client::EntsoeClient;
pub use endpoint::{Endpoint, EndpointParseError};
