//! Interval chunking, pagination and result stitching for the entsoe client.
//!
//! This crate turns one logical request into the sequence of provider requests
//! that satisfies it, then reassembles the answers:
//!
//! - [`Pipeline`] - Splits, fetches, truncates, merges and normalizes
//! - [`EndpointPolicy`] - Per-endpoint variation points, as data
//! - [`resolve`] - Recursive bisection on oversized requests
//! - [`paginate`] - Document-offset paging
//! - [`DuplicatePolicy`] - Duplicate-timestamp merge rules
//! - [`normalize`] / [`period_index`] - Final ordering, zone and DST handling

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod merge;
mod normalize;
mod offset;
mod pipeline;
mod resolver;

pub use merge::DuplicatePolicy;
pub use normalize::{normalize, period_index};
pub use offset::{OffsetPaging, paginate};
pub use pipeline::{EndpointPolicy, Pipeline, Source};
pub use resolver::{PaginationLimits, resolve};
