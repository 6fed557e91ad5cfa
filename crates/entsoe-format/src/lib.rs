//! Output formatters for entsoe transparency time series.
//!
//! This crate writes [`Frame`](entsoe_types::Frame)s to various output formats:
//!
//! - [`CsvFormatter`] - CSV or TSV format
//! - [`JsonFormatter`] - JSON array or NDJSON format

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(feature = "csv")]
mod csv;
mod formatter;
#[cfg(feature = "json")]
mod json;

#[cfg(feature = "csv")]
pub use crate::csv::CsvFormatter;
pub use formatter::{FormatError, Formatter, OutputFormat};
#[cfg(feature = "json")]
pub use json::{JsonFormatter, JsonStyle};
