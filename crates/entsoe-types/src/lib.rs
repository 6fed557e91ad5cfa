//! Core types for the entsoe transparency client.
//!
//! This crate provides the fundamental data structures used throughout entsoe:
//!
//! - [`Area`] - Market area with its EIC code and timezone
//! - [`Interval`] - Half-open query interval with calendar-aligned splitting
//! - [`Frame`] - Timestamped rows returned by every query
//! - [`Resolution`] - Point spacing of a published period
//! - [`EntsoeError`] - Error taxonomy shared by every crate

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod area;
mod error;
mod frame;
mod interval;
mod resolution;

pub use area::Area;
pub use error::{EntsoeError, IntervalError, Result};
pub use frame::{Frame, Row, Value};
pub use interval::{Granularity, Interval, Timestamp};
pub use resolution::{Resolution, ResolutionParseError};
