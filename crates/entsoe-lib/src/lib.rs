//! Rust client for the ENTSO-E transparency platform.
//!
//! This is a facade crate that re-exports functionality from the entsoe
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use entsoe_lib::prelude::*;
//! use chrono::TimeZone;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EntsoeClient::new(ClientConfig::default())?;
//!     let tz = AreaRegistry::global().lookup("BE")?.tz();
//!
//!     let start = tz.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
//!     let end = tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//!
//!     let prices = client.query_day_ahead_prices("BE", start, end).await?;
//!     CsvFormatter::new().write_frame(&prices, std::io::stdout())?;
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use entsoe_types::*;

// Re-export area registry and code tables
pub use entsoe_areas::{
    AreaRegistry, CodeTables, business_type, doc_status, document_type, market_agreement_type,
    process_type, psr_type,
};

// Re-export the query clients
#[cfg(feature = "client")]
pub use entsoe_client::{Endpoint, EndpointParseError, EntsoeClient, decode};
#[cfg(feature = "client")]
pub use entsoe_fetch::{ClientConfig, Horizon, Outage, Payload, Query, RateLimit, RawClient};
#[cfg(feature = "client")]
pub use entsoe_stitch::{DuplicatePolicy, EndpointPolicy, PaginationLimits, Pipeline};

// Re-export the file library client
#[cfg(feature = "files")]
pub use entsoe_files::{FileClient, FileConfig, FileError, Table};

// Re-export formatters
#[cfg(feature = "format")]
pub use entsoe_format::{CsvFormatter, FormatError, Formatter, JsonFormatter, OutputFormat};

/// Prelude module for convenient imports.
///
/// ```
/// use entsoe_lib::prelude::*;
/// ```
pub mod prelude {
    pub use entsoe_types::{
        Area, EntsoeError, Frame, Granularity, Interval, Resolution, Result, Row, Timestamp,
        Value,
    };

    pub use entsoe_areas::AreaRegistry;

    #[cfg(feature = "client")]
    pub use entsoe_client::{Endpoint, EntsoeClient};

    #[cfg(feature = "client")]
    pub use entsoe_fetch::{ClientConfig, Horizon, RawClient};

    #[cfg(feature = "files")]
    pub use entsoe_files::{FileClient, FileConfig};

    #[cfg(feature = "format")]
    pub use entsoe_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
