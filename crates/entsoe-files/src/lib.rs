//! Client for the ENTSO-E transparency platform file library.
//!
//! The file library publishes bulk exports as zipped tab-separated files:
//!
//! - [`FileClient`] - Authenticated listing and download of exported files
//! - [`FileConfig`] - Credentials and endpoints
//! - [`Table`] - Decoded tab-separated content
//! - [`FileTransport`] - Seam for the HTTP calls

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod table;
mod token;
mod transport;

pub use client::{FILES_URL, FileClient, FileConfig, PASSWORD_ENV, TOKEN_URL, USERNAME_ENV};
pub use error::{FileError, Result};
pub use table::Table;
pub use transport::{FileTransport, ReqwestFileTransport};
