//! CLI command implementations.

pub(crate) mod areas;
pub(crate) mod files;
pub(crate) mod query;
