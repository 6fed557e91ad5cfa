//! Area registry for the entsoe transparency client.
//!
//! This crate provides access to every bidding zone, control area and market
//! balance area known to the transparency platform, with their EIC codes and
//! local timezones, plus the provider's code tables.
//!
//! # Example
//!
//! ```
//! use entsoe_areas::AreaRegistry;
//!
//! let registry = AreaRegistry::global();
//!
//! // Lookup by alias or by EIC code
//! if let Some(area) = registry.get("de_lu") {
//!     println!("{}: {}", area.code(), area.tz());
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/entsoe/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codes;

pub use codes::{
    CodeTables, business_type, doc_status, document_type, market_agreement_type, process_type,
    psr_type,
};

use std::collections::HashMap;
use std::sync::OnceLock;

use entsoe_types::{Area, EntsoeError, Result};

/// The area metadata JSON embedded at compile time.
const AREAS_JSON: &str = include_str!("../data/areas.json");

/// Neighbouring bidding zones with cross-border flows.
const NEIGHBOURS_JSON: &str = include_str!("../data/neighbours.json");

/// Global area registry instance.
static REGISTRY: OnceLock<AreaRegistry> = OnceLock::new();

/// Registry of all areas addressable on the transparency platform.
#[derive(Debug)]
pub struct AreaRegistry {
    areas: Vec<Area>,
    by_key: HashMap<String, usize>,
    neighbours: HashMap<String, Vec<String>>,
}

impl AreaRegistry {
    /// Returns the global area registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    /// Loads areas from the embedded JSON data.
    fn load() -> Self {
        let areas: Vec<Area> = serde_json::from_str(AREAS_JSON).expect("Invalid areas.json");
        let neighbours: HashMap<String, Vec<String>> =
            serde_json::from_str(NEIGHBOURS_JSON).expect("Invalid neighbours.json");
        let by_key = areas
            .iter()
            .enumerate()
            .map(|(idx, area)| (area.key().to_lowercase(), idx))
            .collect();
        Self {
            areas,
            by_key,
            neighbours,
        }
    }

    /// Looks up an area by alias (case-insensitive).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Area> {
        self.by_key
            .get(&key.to_lowercase())
            .map(|&idx| &self.areas[idx])
    }

    /// Looks up an area by EIC code.
    ///
    /// Several aliases share a code (e.g. `DE_LU` and `LU_BZN`); the first
    /// declared one is returned.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&Area> {
        self.areas.iter().find(|area| area.code() == code)
    }

    /// Resolves an alias first, then a raw EIC code.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::UnknownArea`] if neither matches.
    pub fn lookup(&self, alias_or_code: &str) -> Result<&Area> {
        self.get(alias_or_code)
            .or_else(|| self.by_code(alias_or_code))
            .ok_or_else(|| EntsoeError::UnknownArea(alias_or_code.to_string()))
    }

    /// Returns the neighbours of a bidding zone with cross-border flows.
    ///
    /// Areas without a neighbour entry yield an empty list.
    pub fn neighbours(&self, area: &Area) -> Vec<&Area> {
        self.neighbours
            .get(area.key())
            .into_iter()
            .flatten()
            .filter_map(|key| self.get(key))
            .collect()
    }

    /// Returns all areas in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter()
    }

    /// Returns the total number of areas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Searches areas by alias or description (case-insensitive).
    pub fn search(&self, pattern: &str) -> Vec<&Area> {
        let pattern = pattern.to_lowercase();
        self.areas
            .iter()
            .filter(|a| {
                a.key().to_lowercase().contains(&pattern)
                    || a.meaning().to_lowercase().contains(&pattern)
            })
            .collect()
    }

    /// Returns all aliases sorted alphabetically.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.areas.iter().map(Area::key).collect();
        keys.sort_unstable();
        keys
    }
}
