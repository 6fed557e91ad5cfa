//! Time series resolutions as published in period documents.

use chrono::{Months, TimeDelta};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Timestamp;

/// Spacing between consecutive points of a published period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Resolution {
    /// One minute.
    #[serde(rename = "PT1M")]
    Minute1,
    /// Quarter hour.
    #[serde(rename = "PT15M")]
    Minute15,
    /// Half hour.
    #[serde(rename = "PT30M")]
    Minute30,
    /// One hour.
    #[default]
    #[serde(rename = "PT60M")]
    Hour1,
    /// One day.
    #[serde(rename = "P1D")]
    Day1,
    /// One week.
    #[serde(rename = "P7D")]
    Week1,
    /// One calendar month.
    #[serde(rename = "P1M")]
    Month1,
    /// One calendar year.
    #[serde(rename = "P1Y")]
    Year1,
}

impl Resolution {
    /// Returns the fixed step, or None for calendar-based resolutions.
    #[must_use]
    pub fn fixed_step(&self) -> Option<TimeDelta> {
        match self {
            Self::Minute1 => Some(TimeDelta::minutes(1)),
            Self::Minute15 => Some(TimeDelta::minutes(15)),
            Self::Minute30 => Some(TimeDelta::minutes(30)),
            Self::Hour1 => Some(TimeDelta::hours(1)),
            Self::Day1 => Some(TimeDelta::days(1)),
            Self::Week1 => Some(TimeDelta::weeks(1)),
            Self::Month1 | Self::Year1 => None,
        }
    }

    /// Returns true if the step is one day or coarser.
    #[must_use]
    pub const fn is_daily_or_coarser(&self) -> bool {
        matches!(self, Self::Day1 | Self::Week1 | Self::Month1 | Self::Year1)
    }

    /// Returns the instant `n` steps after `origin`.
    ///
    /// Calendar resolutions step in the zone of `origin`.
    #[must_use]
    pub fn advance(&self, origin: Timestamp, n: u32) -> Option<Timestamp> {
        match self {
            Self::Month1 => origin.checked_add_months(Months::new(n)),
            Self::Year1 => origin.checked_add_months(Months::new(n.checked_mul(12)?)),
            fixed => {
                let step = fixed.fixed_step()?;
                origin.checked_add_signed(step.checked_mul(i32::try_from(n).ok()?)?)
            }
        }
    }

    /// Returns the ISO 8601 duration code used by the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "PT1M",
            Self::Minute15 => "PT15M",
            Self::Minute30 => "PT30M",
            Self::Hour1 => "PT60M",
            Self::Day1 => "P1D",
            Self::Week1 => "P7D",
            Self::Month1 => "P1M",
            Self::Year1 => "P1Y",
        }
    }

    /// Returns all supported resolutions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Day1,
            Self::Week1,
            Self::Month1,
            Self::Year1,
        ]
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PT1M" => Ok(Self::Minute1),
            "PT15M" => Ok(Self::Minute15),
            "PT30M" => Ok(Self::Minute30),
            "PT60M" | "PT1H" => Ok(Self::Hour1),
            "P1D" => Ok(Self::Day1),
            "P7D" | "P1W" => Ok(Self::Week1),
            "P1M" => Ok(Self::Month1),
            "P1Y" | "P12M" => Ok(Self::Year1),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown resolution code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionParseError(String);

impl std::fmt::Display for ResolutionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid resolution '{}', expected one of: PT1M, PT15M, PT30M, PT60M, P1D, P7D, P1M, P1Y",
            self.0
        )
    }
}

impl std::error::Error for ResolutionParseError {}
