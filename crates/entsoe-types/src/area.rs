//! Bidding zone, control area and market balance area definitions.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A market area addressed by the transparency platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Short alias (e.g., "DE_LU", "NO_2").
    key: String,
    /// Energy identification code sent to the provider.
    code: String,
    /// Human-readable description.
    meaning: String,
    /// Local timezone of the area.
    tz: Tz,
}

impl Area {
    /// Creates a new area.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        code: impl Into<String>,
        meaning: impl Into<String>,
        tz: Tz,
    ) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            meaning: meaning.into(),
            tz,
        }
    }

    /// Returns the short alias.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the EIC code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the description.
    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    /// Returns the local timezone.
    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.tz
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_deserialize() {
        let json = r#"{"key":"BE","code":"10YBE----------2","meaning":"Belgium","tz":"Europe/Brussels"}"#;
        let area: Area = serde_json::from_str(json).unwrap();
        assert_eq!(area.key(), "BE");
        assert_eq!(area.tz(), chrono_tz::Europe::Brussels);
        assert_eq!(area.to_string(), "10YBE----------2");
    }
}
