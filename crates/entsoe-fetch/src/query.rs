//! Query descriptors and request parameter encoding.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use entsoe_types::Interval;

/// Formats an instant as the provider's period parameter (`YYYYMMDDHH00`, UTC).
///
/// The provider only accepts whole hours; minutes are dropped, never rounded up.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use entsoe_fetch::format_period;
///
/// let t = Utc.with_ymd_and_hms(2022, 12, 31, 23, 45, 0).unwrap();
/// assert_eq!(format_period(t), "202212312300");
/// ```
#[must_use]
pub fn format_period(instant: DateTime<Utc>) -> String {
    let hour = instant
        .duration_trunc(TimeDelta::hours(1))
        .unwrap_or(instant);
    hour.format("%Y%m%d%H00").to_string()
}

/// Immutable description of one provider request.
///
/// Narrowed or re-offset copies are derived per chunk; the source query is never
/// modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
    interval: Interval,
    offset: Option<u32>,
}

impl Query {
    /// Creates a query for the given interval with no endpoint parameters.
    #[must_use]
    pub const fn new(interval: Interval) -> Self {
        Self {
            params: Vec::new(),
            interval,
            offset: None,
        }
    }

    /// Adds an endpoint parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Adds an endpoint parameter when present.
    #[must_use]
    pub fn param_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Returns a copy restricted to another interval.
    #[must_use]
    pub fn with_interval(&self, interval: Interval) -> Self {
        Self {
            interval,
            ..self.clone()
        }
    }

    /// Returns a copy requesting documents from the given offset.
    #[must_use]
    pub fn with_offset(&self, offset: Option<u32>) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Returns the interval.
    #[must_use]
    pub const fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Returns the document offset, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Returns the endpoint parameters.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the value of an endpoint parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the full parameter list sent to the provider.
    #[must_use]
    pub fn to_params(&self, security_token: &str) -> Vec<(String, String)> {
        let mut params = self.params.clone();
        params.push(("securityToken".to_string(), security_token.to_string()));
        params.push((
            "periodStart".to_string(),
            format_period(self.interval.start_utc()),
        ));
        params.push((
            "periodEnd".to_string(),
            format_period(self.interval.end_utc()),
        ));
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{} [{}]", codes.join("&"), self.interval)?;
        if let Some(offset) = self.offset {
            write!(f, " offset={offset}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;

    #[test]
    fn test_format_period_drops_minutes() {
        let t = Utc.with_ymd_and_hms(2023, 6, 1, 12, 45, 0).unwrap();
        assert_eq!(format_period(t), "202306011200");

        let t = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_period(t), "202306011200");

        let t = Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_period(t), "202212312300");
    }

    #[test]
    fn test_to_params_uses_utc() {
        let interval = Interval::new(
            Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Brussels.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let query = Query::new(interval)
            .param("documentType", "A44")
            .with_offset(Some(200));

        let params = query.to_params("token");
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("documentType"), Some("A44"));
        assert_eq!(get("securityToken"), Some("token"));
        assert_eq!(get("periodStart"), Some("202212312300"));
        assert_eq!(get("periodEnd"), Some("202301012300"));
        assert_eq!(get("offset"), Some("200"));
    }

    #[test]
    fn test_derived_copies_leave_source_untouched() {
        let a = Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let b = Brussels.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        let query = Query::new(Interval::new(a, b).unwrap()).param("documentType", "A77");
        let (left, _) = query.interval().bisect();

        let narrowed = query.with_interval(left).with_offset(Some(400));
        assert_eq!(query.offset(), None);
        assert_eq!(query.interval().end(), b);
        assert_eq!(narrowed.get("documentType"), Some("A77"));
        assert_eq!(narrowed.offset(), Some(400));
    }
}
