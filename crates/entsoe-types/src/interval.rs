//! Query intervals and calendar-aligned splitting.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::IntervalError;

/// A zoned instant, the unit every query boundary is expressed in.
pub type Timestamp = DateTime<Tz>;

/// Calendar unit used to split long intervals into provider-compliant blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    /// Calendar years (the provider's default span limit).
    #[default]
    Year,
    /// Calendar months.
    Month,
    /// Calendar days.
    Day,
}

impl Granularity {
    /// Returns the granularity as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }

    /// Returns the first calendar boundary strictly after `date`.
    fn next_boundary(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
            Self::Month if date.month() == 12 => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1),
            Self::Day => date.succ_opt(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A half-open interval `[start, end)` between two zoned instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Creates a new interval, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, IntervalError> {
        if start > end {
            return Err(IntervalError::Reversed {
                start: start.with_timezone(&Utc),
                end: end.with_timezone(&Utc),
            });
        }
        Ok(Self { start, end })
    }

    /// Returns the inclusive start.
    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Returns the exclusive end.
    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Returns the start as UTC.
    #[must_use]
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    /// Returns the end as UTC.
    #[must_use]
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Returns the length of the interval.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Returns true if start == end.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the instant lies within `[start, end)`.
    #[must_use]
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        *instant >= self.start && *instant < self.end
    }

    /// Returns the instant halfway between start and end.
    #[must_use]
    pub fn midpoint(&self) -> Timestamp {
        self.start + self.duration() / 2
    }

    /// Splits the interval at its midpoint.
    #[must_use]
    pub fn bisect(&self) -> (Self, Self) {
        let pivot = self.midpoint();
        (
            Self {
                start: self.start,
                end: pivot,
            },
            Self {
                start: pivot,
                end: self.end,
            },
        )
    }

    /// Returns the same interval expressed in another zone.
    #[must_use]
    pub fn with_timezone(&self, tz: &Tz) -> Self {
        Self {
            start: self.start.with_timezone(tz),
            end: self.end.with_timezone(tz),
        }
    }

    /// Splits the interval into contiguous blocks that never cross a calendar
    /// boundary of the given granularity.
    ///
    /// Boundaries are computed in the zone of `start`, so a yearly split starting
    /// on 2022-06-01 ends its first block on 2023-01-01. An empty interval yields a
    /// single empty block.
    #[must_use]
    pub fn split(&self, granularity: Granularity) -> Vec<Self> {
        let tz = self.start.timezone();
        let end = self.end.with_timezone(&tz);

        if self.is_empty() {
            return vec![Self {
                start: self.start,
                end,
            }];
        }

        let mut blocks = Vec::new();
        let mut cursor = self.start;
        while cursor < end {
            let boundary = granularity
                .next_boundary(cursor.date_naive())
                .and_then(|date| localize(&tz, date.and_time(chrono::NaiveTime::MIN)))
                .filter(|boundary| *boundary > cursor);
            let block_end = boundary.map_or(end, |boundary| boundary.min(end));
            blocks.push(Self {
                start: cursor,
                end: block_end,
            });
            cursor = block_end;
        }
        blocks
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Resolves a local wall-clock time, moving forward out of DST gaps.
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<Timestamp> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        (1..=4).find_map(|step| {
            tz.from_local_datetime(&(naive + TimeDelta::minutes(30 * step)))
                .earliest()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Europe::Brussels;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Brussels.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn interval(start: Timestamp, end: Timestamp) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn assert_covers(blocks: &[Interval], whole: &Interval) {
        assert_eq!(blocks.first().unwrap().start(), whole.start());
        assert_eq!(blocks.last().unwrap().end(), whole.end());
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
            assert!(pair[0].start() < pair[0].end());
        }
    }

    #[test]
    fn test_interval_invalid() {
        assert!(Interval::new(ts(2024, 2, 1, 0), ts(2024, 1, 1, 0)).is_err());
    }

    #[test]
    fn test_year_split_is_calendar_aligned() {
        let whole = interval(ts(2022, 6, 1, 0), ts(2024, 3, 15, 0));
        let blocks = whole.split(Granularity::Year);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].end(), ts(2023, 1, 1, 0));
        assert_eq!(blocks[1].start(), ts(2023, 1, 1, 0));
        assert_eq!(blocks[1].end(), ts(2024, 1, 1, 0));
        assert_eq!(blocks[2].end(), ts(2024, 3, 15, 0));
        assert_covers(&blocks, &whole);
    }

    #[test]
    fn test_month_split() {
        let whole = interval(ts(2023, 11, 15, 6), ts(2024, 2, 2, 0));
        let blocks = whole.split(Granularity::Month);

        let ends: Vec<_> = blocks.iter().map(Interval::end).collect();
        assert_eq!(
            ends,
            vec![
                ts(2023, 12, 1, 0),
                ts(2024, 1, 1, 0),
                ts(2024, 2, 1, 0),
                ts(2024, 2, 2, 0)
            ]
        );
        assert_covers(&blocks, &whole);
    }

    #[test]
    fn test_day_split_across_dst() {
        let whole = interval(ts(2024, 3, 30, 0), ts(2024, 4, 1, 0));
        let blocks = whole.split(Granularity::Day);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].duration(), TimeDelta::hours(24));
        // 2024-03-31 is the spring-forward day in Brussels
        assert_eq!(blocks[1].duration(), TimeDelta::hours(23));
        assert_eq!(blocks[1].start().hour(), 0);
    }

    #[test]
    fn test_split_coverage_many_ranges() {
        let starts = [
            ts(2015, 1, 1, 0),
            ts(2019, 7, 19, 13),
            ts(2020, 2, 29, 23),
            ts(2023, 12, 31, 22),
        ];
        let lengths = [1_i64, 30, 400, 1500];

        for start in starts {
            for days in lengths {
                let whole = interval(start, start + TimeDelta::days(days));
                for granularity in [Granularity::Year, Granularity::Month, Granularity::Day] {
                    let blocks = whole.split(granularity);
                    assert_covers(&blocks, &whole);
                    for block in &blocks {
                        let limit = granularity
                            .next_boundary(block.start().date_naive())
                            .unwrap();
                        assert!(block.end().date_naive() <= limit);
                    }
                }
            }
        }
    }

    #[test]
    fn test_split_deterministic() {
        let whole = interval(ts(2021, 3, 3, 3), ts(2023, 8, 8, 8));
        assert_eq!(whole.split(Granularity::Month), whole.split(Granularity::Month));
    }

    #[test]
    fn test_split_minimal_interval_is_identity() {
        let whole = interval(ts(2023, 5, 1, 0), ts(2023, 5, 20, 0));
        assert_eq!(whole.split(Granularity::Year), vec![whole]);
    }

    #[test]
    fn test_split_empty_interval() {
        let whole = interval(ts(2023, 5, 1, 0), ts(2023, 5, 1, 0));
        let blocks = whole.split(Granularity::Day);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_empty());
    }

    #[test]
    fn test_bisect() {
        let whole = interval(ts(2023, 1, 1, 0), ts(2023, 1, 3, 0));
        let (left, right) = whole.bisect();
        assert_eq!(left.end(), ts(2023, 1, 2, 0));
        assert_eq!(right.start(), ts(2023, 1, 2, 0));
        assert_eq!(right.end(), whole.end());
    }
}
