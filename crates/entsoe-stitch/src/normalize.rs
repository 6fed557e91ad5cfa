//! Final ordering, zone conversion and truncation of stitched results.

use std::collections::HashSet;

use chrono::{Offset, Timelike};
use chrono_tz::Tz;

use entsoe_types::{EntsoeError, Frame, Resolution, Result, Timestamp};

/// Sorts the frame, converts it to `tz` and optionally keeps `start <= ts <= end`.
///
/// # Errors
///
/// Returns [`EntsoeError::NoData`] if no rows remain.
pub fn normalize(
    mut frame: Frame,
    tz: &Tz,
    start: Timestamp,
    end: Timestamp,
    truncate: bool,
) -> Result<Frame> {
    frame.sort_by_timestamp();
    let mut frame = frame.with_timezone(tz);
    if truncate {
        frame.retain(|row| row.timestamp >= start && row.timestamp <= end);
    }
    if frame.is_empty() {
        return Err(EntsoeError::NoData);
    }
    Ok(frame)
}

/// Builds the timestamps of a period `[start, end)` sampled at `resolution`.
///
/// With a zone, steps are taken in that zone; a weekly index that spans a UTC
/// offset change loses its trailing element, which the provider never publishes.
/// Without a zone, daily or coarser indices whose end sits one hour past the
/// start's hour of day drop the trailing element produced by the DST shift.
#[must_use]
pub fn period_index(
    start: Timestamp,
    end: Timestamp,
    resolution: Resolution,
    tz: Option<&Tz>,
) -> Vec<Timestamp> {
    let origin = tz.map_or(start, |tz| start.with_timezone(tz));
    let mut index: Vec<Timestamp> = (0..)
        .map_while(|n| resolution.advance(origin, n))
        .take_while(|t| *t < end)
        .collect();

    match tz {
        Some(_) if resolution == Resolution::Week1 => {
            let offsets: HashSet<i32> = index
                .iter()
                .map(|t| t.offset().fix().local_minus_utc())
                .collect();
            if offsets.len() > 1 {
                index.pop();
            }
        }
        None if resolution.is_daily_or_coarser() && end.hour() == start.hour() + 1 => {
            index.pop();
        }
        _ => {}
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::{Europe::Brussels, UTC};
    use entsoe_types::Row;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        UTC.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_sorts_converts_and_truncates() {
        let frame = Frame::from_rows(vec![
            Row::new(utc(2023, 1, 1, 2)).with("v", 3.0),
            Row::new(utc(2023, 1, 1, 0)).with("v", 1.0),
            Row::new(utc(2023, 1, 1, 1)).with("v", 2.0),
        ]);
        let start = Brussels.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap();
        let end = Brussels.with_ymd_and_hms(2023, 1, 1, 2, 0, 0).unwrap();

        let out = normalize(frame, &Brussels, start, end, true).unwrap();
        assert_eq!(out.timestamps(), vec![start, end]);
        assert_eq!(out.rows()[0].timestamp.timezone(), Brussels);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let frame = Frame::from_series("v", (0..5).map(|h| (utc(2023, 1, 1, h), 1.0)));
        let (start, end) = (utc(2023, 1, 1, 1), utc(2023, 1, 1, 3));

        let once = normalize(frame, &Brussels, start, end, true).unwrap();
        let twice = normalize(once.clone(), &Brussels, start, end, true).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_normalize_empty_is_no_data() {
        let frame = Frame::from_series("v", [(utc(2023, 1, 1, 0), 1.0)]);
        let result = normalize(frame, &UTC, utc(2024, 1, 1, 0), utc(2024, 1, 2, 0), true);
        assert!(matches!(result, Err(EntsoeError::NoData)));
    }

    #[test]
    fn test_period_index_hourly() {
        let index = period_index(utc(2023, 1, 1, 0), utc(2023, 1, 2, 0), Resolution::Hour1, None);
        assert_eq!(index.len(), 24);
        assert_eq!(index[23], utc(2023, 1, 1, 23));
    }

    #[test]
    fn test_period_index_weekly_across_dst() {
        // Weekly points from winter into summer time (2023-03-26 in Brussels).
        let start = utc(2023, 3, 5, 23);
        let end = utc(2023, 4, 2, 22);
        let index = period_index(start, end, Resolution::Week1, Some(&Brussels));
        assert_eq!(index.len(), 3);

        let winter_only = period_index(start, utc(2023, 3, 26, 0), Resolution::Week1, Some(&Brussels));
        assert_eq!(winter_only.len(), 3);
    }

    #[test]
    fn test_period_index_daily_without_zone() {
        // Autumn DST end: local midnights 22:00 -> 23:00 UTC.
        let index = period_index(utc(2023, 10, 27, 22), utc(2023, 10, 30, 23), Resolution::Day1, None);
        assert_eq!(index.len(), 3);
        assert_eq!(index[2], utc(2023, 10, 29, 22));
    }
}
