//! Duplicate-timestamp merge policies.

use std::collections::BTreeMap;

use entsoe_types::{Frame, Row, Timestamp, Value};

/// How rows sharing a timestamp are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// Keep every row; corrections and re-publications are data.
    KeepAll,
    /// Keep the first row in arrival order.
    #[default]
    KeepFirst,
    /// Keep the last row in arrival order.
    KeepLast,
    /// Forward-fill missing columns across the group, then keep the last row.
    ForwardFillKeepLast,
    /// Take the median of numeric columns; other columns keep their last value.
    Median,
}

impl DuplicatePolicy {
    /// Returns the policy as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeepAll => "keep-all",
            Self::KeepFirst => "keep-first",
            Self::KeepLast => "keep-last",
            Self::ForwardFillKeepLast => "ffill-keep-last",
            Self::Median => "median",
        }
    }

    /// Sorts the frame by timestamp (stable) and merges duplicate timestamps.
    #[must_use]
    pub fn apply(self, mut frame: Frame) -> Frame {
        frame.sort_by_timestamp();
        match self {
            Self::KeepAll => frame,
            Self::KeepFirst => merge_groups(frame, |mut group| group.swap_remove(0)),
            Self::KeepLast => merge_groups(frame, |mut group| {
                let last = group.len() - 1;
                group.swap_remove(last)
            }),
            Self::ForwardFillKeepLast => merge_groups(frame, forward_fill_last),
            Self::Median => median(frame).0,
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Splits a sorted frame into runs of equal timestamps.
fn groups(frame: Frame) -> Vec<Vec<Row>> {
    let mut groups: Vec<Vec<Row>> = Vec::new();
    for row in frame {
        match groups.last_mut() {
            Some(group) if group[0].timestamp == row.timestamp => group.push(row),
            _ => groups.push(vec![row]),
        }
    }
    groups
}

fn merge_groups(frame: Frame, merge: impl Fn(Vec<Row>) -> Row) -> Frame {
    groups(frame).into_iter().map(merge).collect()
}

fn forward_fill_last(group: Vec<Row>) -> Row {
    let timestamp = group[0].timestamp;
    let mut values = BTreeMap::new();
    for row in group {
        values.extend(row.values);
    }
    Row { timestamp, values }
}

/// Median merge; also returns the timestamps whose group held diverging values.
pub(crate) fn median(frame: Frame) -> (Frame, Vec<Timestamp>) {
    let mut divergent = Vec::new();
    let mut merged = Frame::new();

    for group in groups(frame) {
        let timestamp = group[0].timestamp;
        let mut numbers: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut last: BTreeMap<String, Value> = BTreeMap::new();

        for row in &group {
            for (column, value) in &row.values {
                match value.as_f64() {
                    Some(n) if !n.is_nan() => numbers.entry(column.clone()).or_default().push(n),
                    _ => {
                        last.insert(column.clone(), value.clone());
                    }
                }
            }
        }

        let mut diverged = false;
        for (column, mut values) in numbers {
            values.sort_by(f64::total_cmp);
            if values.first() != values.last() {
                diverged = true;
            }
            last.insert(column, Value::Number(middle(&values)));
        }

        if diverged {
            tracing::warn!(
                %timestamp,
                rows = group.len(),
                "duplicate rows disagree, keeping the median"
            );
            divergent.push(timestamp);
        }
        merged.push(Row {
            timestamp,
            values: last,
        });
    }

    (merged, divergent)
}

fn middle(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn ts(hour: u32) -> Timestamp {
        UTC.with_ymd_and_hms(2023, 1, 1, hour, 0, 0).unwrap()
    }

    fn frame(rows: &[(u32, f64)]) -> Frame {
        Frame::from_series("v", rows.iter().map(|(h, v)| (ts(*h), *v)))
    }

    #[test]
    fn test_keep_all_preserves_corrections() {
        let merged = DuplicatePolicy::KeepAll.apply(frame(&[(1, 1.0), (0, 5.0), (1, 2.0)]));
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.numbers("v"), vec![(ts(0), 5.0), (ts(1), 1.0), (ts(1), 2.0)]);
    }

    #[test]
    fn test_keep_first_and_last() {
        let input = frame(&[(0, 1.0), (1, 2.0), (1, 3.0), (2, 4.0)]);
        assert_eq!(
            DuplicatePolicy::KeepFirst.apply(input.clone()).numbers("v"),
            vec![(ts(0), 1.0), (ts(1), 2.0), (ts(2), 4.0)]
        );
        assert_eq!(
            DuplicatePolicy::KeepLast.apply(input).numbers("v"),
            vec![(ts(0), 1.0), (ts(1), 3.0), (ts(2), 4.0)]
        );
    }

    #[test]
    fn test_forward_fill_keep_last() {
        let input = Frame::from_rows(vec![
            Row::new(ts(0)).with("a", 1.0).with("b", 10.0),
            Row::new(ts(0)).with("a", 2.0),
        ]);
        let merged = DuplicatePolicy::ForwardFillKeepLast.apply(input);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0].number("a"), Some(2.0));
        assert_eq!(merged.rows()[0].number("b"), Some(10.0));
    }

    /// Shared buffer the test subscriber writes log lines into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_median_warns_on_divergence() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        let input = frame(&[(0, 10.0), (0, 10.0), (0, 20.0), (1, 7.0), (1, 7.0)]);
        let (merged, divergent) =
            tracing::subscriber::with_default(subscriber, || median(input));

        assert_eq!(merged.len(), 2);
        assert_relative_eq!(merged.rows()[0].number("v").unwrap(), 10.0);
        assert_relative_eq!(merged.rows()[1].number("v").unwrap(), 7.0);
        assert_eq!(divergent, vec![ts(0)]);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.lines().count(), 1);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("duplicate rows disagree, keeping the median"));
        assert!(logs.contains("rows=3"));
    }

    #[test]
    fn test_median_even_group_and_text() {
        let input = Frame::from_rows(vec![
            Row::new(ts(0)).with("v", 1.0).with("unit", "MW"),
            Row::new(ts(0)).with("v", 4.0).with("unit", "MAW"),
        ]);
        let merged = DuplicatePolicy::Median.apply(input);
        assert_relative_eq!(merged.rows()[0].number("v").unwrap(), 2.5);
        assert_eq!(
            merged.rows()[0].get("unit").and_then(Value::as_str),
            Some("MAW")
        );
    }
}
