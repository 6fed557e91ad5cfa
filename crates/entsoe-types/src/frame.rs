//! Tabular time series returned by every query.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::Timestamp;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric measurement (price, quantity, capacity).
    Number(f64),
    /// Free text or code.
    Text(String),
    /// Instant carried as data rather than as the row index.
    Time(DateTime<Utc>),
}

impl Value {
    /// Returns the numeric value, if any.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

/// One timestamped row. Missing columns are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Row index.
    pub timestamp: Timestamp,
    /// Column values keyed by column name.
    pub values: BTreeMap<String, Value>,
}

impl Row {
    /// Creates an empty row at the given instant.
    #[must_use]
    pub const fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Adds a column value, builder-style.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Returns a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Returns a numeric column value.
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }
}

/// An ordered collection of rows, possibly with duplicate timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frame {
    rows: Vec<Row>,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Creates a frame from rows, keeping their order.
    #[must_use]
    pub const fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Creates a one-column frame from `(timestamp, value)` points.
    #[must_use]
    pub fn from_series(
        column: &str,
        points: impl IntoIterator<Item = (Timestamp, f64)>,
    ) -> Self {
        points
            .into_iter()
            .map(|(timestamp, value)| Row::new(timestamp).with(column, value))
            .collect()
    }

    /// Appends a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Appends all rows of another frame.
    pub fn append(&mut self, other: Self) {
        self.rows.extend(other.rows);
    }

    /// Concatenates frames in order.
    #[must_use]
    pub fn concat(frames: impl IntoIterator<Item = Self>) -> Self {
        let mut out = Self::new();
        for frame in frames {
            out.append(frame);
        }
        out
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the frame, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Iterates over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the row timestamps in order.
    #[must_use]
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.rows.iter().map(|row| row.timestamp).collect()
    }

    /// Returns column names in first-seen order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for key in self.rows.iter().flat_map(|row| row.values.keys()) {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
        columns
    }

    /// Returns the numeric points of a column, skipping rows without it.
    #[must_use]
    pub fn numbers(&self, column: &str) -> Vec<(Timestamp, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.number(column).map(|v| (row.timestamp, v)))
            .collect()
    }

    /// Sorts rows by timestamp, keeping the relative order of equal timestamps.
    pub fn sort_by_timestamp(&mut self) {
        self.rows.sort_by_key(|row| row.timestamp);
    }

    /// Keeps only the rows matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&Row) -> bool) {
        self.rows.retain(f);
    }

    /// Re-expresses every timestamp in another zone.
    #[must_use]
    pub fn with_timezone(mut self, tz: &Tz) -> Self {
        for row in &mut self.rows {
            row.timestamp = row.timestamp.with_timezone(tz);
        }
        self
    }

    /// Returns true if any instant appears in more than one row.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows
            .iter()
            .any(|row| !seen.insert(row.timestamp.timestamp_micros()))
    }

    /// Renames a column in every row.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        for row in &mut self.rows {
            if let Some(value) = row.values.remove(from) {
                row.values.insert(to.to_string(), value);
            }
        }
    }
}

impl FromIterator<Row> for Frame {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Frame {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
