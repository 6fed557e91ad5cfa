//! Tab-separated tables as published by the file library.

use futures::StreamExt;
use serde::Serialize;

use crate::Result;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A decoded table: one header row and string records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl Table {
    /// Decodes UTF-8 tab-separated bytes, ignoring a leading byte order mark.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Tsv`](crate::FileError::Tsv) on malformed content.
    pub async fn from_tsv(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
        let mut reader = csv_async::AsyncReaderBuilder::new()
            .delimiter(b'\t')
            .create_reader(bytes);

        let headers = reader.headers().await?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        let mut stream = reader.records();
        while let Some(record) = stream.next().await {
            records.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, records })
    }

    /// Appends the records of another table; headers of `self` are kept.
    pub fn append(&mut self, other: Self) {
        if self.headers.is_empty() {
            self.headers = other.headers;
        }
        self.records.extend(other.records);
    }

    /// Returns the column names.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns the data rows.
    #[must_use]
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Returns the number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns one column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.records
                .iter()
                .map(|record| record.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }
}
