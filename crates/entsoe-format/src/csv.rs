//! CSV output format.

use entsoe_types::Frame;
use std::io::Write;

use crate::{FormatError, Formatter};

/// CSV formatter.
///
/// The header is the union of all columns; cells of absent columns are empty.
#[derive(Debug, Clone, Default)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: char,
    /// Whether to include header row.
    include_header: bool,
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: '\t',
            include_header: true,
        }
    }

    fn field(&self, text: &str) -> String {
        if text.contains([self.delimiter, '"', '\n', '\r']) {
            format!("\"{}\"", text.replace('"', "\"\""))
        } else {
            text.to_string()
        }
    }
}

impl Formatter for CsvFormatter {
    fn write_frame<W: Write + Send>(&self, frame: &Frame, mut writer: W) -> Result<(), FormatError> {
        let d = self.delimiter.to_string();
        let columns = frame.columns();

        if self.include_header {
            let header: Vec<_> = std::iter::once("timestamp".to_string())
                .chain(columns.iter().map(|c| self.field(c)))
                .collect();
            writeln!(writer, "{}", header.join(&d))?;
        }

        for row in frame {
            let mut fields = Vec::with_capacity(columns.len() + 1);
            fields.push(row.timestamp.to_rfc3339());
            for column in &columns {
                let cell = row.get(column).map(ToString::to_string).unwrap_or_default();
                fields.push(self.field(&cell));
            }
            writeln!(writer, "{}", fields.join(&d))?;
        }

        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == '\t' { "tsv" } else { "csv" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;
    use entsoe_types::Row;
    use std::io::Cursor;

    fn create_test_frame() -> Frame {
        let t = Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        Frame::from_rows(vec![
            Row::new(t).with("price", 102.5),
            Row::new(t + chrono::Duration::hours(1))
                .with("price", 101.0)
                .with("note", "late, revised"),
        ])
    }

    fn render(formatter: &CsvFormatter) -> String {
        let mut output = Cursor::new(Vec::new());
        formatter
            .write_frame(&create_test_frame(), &mut output)
            .unwrap();
        String::from_utf8(output.into_inner()).unwrap()
    }

    #[test]
    fn test_csv_frame() {
        let result = render(&CsvFormatter::new());
        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines[0], "timestamp,price,note");
        assert_eq!(lines[1], "2023-01-01T00:00:00+01:00,102.5,");
        assert_eq!(lines[2], "2023-01-01T01:00:00+01:00,101,\"late, revised\"");
    }

    #[test]
    fn test_csv_no_header() {
        let result = render(&CsvFormatter::new().with_header(false));
        assert!(!result.contains("timestamp"));
        assert_eq!(result.lines().count(), 2);
    }

    #[test]
    fn test_tsv() {
        let formatter = CsvFormatter::tsv();
        let result = render(&formatter);
        assert!(result.starts_with("timestamp\tprice\tnote"));
        assert!(result.contains("101\tlate, revised\n"));
        assert_eq!(formatter.extension(), "tsv");
    }
}
