//! JSON output format.

use entsoe_types::{Frame, Row};
use serde_json::{Map, Value as Json};
use std::io::Write;

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// JSON formatter writing one flat object per row.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Output style.
    style: JsonStyle,
    /// Whether to pretty-print (only for array style).
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
            pretty: false,
        }
    }

    /// Sets whether to pretty-print output (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }
}

fn record(row: &Row) -> Result<Json, FormatError> {
    let mut object = Map::with_capacity(row.values.len() + 1);
    object.insert(
        "timestamp".to_string(),
        Json::String(row.timestamp.to_rfc3339()),
    );
    for (column, value) in &row.values {
        object.insert(column.clone(), serde_json::to_value(value)?);
    }
    Ok(Json::Object(object))
}

impl Formatter for JsonFormatter {
    fn write_frame<W: Write + Send>(&self, frame: &Frame, mut writer: W) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => {
                let records = frame.iter().map(record).collect::<Result<Vec<_>, _>>()?;
                if self.pretty {
                    serde_json::to_writer_pretty(&mut writer, &records)?;
                } else {
                    serde_json::to_writer(&mut writer, &records)?;
                }
                writeln!(writer)?;
            }
            JsonStyle::Ndjson => {
                for row in frame {
                    serde_json::to_writer(&mut writer, &record(row)?)?;
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}
