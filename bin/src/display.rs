//! Display utilities and output formatting for the entsoe CLI.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use clap::ValueEnum;
use entsoe_lib::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output format for query results.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Tsv,
    Json,
    Ndjson,
}

impl Format {
    const fn output_format(self) -> OutputFormat {
        match self {
            Self::Csv => OutputFormat::Csv,
            Self::Tsv => OutputFormat::Tsv,
            Self::Json => OutputFormat::Json,
            Self::Ndjson => OutputFormat::Ndjson,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output_format().extension())
    }
}

/// Opens the output file, or stdout when no path is given.
pub(crate) fn open_output(output: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    Ok(match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout()),
    })
}

/// Write a frame in the specified format.
pub(crate) fn write_frame(frame: &Frame, output: Option<&Path>, format: Format) -> Result<()> {
    let mut writer = open_output(output)?;

    match format {
        Format::Csv => CsvFormatter::new().write_frame(frame, &mut writer)?,
        Format::Tsv => CsvFormatter::tsv().write_frame(frame, &mut writer)?,
        Format::Json => JsonFormatter::new().write_frame(frame, &mut writer)?,
        Format::Ndjson => JsonFormatter::ndjson().write_frame(frame, &mut writer)?,
    }

    writer.flush()?;
    Ok(())
}

/// Parse a date, local date-time or RFC 3339 instant; local values are read in `tz`.
pub(crate) fn parse_time(s: &str, tz: &Tz) -> Result<Timestamp> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(tz));
    }

    let local = if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
    } else {
        ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    };

    let Some(local) = local else {
        bail!("Invalid time: {s}. Expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339");
    };
    tz.from_local_datetime(&local)
        .earliest()
        .with_context(|| format!("{s} does not exist in {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Brussels;

    #[test]
    fn test_parse_time() {
        let midnight = Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_time("2023-01-01", &Brussels).unwrap(), midnight);
        assert_eq!(parse_time("2022-12-31T23:00:00Z", &Brussels).unwrap(), midnight);
        assert_eq!(
            parse_time("2023-01-01T06:30", &Brussels).unwrap(),
            Brussels.with_ymd_and_hms(2023, 1, 1, 6, 30, 0).unwrap()
        );
        assert!(parse_time("yesterday", &Brussels).is_err());
        assert!(parse_time("2023-03-26T02:30", &Brussels).is_err());
    }
}
