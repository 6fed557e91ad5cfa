//! Decoders from market documents to frames.
//!
//! Every decoder accepts a [`Payload`], which may hold one XML document or a
//! ZIP archive of them, and returns rows stamped in UTC unless stated otherwise.
//! Zone conversion and truncation happen later in the pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::{Tz, UTC};

use entsoe_areas::AreaRegistry;
use entsoe_fetch::{Outage, Payload, xml::Element};
use entsoe_stitch::period_index;
use entsoe_types::{EntsoeError, Frame, Resolution, Result, Row, Timestamp, Value};

/// Element present only on consumption series of a generation document.
const CONSUMPTION_ELEMENT: &str = "outBiddingZone_Domain.mRID";

/// Columns of generation and production unit unavailability, after the index.
pub const UNIT_UNAVAILABILITY_COLUMNS: &[&str] = &[
    "docstatus",
    "businesstype",
    "biddingzone_domain",
    "qty_uom",
    "curvetype",
    "production_resource_id",
    "production_resource_name",
    "production_resource_location",
    "plant_type",
    "nominal_power",
    "start",
    "end",
    "resolution",
    "pstn",
    "avail_qty",
];

/// Columns of transmission unavailability, after the index.
pub const TRANSMISSION_UNAVAILABILITY_COLUMNS: &[&str] = &[
    "docstatus",
    "businesstype",
    "in_domain",
    "out_domain",
    "qty_uom",
    "curvetype",
    "start",
    "end",
    "resolution",
    "pstn",
    "avail_qty",
];

type Table = BTreeMap<Timestamp, BTreeMap<String, Value>>;

fn decode_error(message: impl Into<String>) -> EntsoeError {
    EntsoeError::Decode(message.into())
}

/// Parses a provider timestamp (`2023-01-01T00:00Z` or RFC 3339).
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] if the text is not a timestamp.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%MZ").map(|t| t.and_utc()))
        .map_err(|e| decode_error(format!("invalid timestamp {text:?}: {e}")))
}

fn required<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element
        .find_text(name)
        .ok_or_else(|| decode_error(format!("missing <{name}> in <{}>", element.name())))
}

fn number(text: &str) -> Result<f64> {
    text.replace(',', "")
        .parse()
        .map_err(|_| decode_error(format!("invalid number {text:?}")))
}

fn documents(payload: &Payload) -> Result<Vec<Element>> {
    payload
        .documents()?
        .iter()
        .map(|document| Element::parse(document))
        .collect()
}

fn time_series(documents: &[Element]) -> impl Iterator<Item = &Element> {
    documents.iter().flat_map(|doc| doc.find_all("TimeSeries"))
}

fn to_frame(table: Table) -> Frame {
    table
        .into_iter()
        .map(|(timestamp, values)| Row { timestamp, values })
        .collect()
}

/// One `Period` of a time series.
struct Period<'a> {
    start: Timestamp,
    end: Timestamp,
    resolution: Resolution,
    points: Vec<(u32, &'a Element)>,
}

impl<'a> Period<'a> {
    fn parse(period: &'a Element) -> Result<Self> {
        let start = parse_instant(required(period, "start")?)?.with_timezone(&UTC);
        let end = parse_instant(required(period, "end")?)?.with_timezone(&UTC);
        let resolution = required(period, "resolution")?
            .parse::<Resolution>()
            .map_err(|e| decode_error(e.to_string()))?;

        let mut points = period
            .find_all("Point")
            .into_iter()
            .map(|point| {
                let position = required(point, "position")?
                    .parse::<u32>()
                    .map_err(|e| decode_error(format!("invalid position: {e}")))?;
                Ok((position, point))
            })
            .collect::<Result<Vec<_>>>()?;
        points.sort_by_key(|(position, _)| *position);

        Ok(Self {
            start,
            end,
            resolution,
            points,
        })
    }

    fn all(series: &'a Element) -> Result<Vec<Self>> {
        series.find_all("Period").into_iter().map(Self::parse).collect()
    }

    /// Instant of a 1-based position.
    fn timestamp(&self, position: u32) -> Result<Timestamp> {
        self.resolution
            .advance(self.start, position.saturating_sub(1))
            .ok_or_else(|| decode_error(format!("position {position} out of range")))
    }

    fn values(&self, label: &str) -> Result<Vec<(u32, f64)>> {
        self.points
            .iter()
            .map(|(position, point)| Ok((*position, number(required(point, label)?)?)))
            .collect()
    }
}

/// Returns the points of a time series.
///
/// Curve type `A03` omits positions whose value repeats the previous one; those
/// are forward-filled over the full period.
fn points(series: &Element, label: &str) -> Result<Vec<(Timestamp, f64)>> {
    let forward_fill = series.find_text("curveType") == Some("A03");
    let mut out = Vec::new();

    for period in Period::all(series)? {
        let values = period.values(label)?;
        if forward_fill {
            let by_position: BTreeMap<u32, f64> = values.into_iter().collect();
            let index = period_index(period.start, period.end, period.resolution, None);
            let mut last = None;
            for (position, timestamp) in (1..).zip(index) {
                last = by_position.get(&position).copied().or(last);
                if let Some(value) = last {
                    out.push((timestamp, value));
                }
            }
        } else {
            for (position, value) in values {
                out.push((period.timestamp(position)?, value));
            }
        }
    }
    Ok(out)
}

/// Decodes every time series into one column, in document order.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn series(payload: &Payload, label: &str, column: &str) -> Result<Frame> {
    let documents = documents(payload)?;
    let mut frame = Frame::new();
    for ts in time_series(&documents) {
        frame.append(Frame::from_series(column, points(ts, label)?));
    }
    frame.sort_by_timestamp();
    Ok(frame)
}

/// Day-ahead prices, column `price`.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn prices(payload: &Payload) -> Result<Frame> {
    series(payload, "price.amount", "price")
}

/// Quantities (load, flows, capacities), in one named column.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn quantity(payload: &Payload, column: &str) -> Result<Frame> {
    series(payload, "quantity", column)
}

/// Generation per production type, one column per type label.
///
/// Consumption series are negated, series sharing a name and an index are
/// summed into net generation, and remaining duplicates keep the first value.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn generation(payload: &Payload) -> Result<Frame> {
    let documents = documents(payload)?;
    let mut columns: Vec<(String, Vec<(Timestamp, f64)>)> = Vec::new();

    for ts in time_series(&documents) {
        let code = required(ts, "psrType")?;
        let name = entsoe_areas::psr_type(code).unwrap_or(code).to_string();
        let sign = if ts.find(CONSUMPTION_ELEMENT).is_some() {
            -1.0
        } else {
            1.0
        };
        let points: Vec<_> = points(ts, "quantity")?
            .into_iter()
            .map(|(t, v)| (t, sign * v))
            .collect();

        match columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) if same_index(existing, &points) => {
                for ((_, total), (_, value)) in existing.iter_mut().zip(&points) {
                    *total += value;
                }
            }
            Some((_, existing)) => existing.extend(points),
            None => columns.push((name, points)),
        }
    }

    let mut table = Table::new();
    for (name, mut points) in columns {
        points.sort_by_key(|(t, _)| *t);
        for (timestamp, value) in points {
            table
                .entry(timestamp)
                .or_default()
                .entry(name.clone())
                .or_insert(Value::Number(value));
        }
    }
    Ok(to_frame(table))
}

fn same_index(a: &[(Timestamp, f64)], b: &[(Timestamp, f64)]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|((x, _), (y, _))| x == y)
}

/// Imbalance prices, columns `Long`, `Short` and `Price for Consumption`.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn imbalance_prices(payload: &Payload) -> Result<Frame> {
    let documents = documents(payload)?;
    let mut table = Table::new();

    for ts in time_series(&documents) {
        for period in Period::all(ts)? {
            for (position, point) in &period.points {
                let amount = number(required(point, "imbalance_Price.amount")?)?;
                let column = match point.find_text("imbalance_Price.category") {
                    Some("A04") => "Long",
                    Some("A05") => "Short",
                    Some(other) => other,
                    None => "Price for Consumption",
                };
                table
                    .entry(period.timestamp(*position)?)
                    .or_default()
                    .insert(column.to_string(), Value::Number(amount));
            }
        }
    }
    Ok(to_frame(table))
}

/// Contracted reserve prices or amounts, one column per
/// `<reserve type> - <Up|Down|Symmetric>`, stamped in `tz`.
///
/// Columns that occur in several series are averaged.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents or unknown flow
/// directions.
pub fn contracted_reserve(payload: &Payload, label: &str, tz: &Tz) -> Result<Frame> {
    let documents = documents(payload)?;
    let mut sums: BTreeMap<Timestamp, BTreeMap<String, (f64, u32)>> = BTreeMap::new();

    for ts in time_series(&documents) {
        let business = required(ts, "businessType")?;
        let reserve = entsoe_areas::business_type(business).unwrap_or(business);
        let direction = match required(ts, "flowDirection.direction")? {
            "A01" => "Up",
            "A02" => "Down",
            "A03" => "Symmetric",
            other => return Err(decode_error(format!("unknown flow direction {other}"))),
        };
        let column = format!("{reserve} - {direction}");

        for period in Period::all(ts)? {
            let index = period_index(period.start, period.end, period.resolution, Some(tz));
            for (timestamp, (_, value)) in index.into_iter().zip(period.values(label)?) {
                let cell = sums
                    .entry(timestamp)
                    .or_default()
                    .entry(column.clone())
                    .or_insert((0.0, 0));
                cell.0 += value;
                cell.1 += 1;
            }
        }
    }

    Ok(sums
        .into_iter()
        .map(|(timestamp, cells)| Row {
            timestamp,
            values: cells
                .into_iter()
                .map(|(column, (sum, count))| (column, Value::Number(sum / f64::from(count))))
                .collect(),
        })
        .collect())
}

/// Unavailability notices, one row per available period, indexed by the
/// creation time of the notice.
///
/// # Errors
///
/// Returns [`EntsoeError::Decode`] on malformed documents.
pub fn unavailability(payload: &Payload, outage: Outage) -> Result<Frame> {
    let mut frame = Frame::new();

    for document in documents(payload)? {
        let created = parse_instant(required(&document, "createdDateTime")?)?.with_timezone(&UTC);
        let status = document
            .path_text("docStatus/value")
            .map(|code| entsoe_areas::doc_status(code).unwrap_or(code));

        for ts in document.find_all("TimeSeries") {
            let mut fields = Row::new(created);
            if let Some(status) = status {
                fields = fields.with("docstatus", status);
            }
            fields = fields
                .with("businesstype", label_of(ts, "businessType", entsoe_areas::business_type))
                .with("qty_uom", text_of(ts, "quantity_Measure_Unit.name"))
                .with("curvetype", text_of(ts, "curveType"));

            fields = match outage {
                Outage::Generation | Outage::Production => {
                    let fields = fields
                        .with("biddingzone_domain", area_of(ts, "biddingZone_Domain.mRID"))
                        .with(
                            "production_resource_id",
                            text_of(ts, "production_RegisteredResource.mRID"),
                        )
                        .with(
                            "production_resource_name",
                            text_of(ts, "production_RegisteredResource.name"),
                        )
                        .with(
                            "production_resource_location",
                            text_of(ts, "production_RegisteredResource.location.name"),
                        )
                        .with(
                            "plant_type",
                            label_of(
                                ts,
                                "production_RegisteredResource.pSRType.psrType",
                                entsoe_areas::psr_type,
                            ),
                        );
                    match ts
                        .find_text("production_RegisteredResource.pSRType.powerSystemResources.nominalP")
                        .filter(|text| !text.is_empty())
                    {
                        Some(text) => fields.with("nominal_power", number(text)?),
                        None => fields,
                    }
                }
                Outage::Transmission => fields
                    .with("in_domain", area_of(ts, "in_Domain.mRID"))
                    .with("out_domain", area_of(ts, "out_Domain.mRID")),
            };

            for period in ts.find_all("Available_Period") {
                let mut row = fields.clone();
                row.values.insert(
                    "start".to_string(),
                    Value::Time(parse_instant(required(period, "start")?)?),
                );
                row.values.insert(
                    "end".to_string(),
                    Value::Time(parse_instant(required(period, "end")?)?),
                );
                row.values
                    .insert("resolution".to_string(), text_of(period, "resolution").into());
                row.values
                    .insert("pstn".to_string(), text_of(period, "position").into());
                row.values.insert(
                    "avail_qty".to_string(),
                    Value::Number(number(required(period, "quantity")?)?),
                );
                frame.push(row);
            }
        }
    }

    frame.sort_by_timestamp();
    Ok(frame)
}

fn text_of(element: &Element, name: &str) -> String {
    element.find_text(name).unwrap_or_default().to_string()
}

fn label_of(element: &Element, name: &str, table: fn(&str) -> Option<&'static str>) -> String {
    let code = element.find_text(name).unwrap_or_default();
    table(code).unwrap_or(code).to_string()
}

fn area_of(element: &Element, name: &str) -> String {
    let code = element.find_text(name).unwrap_or_default();
    AreaRegistry::global()
        .by_code(code)
        .map_or(code, |area| area.key())
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;
    use std::io::Write;

    const PRICES: &str = include_str!("../tests/fixtures/prices.xml");
    const GENERATION: &str = include_str!("../tests/fixtures/generation.xml");
    const IMBALANCE: &str = include_str!("../tests/fixtures/imbalance_prices.xml");
    const RESERVE: &str = include_str!("../tests/fixtures/contracted_reserve.xml");
    const OUTAGE: &str = include_str!("../tests/fixtures/unavailability_generation.xml");

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        UTC.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    pub(crate) fn build_archive(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_instant() {
        assert_eq!(
            parse_instant("2023-01-01T00:00Z").unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2023-01-01T10:15:30Z").unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 10, 15, 30).unwrap()
        );
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_prices() {
        let frame = prices(&Payload::new(PRICES)).unwrap();
        assert_eq!(frame.len(), 24);
        assert_eq!(frame.timestamps()[0], utc(2022, 12, 31, 23, 0));
        assert_relative_eq!(frame.rows()[0].number("price").unwrap(), 102.5);
        assert_relative_eq!(frame.rows()[23].number("price").unwrap(), 124.0);
    }

    #[test]
    fn test_curve_a03_forward_fills() {
        let doc = r#"<Publication_MarketDocument><TimeSeries><curveType>A03</curveType>
            <Period><timeInterval><start>2023-01-01T00:00Z</start><end>2023-01-01T01:00Z</end></timeInterval>
            <resolution>PT15M</resolution>
            <Point><position>1</position><quantity>5</quantity></Point>
            <Point><position>3</position><quantity>7</quantity></Point>
            </Period></TimeSeries></Publication_MarketDocument>"#;
        let frame = quantity(&Payload::new(doc), "load").unwrap();
        assert_eq!(
            frame.numbers("load"),
            vec![
                (utc(2023, 1, 1, 0, 0), 5.0),
                (utc(2023, 1, 1, 0, 15), 5.0),
                (utc(2023, 1, 1, 0, 30), 7.0),
                (utc(2023, 1, 1, 0, 45), 7.0),
            ]
        );
    }

    #[test]
    fn test_generation_nets_consumption() {
        let frame = generation(&Payload::new(GENERATION)).unwrap();
        assert_eq!(frame.len(), 2);
        // Pumped storage: 300 generated, 120 consumed.
        assert_relative_eq!(
            frame.rows()[0].number("Hydro Pumped Storage").unwrap(),
            180.0
        );
        assert_relative_eq!(frame.rows()[1].number("Solar").unwrap(), 55.0);
    }

    #[test]
    fn test_imbalance_price_categories() {
        let frame = imbalance_prices(&Payload::new(IMBALANCE)).unwrap();
        assert_eq!(frame.len(), 2);
        let row = &frame.rows()[0];
        assert_relative_eq!(row.number("Long").unwrap(), 50.0);
        assert_relative_eq!(row.number("Short").unwrap(), 60.0);
        assert_relative_eq!(
            frame.rows()[1].number("Price for Consumption").unwrap(),
            70.0
        );
    }

    #[test]
    fn test_contracted_reserve_columns_are_averaged() {
        let frame =
            contracted_reserve(&Payload::new(RESERVE), "procurement_Price.amount", &Brussels)
                .unwrap();
        assert_eq!(frame.len(), 2);
        let first = &frame.rows()[0];
        assert_eq!(first.timestamp, utc(2022, 12, 31, 23, 0));
        assert_eq!(first.timestamp.timezone(), Brussels);
        assert_relative_eq!(
            first
                .number("Automatic frequency restoration reserve - Up")
                .unwrap(),
            15.0
        );
        assert_relative_eq!(
            first
                .number("Automatic frequency restoration reserve - Down")
                .unwrap(),
            3.0
        );
    }

    #[test]
    fn test_unavailability_from_archive() {
        let withdrawn = OUTAGE.replace("<value>A05</value>", "<value>A13</value>");
        let archive = build_archive(&[("first.xml", OUTAGE), ("second.xml", &withdrawn)]);
        let frame = unavailability(&Payload::new(archive), Outage::Generation).unwrap();

        assert_eq!(frame.len(), 4);
        let row = &frame.rows()[0];
        assert_eq!(row.timestamp, utc(2023, 1, 5, 9, 30));
        assert_eq!(row.get("docstatus").and_then(Value::as_str), Some("Active"));
        assert_eq!(
            row.get("businesstype").and_then(Value::as_str),
            Some("Unplanned outage")
        );
        assert_eq!(
            row.get("biddingzone_domain").and_then(Value::as_str),
            Some("BE")
        );
        assert_eq!(row.get("plant_type").and_then(Value::as_str), Some("Nuclear"));
        assert_eq!(row.number("nominal_power"), Some(1000.0));
        assert_eq!(row.number("avail_qty"), Some(0.0));
        assert_eq!(frame.rows()[1].number("avail_qty"), Some(500.0));

        let statuses: Vec<_> = frame
            .iter()
            .filter_map(|row| row.get("docstatus").and_then(Value::as_str))
            .collect();
        assert_eq!(statuses.iter().filter(|s| **s == "Withdrawn").count(), 2);
        for column in frame.columns() {
            assert!(UNIT_UNAVAILABILITY_COLUMNS.contains(&column.as_str()));
        }
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            prices(&Payload::new("<Publication_MarketDocument><TimeSeries><Period>")),
            Err(EntsoeError::Decode(_))
        ));
    }
}
