//! High-level client returning stitched, normalized frames.

use std::collections::BTreeMap;

use chrono_tz::Tz;

use entsoe_areas::{AreaRegistry, CodeTables};
use entsoe_fetch::{ClientConfig, Horizon, Outage, Payload, Query, RawClient, endpoints};
use entsoe_stitch::{PaginationLimits, Pipeline};
use entsoe_types::{Area, EntsoeError, Frame, Interval, Result, Row, Timestamp};

use crate::{Endpoint, decode, source::EndpointSource};

/// Client for the transparency platform returning one [`Frame`] per query.
///
/// Areas are given by alias (`"BE"`, `"DE_LU"`) or EIC code. Long intervals are
/// split into provider-sized blocks, oversized requests are bisected and paged
/// endpoints are walked by offset; results are expressed in the area's zone.
///
/// # Example
///
/// ```no_run
/// use chrono::TimeZone;
/// use chrono_tz::Europe::Brussels;
/// use entsoe_client::EntsoeClient;
/// use entsoe_fetch::ClientConfig;
///
/// # async fn run() -> entsoe_types::Result<()> {
/// let client = EntsoeClient::new(ClientConfig::with_api_key("my-key"))?;
/// let start = Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let end = Brussels.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
/// let prices = client.query_day_ahead_prices("BE", start, end).await?;
/// println!("{} hourly prices", prices.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EntsoeClient {
    raw: RawClient,
    limits: PaginationLimits,
}

impl EntsoeClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_raw(RawClient::new(config)?))
    }

    /// Wraps an existing raw client.
    #[must_use]
    pub fn from_raw(raw: RawClient) -> Self {
        Self {
            raw,
            limits: PaginationLimits::default(),
        }
    }

    /// Overrides the bisection limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: PaginationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the underlying raw client.
    #[must_use]
    pub const fn raw(&self) -> &RawClient {
        &self.raw
    }

    async fn stitch<D>(&self, endpoint: Endpoint, query: Query, tz: Tz, decode: D) -> Result<Frame>
    where
        D: Fn(&Payload) -> Result<Frame> + Send + Sync,
    {
        let interval = *query.interval();
        tracing::debug!(%endpoint, %interval, "querying");
        let source = EndpointSource::new(&self.raw, query, decode);
        Pipeline::new(endpoint.policy())
            .with_limits(self.limits)
            .run(&source, interval, &tz)
            .await
    }

    /// Day-ahead prices, column `price`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_day_ahead_prices(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::day_ahead_prices(area, Interval::new(start, end)?);
        self.stitch(Endpoint::DayAheadPrices, query, area.tz(), decode::prices)
            .await
    }

    /// Actual total load, column `Actual Load`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_load(&self, area: &str, start: Timestamp, end: Timestamp) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::load(area, Interval::new(start, end)?);
        self.stitch(Endpoint::Load, query, area.tz(), |payload: &Payload| {
            decode::quantity(payload, "Actual Load")
        })
        .await
    }

    /// Day-ahead load forecast, column `Forecasted Load`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_load_forecast(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::load_forecast(area, Interval::new(start, end)?);
        self.stitch(Endpoint::LoadForecast, query, area.tz(), |payload: &Payload| {
            decode::quantity(payload, "Forecasted Load")
        })
        .await
    }

    /// Aggregated generation forecast, column `Generation Forecast`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_generation_forecast(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::generation_forecast(area, Interval::new(start, end)?);
        self.stitch(
            Endpoint::GenerationForecast,
            query,
            area.tz(),
            |payload: &Payload| decode::quantity(payload, "Generation Forecast"),
        )
        .await
    }

    /// Wind and solar forecast, one column per production type.
    ///
    /// `psr_type` accepts a code (`B16`) or label (`Solar`).
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::InvalidBusinessParameter`] for an unknown production
    /// type, or [`EntsoeError::NoData`] when nothing is published.
    pub async fn query_wind_and_solar_forecast(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query =
            endpoints::wind_and_solar_forecast(area, Interval::new(start, end)?, psr(psr_type)?);
        self.stitch(
            Endpoint::WindAndSolarForecast,
            query,
            area.tz(),
            decode::generation,
        )
        .await
    }

    /// Actual generation, one column per production type (net of consumption).
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::InvalidBusinessParameter`] for an unknown production
    /// type, or [`EntsoeError::NoData`] when nothing is published.
    pub async fn query_generation(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::generation(area, Interval::new(start, end)?, psr(psr_type)?);
        self.stitch(Endpoint::Generation, query, area.tz(), decode::generation)
            .await
    }

    /// Installed generation capacity, one column per production type.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::InvalidBusinessParameter`] for an unknown production
    /// type, or [`EntsoeError::NoData`] when nothing is published.
    pub async fn query_installed_generation_capacity(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::installed_generation_capacity(
            area,
            Interval::new(start, end)?,
            psr(psr_type)?,
        );
        self.stitch(
            Endpoint::InstalledGenerationCapacity,
            query,
            area.tz(),
            decode::generation,
        )
        .await
    }

    /// Physical flows from one area into another, column `flow`, in the zone of `from`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_crossborder_flows(
        &self,
        from: &str,
        to: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let (from, to) = (lookup(from)?, lookup(to)?);
        let query = endpoints::crossborder_flows(from, to, Interval::new(start, end)?);
        self.stitch(Endpoint::CrossborderFlows, query, from.tz(), |payload: &Payload| {
            decode::quantity(payload, "flow")
        })
        .await
    }

    /// Scheduled commercial exchanges, column `exchange`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_scheduled_exchanges(
        &self,
        from: &str,
        to: &str,
        start: Timestamp,
        end: Timestamp,
        day_ahead: bool,
    ) -> Result<Frame> {
        let (from, to) = (lookup(from)?, lookup(to)?);
        let query =
            endpoints::scheduled_exchanges(from, to, Interval::new(start, end)?, day_ahead);
        self.stitch(
            Endpoint::ScheduledExchanges,
            query,
            from.tz(),
            |payload: &Payload| decode::quantity(payload, "exchange"),
        )
        .await
    }

    /// Forecasted net transfer capacity, column `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_net_transfer_capacity(
        &self,
        from: &str,
        to: &str,
        start: Timestamp,
        end: Timestamp,
        horizon: Horizon,
    ) -> Result<Frame> {
        let (from, to) = (lookup(from)?, lookup(to)?);
        let query =
            endpoints::net_transfer_capacity(from, to, Interval::new(start, end)?, horizon);
        self.stitch(
            Endpoint::NetTransferCapacity,
            query,
            from.tz(),
            |payload: &Payload| decode::quantity(payload, "capacity"),
        )
        .await
    }

    /// Intraday offered capacity, column `capacity`, fetched one day at a time.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_intraday_offered_capacity(
        &self,
        from: &str,
        to: &str,
        start: Timestamp,
        end: Timestamp,
        implicit: bool,
    ) -> Result<Frame> {
        let (from, to) = (lookup(from)?, lookup(to)?);
        let query =
            endpoints::intraday_offered_capacity(from, to, Interval::new(start, end)?, implicit);
        self.stitch(
            Endpoint::IntradayOfferedCapacity,
            query,
            from.tz(),
            |payload: &Payload| decode::quantity(payload, "capacity"),
        )
        .await
    }

    /// Imbalance prices, columns `Long`, `Short` or `Price for Consumption`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_imbalance_prices(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::imbalance_prices(area, Interval::new(start, end)?, psr(psr_type)?);
        self.stitch(
            Endpoint::ImbalancePrices,
            query,
            area.tz(),
            decode::imbalance_prices,
        )
        .await
    }

    /// Imbalance volumes, column `Imbalance Volume`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_imbalance_volumes(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query =
            endpoints::imbalance_volumes(area, Interval::new(start, end)?, psr(psr_type)?);
        self.stitch(
            Endpoint::ImbalanceVolumes,
            query,
            area.tz(),
            |payload: &Payload| decode::quantity(payload, "Imbalance Volume"),
        )
        .await
    }

    /// Prices of procured reserves, one column per reserve type and direction.
    ///
    /// Pages by document offset; repeated values for one instant are reduced to
    /// their median.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_contracted_reserve_prices(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        type_market_agreement: &str,
        process_type: &str,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::contracted_reserve_prices(
            area,
            Interval::new(start, end)?,
            type_market_agreement,
            process_type,
            psr(psr_type)?,
        );
        let tz = area.tz();
        self.stitch(
            Endpoint::ContractedReservePrices,
            query,
            tz,
            move |payload: &Payload| {
                decode::contracted_reserve(payload, "procurement_Price.amount", &tz)
            },
        )
        .await
    }

    /// Amounts of contracted reserves, one column per reserve type and direction.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_contracted_reserve_amount(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        type_market_agreement: &str,
        process_type: &str,
        psr_type: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::contracted_reserve_amount(
            area,
            Interval::new(start, end)?,
            type_market_agreement,
            process_type,
            psr(psr_type)?,
        );
        let tz = area.tz();
        self.stitch(
            Endpoint::ContractedReserveAmount,
            query,
            tz,
            move |payload: &Payload| decode::contracted_reserve(payload, "quantity", &tz),
        )
        .await
    }

    /// Aggregate filling of water reservoirs, column `Stored Energy`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when nothing is published for the interval.
    pub async fn query_aggregate_water_reservoirs(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::aggregate_water_reservoirs(area, Interval::new(start, end)?);
        self.stitch(
            Endpoint::AggregateWaterReservoirs,
            query,
            area.tz(),
            |payload: &Payload| decode::quantity(payload, "Stored Energy"),
        )
        .await
    }

    /// Unavailability of generation units, one row per available period.
    ///
    /// Every notice is kept, including corrections of earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when no notice matches.
    pub async fn query_unavailability_of_generation_units(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        doc_status: Option<&str>,
    ) -> Result<Frame> {
        self.unit_unavailability(
            Endpoint::GenerationUnavailability,
            Outage::Generation,
            area,
            Interval::new(start, end)?,
            doc_status,
        )
        .await
    }

    /// Unavailability of production units, one row per available period.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when no notice matches.
    pub async fn query_unavailability_of_production_units(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
        doc_status: Option<&str>,
    ) -> Result<Frame> {
        self.unit_unavailability(
            Endpoint::ProductionUnavailability,
            Outage::Production,
            area,
            Interval::new(start, end)?,
            doc_status,
        )
        .await
    }

    /// Withdrawn unavailability notices of generation units.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when no notice matches.
    pub async fn query_withdrawn_unavailability_of_generation_units(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        self.unit_unavailability(
            Endpoint::WithdrawnGenerationUnavailability,
            Outage::Generation,
            area,
            Interval::new(start, end)?,
            Some(endpoints::WITHDRAWN),
        )
        .await
    }

    async fn unit_unavailability(
        &self,
        endpoint: Endpoint,
        outage: Outage,
        area: &str,
        interval: Interval,
        doc_status: Option<&str>,
    ) -> Result<Frame> {
        let area = lookup(area)?;
        let query = endpoints::unit_unavailability(area, interval, outage, doc_status);
        self.stitch(endpoint, query, area.tz(), move |payload: &Payload| {
            decode::unavailability(payload, outage)
        })
        .await
    }

    /// Unavailability of transmission infrastructure between two areas.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] when no notice matches.
    pub async fn query_unavailability_transmission(
        &self,
        from: &str,
        to: &str,
        start: Timestamp,
        end: Timestamp,
        doc_status: Option<&str>,
    ) -> Result<Frame> {
        let (from, to) = (lookup(from)?, lookup(to)?);
        let query =
            endpoints::transmission_unavailability(from, to, Interval::new(start, end)?, doc_status);
        self.stitch(
            Endpoint::TransmissionUnavailability,
            query,
            from.tz(),
            |payload: &Payload| decode::unavailability(payload, Outage::Transmission),
        )
        .await
    }

    /// Physical imports from every neighbour, one column per neighbour alias.
    ///
    /// Neighbours without published flows are left out.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] if no neighbour has data.
    pub async fn query_import(&self, area: &str, start: Timestamp, end: Timestamp) -> Result<Frame> {
        let area = lookup(area)?;
        let mut imports = Vec::new();

        for neighbour in AreaRegistry::global().neighbours(area) {
            match self
                .query_crossborder_flows(neighbour.key(), area.key(), start, end)
                .await
            {
                Ok(mut frame) => {
                    frame.rename_column("flow", neighbour.key());
                    imports.push(frame);
                }
                Err(EntsoeError::NoData) => {
                    tracing::debug!(from = neighbour.key(), to = area.key(), "no flows");
                }
                Err(e) => return Err(e),
            }
        }

        if imports.is_empty() {
            return Err(EntsoeError::NoData);
        }
        Ok(join(imports).with_timezone(&area.tz()))
    }

    /// Generation per production type alongside imports per neighbour.
    ///
    /// # Errors
    ///
    /// Returns the first error of either query.
    pub async fn query_generation_import(
        &self,
        area: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Frame> {
        let generation = self.query_generation(area, start, end, None).await?;
        let imports = self.query_import(area, start, end).await?;
        Ok(join([generation, imports]))
    }
}

fn lookup(alias_or_code: &str) -> Result<&'static Area> {
    AreaRegistry::global().lookup(alias_or_code)
}

fn psr(code_or_label: Option<&str>) -> Result<Option<&'static str>> {
    code_or_label
        .map(|value| {
            CodeTables::global().psr_code(value).ok_or_else(|| {
                EntsoeError::InvalidBusinessParameter(format!("unknown production type '{value}'"))
            })
        })
        .transpose()
}

/// Outer-joins frames on their timestamps; later frames win on shared columns.
fn join(frames: impl IntoIterator<Item = Frame>) -> Frame {
    let mut table: BTreeMap<Timestamp, Row> = BTreeMap::new();
    for row in frames.into_iter().flatten() {
        table
            .entry(row.timestamp)
            .or_insert_with(|| Row::new(row.timestamp))
            .values
            .extend(row.values);
    }
    table.into_values().collect()
}
