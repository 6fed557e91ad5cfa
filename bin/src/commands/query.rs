//! Query command implementation.
//!
//! This module resolves the endpoint arguments, runs the stitched query and writes
//! the resulting frame.

use crate::display::{Format, parse_time, write_frame};
use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use entsoe_lib::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Forecast horizon of net transfer capacity.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum HorizonArg {
    DayAhead,
    WeekAhead,
    MonthAhead,
    YearAhead,
}

impl From<HorizonArg> for Horizon {
    fn from(value: HorizonArg) -> Self {
        match value {
            HorizonArg::DayAhead => Self::DayAhead,
            HorizonArg::WeekAhead => Self::WeekAhead,
            HorizonArg::MonthAhead => Self::MonthAhead,
            HorizonArg::YearAhead => Self::YearAhead,
        }
    }
}

/// Arguments of the query command.
#[derive(Args)]
pub(crate) struct QueryArgs {
    /// Endpoint (e.g., day-ahead-prices, load, crossborder-flows)
    endpoint: Endpoint,

    /// Area alias (e.g., BE, DE_LU) or EIC code; the origin for crossborder endpoints
    #[arg(short, long)]
    area: String,

    /// Destination area for crossborder endpoints
    #[arg(long)]
    to: Option<String>,

    /// Start (YYYY-MM-DD, YYYY-MM-DDTHH:MM in the area's zone, or RFC 3339)
    #[arg(short, long)]
    start: String,

    /// End, exclusive (same formats as --start)
    #[arg(short, long)]
    end: String,

    /// Production type code or label (e.g., B16, Solar)
    #[arg(long)]
    psr_type: Option<String>,

    /// Document status filter for unavailability endpoints (e.g., A05)
    #[arg(long)]
    doc_status: Option<String>,

    /// Market agreement type for reserve endpoints
    #[arg(long, default_value = "A01")]
    market_agreement: String,

    /// Process type for reserve endpoints
    #[arg(long, default_value = "A51")]
    process_type: String,

    /// Net transfer capacity horizon
    #[arg(long, value_enum, default_value = "day-ahead")]
    horizon: HorizonArg,

    /// Day-ahead scheduled exchanges instead of total
    #[arg(long)]
    day_ahead: bool,

    /// Explicit instead of implicit intraday allocation
    #[arg(long)]
    explicit: bool,

    /// Output file path. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: Format,
}

/// Run a query and write its frame.
pub(crate) async fn query(args: QueryArgs, quiet: bool) -> Result<()> {
    let area = AreaRegistry::global().lookup(&args.area)?;
    let tz = area.tz();
    let start = parse_time(&args.start, &tz)?;
    let end = parse_time(&args.end, &tz)?;

    if matches!(
        args.endpoint,
        Endpoint::ContractedReservePrices | Endpoint::ContractedReserveAmount
    ) {
        check_code(
            "market agreement",
            &args.market_agreement,
            entsoe_lib::market_agreement_type,
        )?;
        check_code("process type", &args.process_type, entsoe_lib::process_type)?;
    }
    if let Some(status) = &args.doc_status {
        check_code("document status", status, entsoe_lib::doc_status)?;
    }

    let client = EntsoeClient::new(ClientConfig::default())
        .context("Cannot create client (is ENTSOE_API_KEY set?)")?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.set_message(format!("{} {} {} -> {}", args.endpoint, area.key(), start, end));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let result = run(&client, &args, start, end).await;
    progress.finish_and_clear();

    let frame = match result {
        Err(EntsoeError::NoData) => {
            tracing::warn!(endpoint = %args.endpoint, area = area.key(), "no data");
            Frame::new()
        }
        other => other?,
    };

    tracing::info!(rows = frame.len(), endpoint = %args.endpoint, "query complete");
    write_frame(&frame, args.output.as_deref(), args.format)
}

async fn run(
    client: &EntsoeClient,
    args: &QueryArgs,
    start: Timestamp,
    end: Timestamp,
) -> entsoe_lib::Result<Frame> {
    let area = args.area.as_str();
    let psr = args.psr_type.as_deref();
    let doc_status = args.doc_status.as_deref();

    if args.endpoint.is_crossborder() && args.to.is_none() {
        return Err(EntsoeError::InvalidBusinessParameter(format!(
            "{} requires --to",
            args.endpoint
        )));
    }
    let to = args.to.as_deref().unwrap_or_default();

    match args.endpoint {
        Endpoint::DayAheadPrices => client.query_day_ahead_prices(area, start, end).await,
        Endpoint::Load => client.query_load(area, start, end).await,
        Endpoint::LoadForecast => client.query_load_forecast(area, start, end).await,
        Endpoint::GenerationForecast => client.query_generation_forecast(area, start, end).await,
        Endpoint::WindAndSolarForecast => {
            client
                .query_wind_and_solar_forecast(area, start, end, psr)
                .await
        }
        Endpoint::Generation => client.query_generation(area, start, end, psr).await,
        Endpoint::InstalledGenerationCapacity => {
            client
                .query_installed_generation_capacity(area, start, end, psr)
                .await
        }
        Endpoint::CrossborderFlows => client.query_crossborder_flows(area, to, start, end).await,
        Endpoint::ScheduledExchanges => {
            client
                .query_scheduled_exchanges(area, to, start, end, args.day_ahead)
                .await
        }
        Endpoint::NetTransferCapacity => {
            client
                .query_net_transfer_capacity(area, to, start, end, args.horizon.into())
                .await
        }
        Endpoint::IntradayOfferedCapacity => {
            client
                .query_intraday_offered_capacity(area, to, start, end, !args.explicit)
                .await
        }
        Endpoint::ImbalancePrices => client.query_imbalance_prices(area, start, end, psr).await,
        Endpoint::ImbalanceVolumes => client.query_imbalance_volumes(area, start, end, psr).await,
        Endpoint::ContractedReservePrices => {
            client
                .query_contracted_reserve_prices(
                    area,
                    start,
                    end,
                    &args.market_agreement,
                    &args.process_type,
                    psr,
                )
                .await
        }
        Endpoint::ContractedReserveAmount => {
            client
                .query_contracted_reserve_amount(
                    area,
                    start,
                    end,
                    &args.market_agreement,
                    &args.process_type,
                    psr,
                )
                .await
        }
        Endpoint::AggregateWaterReservoirs => {
            client
                .query_aggregate_water_reservoirs(area, start, end)
                .await
        }
        Endpoint::GenerationUnavailability => {
            client
                .query_unavailability_of_generation_units(area, start, end, doc_status)
                .await
        }
        Endpoint::ProductionUnavailability => {
            client
                .query_unavailability_of_production_units(area, start, end, doc_status)
                .await
        }
        Endpoint::TransmissionUnavailability => {
            client
                .query_unavailability_transmission(area, to, start, end, doc_status)
                .await
        }
        Endpoint::WithdrawnGenerationUnavailability => {
            client
                .query_withdrawn_unavailability_of_generation_units(area, start, end)
                .await
        }
        Endpoint::Import => client.query_import(area, start, end).await,
        Endpoint::GenerationImport => client.query_generation_import(area, start, end).await,
    }
}

/// Ensures a code is known before sending it.
fn check_code(kind: &str, code: &str, table: fn(&str) -> Option<&'static str>) -> Result<()> {
    if table(code).is_none() {
        bail!("Unknown {kind} code: {code}");
    }
    Ok(())
}
