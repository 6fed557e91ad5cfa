//! Catalogue of high-level endpoints and their stitching policies.

use std::str::FromStr;

use entsoe_stitch::{DuplicatePolicy, EndpointPolicy, OffsetPaging};

/// A high-level query offered by [`EntsoeClient`](crate::EntsoeClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Day-ahead prices.
    DayAheadPrices,
    /// Actual total load.
    Load,
    /// Day-ahead total load forecast.
    LoadForecast,
    /// Aggregated generation forecast.
    GenerationForecast,
    /// Wind and solar generation forecast.
    WindAndSolarForecast,
    /// Actual generation per production type.
    Generation,
    /// Installed generation capacity per production type.
    InstalledGenerationCapacity,
    /// Physical cross-border flows.
    CrossborderFlows,
    /// Scheduled commercial exchanges.
    ScheduledExchanges,
    /// Forecasted net transfer capacity.
    NetTransferCapacity,
    /// Intraday offered transfer capacity.
    IntradayOfferedCapacity,
    /// Imbalance prices.
    ImbalancePrices,
    /// Imbalance volumes.
    ImbalanceVolumes,
    /// Prices of procured balancing reserves.
    ContractedReservePrices,
    /// Amounts of contracted balancing reserves.
    ContractedReserveAmount,
    /// Filling rate of water reservoirs and hydro storage.
    AggregateWaterReservoirs,
    /// Unavailability of generation units.
    GenerationUnavailability,
    /// Unavailability of production units.
    ProductionUnavailability,
    /// Unavailability of transmission infrastructure.
    TransmissionUnavailability,
    /// Withdrawn unavailability notices of generation units.
    WithdrawnGenerationUnavailability,
    /// Physical imports from every neighbour.
    Import,
    /// Generation per production type alongside imports.
    GenerationImport,
}

impl Endpoint {
    /// Returns the endpoint as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DayAheadPrices => "day-ahead-prices",
            Self::Load => "load",
            Self::LoadForecast => "load-forecast",
            Self::GenerationForecast => "generation-forecast",
            Self::WindAndSolarForecast => "wind-and-solar-forecast",
            Self::Generation => "generation",
            Self::InstalledGenerationCapacity => "installed-generation-capacity",
            Self::CrossborderFlows => "crossborder-flows",
            Self::ScheduledExchanges => "scheduled-exchanges",
            Self::NetTransferCapacity => "net-transfer-capacity",
            Self::IntradayOfferedCapacity => "intraday-offered-capacity",
            Self::ImbalancePrices => "imbalance-prices",
            Self::ImbalanceVolumes => "imbalance-volumes",
            Self::ContractedReservePrices => "contracted-reserve-prices",
            Self::ContractedReserveAmount => "contracted-reserve-amount",
            Self::AggregateWaterReservoirs => "aggregate-water-reservoirs",
            Self::GenerationUnavailability => "generation-unavailability",
            Self::ProductionUnavailability => "production-unavailability",
            Self::TransmissionUnavailability => "transmission-unavailability",
            Self::WithdrawnGenerationUnavailability => "withdrawn-generation-unavailability",
            Self::Import => "import",
            Self::GenerationImport => "generation-import",
        }
    }

    /// Returns true if the endpoint is queried between two areas.
    #[must_use]
    pub const fn is_crossborder(&self) -> bool {
        matches!(
            self,
            Self::CrossborderFlows
                | Self::ScheduledExchanges
                | Self::NetTransferCapacity
                | Self::IntradayOfferedCapacity
                | Self::TransmissionUnavailability
        )
    }

    /// Returns the stitching policy of the endpoint.
    #[must_use]
    pub const fn policy(&self) -> EndpointPolicy {
        match self {
            Self::InstalledGenerationCapacity => {
                EndpointPolicy::yearly().with_merge(DuplicatePolicy::KeepLast)
            }
            Self::IntradayOfferedCapacity => EndpointPolicy::daily(),
            Self::ContractedReservePrices => EndpointPolicy::yearly()
                .with_bisect()
                .with_offset(OffsetPaging::new(100, DuplicatePolicy::Median)),
            Self::ContractedReserveAmount => EndpointPolicy::yearly()
                .with_bisect()
                .with_offset(OffsetPaging::new(100, DuplicatePolicy::ForwardFillKeepLast)),
            Self::GenerationUnavailability
            | Self::ProductionUnavailability
            | Self::TransmissionUnavailability
            | Self::WithdrawnGenerationUnavailability => EndpointPolicy::yearly()
                .with_bisect()
                .with_offset(OffsetPaging::new(200, DuplicatePolicy::KeepAll))
                .with_merge(DuplicatePolicy::KeepAll)
                .untruncated(),
            _ => EndpointPolicy::yearly(),
        }
    }

    /// Returns all endpoints.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::DayAheadPrices,
            Self::Load,
            Self::LoadForecast,
            Self::GenerationForecast,
            Self::WindAndSolarForecast,
            Self::Generation,
            Self::InstalledGenerationCapacity,
            Self::CrossborderFlows,
            Self::ScheduledExchanges,
            Self::NetTransferCapacity,
            Self::IntradayOfferedCapacity,
            Self::ImbalancePrices,
            Self::ImbalanceVolumes,
            Self::ContractedReservePrices,
            Self::ContractedReserveAmount,
            Self::AggregateWaterReservoirs,
            Self::GenerationUnavailability,
            Self::ProductionUnavailability,
            Self::TransmissionUnavailability,
            Self::WithdrawnGenerationUnavailability,
            Self::Import,
            Self::GenerationImport,
        ]
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "prices" | "da-prices" => Ok(Self::DayAheadPrices),
            "flows" => Ok(Self::CrossborderFlows),
            "exchanges" => Ok(Self::ScheduledExchanges),
            "ntc" => Ok(Self::NetTransferCapacity),
            "installed-capacity" => Ok(Self::InstalledGenerationCapacity),
            "reservoirs" => Ok(Self::AggregateWaterReservoirs),
            other => Self::all()
                .iter()
                .copied()
                .find(|endpoint| endpoint.as_str() == other)
                .ok_or_else(|| EndpointParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid endpoint name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParseError(String);

impl std::fmt::Display for EndpointParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown endpoint '{}'", self.0)
    }
}

impl std::error::Error for EndpointParseError {}
