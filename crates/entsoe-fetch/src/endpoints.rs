//! Query builders for the documented endpoints, and their raw client wrappers.
//!
//! Builders only assemble codes; splitting, paging and decoding happen further up.

use entsoe_types::{Area, Interval, Result};

use crate::{Payload, Query, RawClient};

/// Forecast horizon of net transfer capacity publications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    /// Day-ahead forecast.
    DayAhead,
    /// Week-ahead forecast.
    WeekAhead,
    /// Month-ahead forecast.
    MonthAhead,
    /// Year-ahead forecast.
    YearAhead,
}

impl Horizon {
    /// Returns the market agreement type code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DayAhead => "A01",
            Self::WeekAhead => "A02",
            Self::MonthAhead => "A03",
            Self::YearAhead => "A04",
        }
    }
}

/// Kind of unavailability document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outage {
    /// Unavailability of generation units.
    Generation,
    /// Unavailability of production units.
    Production,
    /// Unavailability of transmission infrastructure.
    Transmission,
}

impl Outage {
    /// Returns the document type code.
    #[must_use]
    pub const fn document_type(&self) -> &'static str {
        match self {
            Self::Generation => "A80",
            Self::Production => "A77",
            Self::Transmission => "A78",
        }
    }
}

/// Day-ahead prices (A44).
#[must_use]
pub fn day_ahead_prices(area: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A44")
        .param("in_Domain", area.code())
        .param("out_Domain", area.code())
        .param("contract_MarketAgreement.type", "A01")
}

/// Actual total load (A65, realised).
#[must_use]
pub fn load(area: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A65")
        .param("processType", "A16")
        .param("outBiddingZone_Domain", area.code())
        .param("out_Domain", area.code())
}

/// Day-ahead total load forecast (A65, day ahead).
#[must_use]
pub fn load_forecast(area: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A65")
        .param("processType", "A01")
        .param("outBiddingZone_Domain", area.code())
}

/// Day-ahead aggregated generation forecast (A71).
#[must_use]
pub fn generation_forecast(area: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A71")
        .param("processType", "A01")
        .param("in_Domain", area.code())
}

/// Day-ahead wind and solar forecast (A69).
#[must_use]
pub fn wind_and_solar_forecast(area: &Area, interval: Interval, psr_type: Option<&str>) -> Query {
    Query::new(interval)
        .param("documentType", "A69")
        .param("processType", "A01")
        .param("in_Domain", area.code())
        .param_opt("psrType", psr_type)
}

/// Actual generation per production type (A75).
#[must_use]
pub fn generation(area: &Area, interval: Interval, psr_type: Option<&str>) -> Query {
    Query::new(interval)
        .param("documentType", "A75")
        .param("processType", "A16")
        .param("in_Domain", area.code())
        .param_opt("psrType", psr_type)
}

/// Installed generation capacity per production type (A68).
#[must_use]
pub fn installed_generation_capacity(
    area: &Area,
    interval: Interval,
    psr_type: Option<&str>,
) -> Query {
    Query::new(interval)
        .param("documentType", "A68")
        .param("processType", "A33")
        .param("in_Domain", area.code())
        .param_opt("psrType", psr_type)
}

/// Physical cross-border flows from one area to another (A11).
#[must_use]
pub fn crossborder_flows(from: &Area, to: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A11")
        .param("in_Domain", to.code())
        .param("out_Domain", from.code())
}

/// Scheduled commercial exchanges (A09), day-ahead or total.
#[must_use]
pub fn scheduled_exchanges(from: &Area, to: &Area, interval: Interval, day_ahead: bool) -> Query {
    Query::new(interval)
        .param("documentType", "A09")
        .param("in_Domain", to.code())
        .param("out_Domain", from.code())
        .param(
            "contract_MarketAgreement.Type",
            if day_ahead { "A01" } else { "A05" },
        )
}

/// Forecasted net transfer capacity (A61).
#[must_use]
pub fn net_transfer_capacity(from: &Area, to: &Area, interval: Interval, horizon: Horizon) -> Query {
    Query::new(interval)
        .param("documentType", "A61")
        .param("contract_MarketAgreement.Type", horizon.code())
        .param("in_Domain", to.code())
        .param("out_Domain", from.code())
}

/// Intraday offered transfer capacity (A31).
#[must_use]
pub fn intraday_offered_capacity(
    from: &Area,
    to: &Area,
    interval: Interval,
    implicit: bool,
) -> Query {
    Query::new(interval)
        .param("documentType", "A31")
        .param("auction.Type", if implicit { "A01" } else { "A02" })
        .param("contract_MarketAgreement.Type", "A07")
        .param("in_Domain", to.code())
        .param("out_Domain", from.code())
}

/// Imbalance prices (A85); answered with a ZIP archive.
#[must_use]
pub fn imbalance_prices(area: &Area, interval: Interval, psr_type: Option<&str>) -> Query {
    Query::new(interval)
        .param("documentType", "A85")
        .param("controlArea_Domain", area.code())
        .param_opt("psrType", psr_type)
}

/// Total imbalance volumes (A86); answered with a ZIP archive.
#[must_use]
pub fn imbalance_volumes(area: &Area, interval: Interval, psr_type: Option<&str>) -> Query {
    Query::new(interval)
        .param("documentType", "A86")
        .param("controlArea_Domain", area.code())
        .param_opt("psrType", psr_type)
}

/// Prices of procured balancing reserves (A89).
#[must_use]
pub fn contracted_reserve_prices(
    area: &Area,
    interval: Interval,
    type_market_agreement: &str,
    process_type: &str,
    psr_type: Option<&str>,
) -> Query {
    Query::new(interval)
        .param("documentType", "A89")
        .param("controlArea_Domain", area.code())
        .param("type_MarketAgreement.Type", type_market_agreement)
        .param("processType", process_type)
        .param_opt("psrType", psr_type)
}

/// Amounts of contracted balancing reserves (A81).
#[must_use]
pub fn contracted_reserve_amount(
    area: &Area,
    interval: Interval,
    type_market_agreement: &str,
    process_type: &str,
    psr_type: Option<&str>,
) -> Query {
    Query::new(interval)
        .param("documentType", "A81")
        .param("businessType", "B95")
        .param("controlArea_Domain", area.code())
        .param("type_MarketAgreement.Type", type_market_agreement)
        .param("processType", process_type)
        .param_opt("psrType", psr_type)
}

/// Aggregate filling rate of water reservoirs and hydro storage (A72).
#[must_use]
pub fn aggregate_water_reservoirs(area: &Area, interval: Interval) -> Query {
    Query::new(interval)
        .param("documentType", "A72")
        .param("processType", "A16")
        .param("in_Domain", area.code())
}

/// Unavailability of generation or production units (A80 / A77).
///
/// `doc_status` filters on document status, e.g. `A05` active or `A13` withdrawn.
#[must_use]
pub fn unit_unavailability(
    area: &Area,
    interval: Interval,
    outage: Outage,
    doc_status: Option<&str>,
) -> Query {
    Query::new(interval)
        .param("documentType", outage.document_type())
        .param("biddingZone_Domain", area.code())
        .param_opt("docStatus", doc_status)
}

/// Unavailability of transmission infrastructure between two areas (A78).
#[must_use]
pub fn transmission_unavailability(
    from: &Area,
    to: &Area,
    interval: Interval,
    doc_status: Option<&str>,
) -> Query {
    Query::new(interval)
        .param("documentType", Outage::Transmission.document_type())
        .param("in_Domain", to.code())
        .param("out_Domain", from.code())
        .param_opt("docStatus", doc_status)
}

/// Document status code for withdrawn unavailability notices.
pub const WITHDRAWN: &str = "A13";

impl RawClient {
    /// Day-ahead prices.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_day_ahead_prices(&self, area: &Area, interval: Interval) -> Result<Payload> {
        self.request(&day_ahead_prices(area, interval)).await
    }

    /// Actual total load.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_load(&self, area: &Area, interval: Interval) -> Result<Payload> {
        self.request(&load(area, interval)).await
    }

    /// Day-ahead load forecast.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_load_forecast(&self, area: &Area, interval: Interval) -> Result<Payload> {
        self.request(&load_forecast(area, interval)).await
    }

    /// Aggregated generation forecast.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_generation_forecast(
        &self,
        area: &Area,
        interval: Interval,
    ) -> Result<Payload> {
        self.request(&generation_forecast(area, interval)).await
    }

    /// Wind and solar forecast.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_wind_and_solar_forecast(
        &self,
        area: &Area,
        interval: Interval,
        psr_type: Option<&str>,
    ) -> Result<Payload> {
        self.request(&wind_and_solar_forecast(area, interval, psr_type))
            .await
    }

    /// Actual generation per production type.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_generation(
        &self,
        area: &Area,
        interval: Interval,
        psr_type: Option<&str>,
    ) -> Result<Payload> {
        self.request(&generation(area, interval, psr_type)).await
    }

    /// Installed generation capacity.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_installed_generation_capacity(
        &self,
        area: &Area,
        interval: Interval,
        psr_type: Option<&str>,
    ) -> Result<Payload> {
        self.request(&installed_generation_capacity(area, interval, psr_type))
            .await
    }

    /// Physical cross-border flows.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_crossborder_flows(
        &self,
        from: &Area,
        to: &Area,
        interval: Interval,
    ) -> Result<Payload> {
        self.request(&crossborder_flows(from, to, interval)).await
    }

    /// Scheduled commercial exchanges.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_scheduled_exchanges(
        &self,
        from: &Area,
        to: &Area,
        interval: Interval,
        day_ahead: bool,
    ) -> Result<Payload> {
        self.request(&scheduled_exchanges(from, to, interval, day_ahead))
            .await
    }

    /// Forecasted net transfer capacity.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_net_transfer_capacity(
        &self,
        from: &Area,
        to: &Area,
        interval: Interval,
        horizon: Horizon,
    ) -> Result<Payload> {
        self.request(&net_transfer_capacity(from, to, interval, horizon))
            .await
    }

    /// Intraday offered transfer capacity.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_intraday_offered_capacity(
        &self,
        from: &Area,
        to: &Area,
        interval: Interval,
        implicit: bool,
    ) -> Result<Payload> {
        self.request(&intraday_offered_capacity(from, to, interval, implicit))
            .await
    }

    /// Imbalance prices (ZIP payload).
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_imbalance_prices(
        &self,
        area: &Area,
        interval: Interval,
        psr_type: Option<&str>,
    ) -> Result<Payload> {
        self.request(&imbalance_prices(area, interval, psr_type))
            .await
    }

    /// Imbalance volumes (ZIP payload).
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_imbalance_volumes(
        &self,
        area: &Area,
        interval: Interval,
        psr_type: Option<&str>,
    ) -> Result<Payload> {
        self.request(&imbalance_volumes(area, interval, psr_type))
            .await
    }

    /// Contracted reserve prices, one page of documents.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_contracted_reserve_prices(
        &self,
        area: &Area,
        interval: Interval,
        type_market_agreement: &str,
        process_type: &str,
        psr_type: Option<&str>,
        offset: Option<u32>,
    ) -> Result<Payload> {
        let query = contracted_reserve_prices(
            area,
            interval,
            type_market_agreement,
            process_type,
            psr_type,
        );
        self.request(&query.with_offset(offset)).await
    }

    /// Contracted reserve amounts, one page of documents.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_contracted_reserve_amount(
        &self,
        area: &Area,
        interval: Interval,
        type_market_agreement: &str,
        process_type: &str,
        psr_type: Option<&str>,
        offset: Option<u32>,
    ) -> Result<Payload> {
        let query = contracted_reserve_amount(
            area,
            interval,
            type_market_agreement,
            process_type,
            psr_type,
        );
        self.request(&query.with_offset(offset)).await
    }

    /// Aggregate water reservoir filling.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_aggregate_water_reservoirs(
        &self,
        area: &Area,
        interval: Interval,
    ) -> Result<Payload> {
        self.request(&aggregate_water_reservoirs(area, interval))
            .await
    }

    /// Unit unavailability notices (ZIP payload), one page of documents.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_unit_unavailability(
        &self,
        area: &Area,
        interval: Interval,
        outage: Outage,
        doc_status: Option<&str>,
        offset: Option<u32>,
    ) -> Result<Payload> {
        let query = unit_unavailability(area, interval, outage, doc_status);
        self.request(&query.with_offset(offset)).await
    }

    /// Transmission unavailability notices (ZIP payload), one page of documents.
    ///
    /// # Errors
    ///
    /// Returns the classified provider or transport error.
    pub async fn query_transmission_unavailability(
        &self,
        from: &Area,
        to: &Area,
        interval: Interval,
        doc_status: Option<&str>,
        offset: Option<u32>,
    ) -> Result<Payload> {
        let query = transmission_unavailability(from, to, interval, doc_status);
        self.request(&query.with_offset(offset)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawResponse;
    use crate::client::tests::{ScriptedTransport, test_client};
    use chrono::TimeZone;
    use chrono_tz::{Europe::Brussels, Europe::Paris};
    use std::sync::Arc;

    fn interval() -> Interval {
        Interval::new(
            Brussels.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Brussels.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn be() -> Area {
        Area::new("BE", "10YBE----------2", "Belgium", Brussels)
    }

    fn fr() -> Area {
        Area::new("FR", "10YFR-RTE------C", "France", Paris)
    }

    #[test]
    fn test_flow_direction() {
        let query = crossborder_flows(&be(), &fr(), interval());
        assert_eq!(query.get("documentType"), Some("A11"));
        assert_eq!(query.get("out_Domain"), Some("10YBE----------2"));
        assert_eq!(query.get("in_Domain"), Some("10YFR-RTE------C"));
    }

    #[test]
    fn test_optional_filters() {
        assert_eq!(generation(&be(), interval(), None).get("psrType"), None);
        assert_eq!(
            generation(&be(), interval(), Some("B16")).get("psrType"),
            Some("B16")
        );
        let withdrawn = unit_unavailability(&be(), interval(), Outage::Production, Some(WITHDRAWN));
        assert_eq!(withdrawn.get("documentType"), Some("A77"));
        assert_eq!(withdrawn.get("docStatus"), Some("A13"));
    }

    #[test]
    fn test_ntc_horizon() {
        let query = net_transfer_capacity(&be(), &fr(), interval(), Horizon::WeekAhead);
        assert_eq!(query.get("contract_MarketAgreement.Type"), Some("A02"));
    }

    #[tokio::test]
    async fn test_raw_method_sends_offset() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(
            200,
            "<doc/>",
        ))]));
        let (client, _) = test_client(transport.clone(), 1);

        client
            .query_unit_unavailability(&be(), interval(), Outage::Generation, None, Some(200))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert!(seen[0].contains(&("offset".to_string(), "200".to_string())));
        assert!(seen[0].contains(&("documentType".to_string(), "A80".to_string())));
    }
}
