//! Periodic price bars and their query type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockwatch_market_data::models::decimal_field;
use stockwatch_market_data::{Period, Venue};

use crate::errors::{Error, Result};
use crate::quotes::model::PriceSource;

/// A validated periodic price query. Construction normalizes the dates to
/// `YYYYMMDD` and rejects anything the upstream would refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicPriceQuery {
    pub code: String,
    pub venue: Venue,
    pub start_date: String,
    pub end_date: String,
    pub period: Period,
    pub adjusted: bool,
}

impl PeriodicPriceQuery {
    pub fn new(
        code: impl Into<String>,
        venue: Venue,
        start_date: &str,
        end_date: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(Error::validation("stock code must not be empty"));
        }
        if venue.is_overseas() {
            return Err(Error::validation(format!(
                "venue {venue} is not a domestic venue"
            )));
        }
        let start_date = normalize_date(start_date)?;
        let end_date = normalize_date(end_date)?;
        if start_date > end_date {
            return Err(Error::validation(format!(
                "start date {start_date} is after end date {end_date}"
            )));
        }
        Ok(PeriodicPriceQuery {
            code,
            venue,
            start_date,
            end_date,
            period,
            adjusted,
        })
    }
}

/// Accepts `YYYYMMDD` or `YYYY-MM-DD` and yields the compact upstream
/// format.
fn normalize_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let compact: String = if raw.len() == 10 && raw.as_bytes()[4] == b'-' && raw.as_bytes()[7] == b'-' {
        raw.chars().filter(|c| *c != '-').collect()
    } else {
        raw.to_string()
    };
    if compact.len() == 8 && compact.chars().all(|c| c.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(Error::validation(format!("invalid date: {raw}")))
    }
}

/// One aggregated price bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicPrice {
    /// Business date in `YYYYMMDD`.
    pub business_date: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub trade_amount: Option<Decimal>,
    pub change: Option<Decimal>,
}

impl PeriodicPrice {
    /// Builds a bar from one element of the chart endpoint's `output2`
    /// array. Items without a business date are unusable.
    pub fn from_output_item(item: &Value) -> Option<PeriodicPrice> {
        let business_date = item
            .get("stck_bsop_date")
            .and_then(Value::as_str)
            .filter(|date| !date.is_empty())?
            .to_string();
        Some(PeriodicPrice {
            business_date,
            open: decimal_field(item, "stck_oprc"),
            high: decimal_field(item, "stck_hgpr"),
            low: decimal_field(item, "stck_lwpr"),
            close: decimal_field(item, "stck_clpr"),
            volume: decimal_field(item, "acml_vol"),
            trade_amount: decimal_field(item, "acml_tr_pbmn"),
            change: decimal_field(item, "prdy_vrss"),
        })
    }
}

/// The bars answering one query, with their provenance.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodicPrices {
    pub code: String,
    pub venue: Venue,
    pub period: Period,
    pub adjusted: bool,
    pub start_date: String,
    pub end_date: String,
    pub source: PriceSource,
    pub prices: Vec<PeriodicPrice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn query_normalizes_dashed_dates() {
        let query = PeriodicPriceQuery::new(
            "005930",
            Venue::Krx,
            "2025-01-02",
            "20250131",
            Period::Day,
            true,
        )
        .unwrap();
        assert_eq!(query.start_date, "20250102");
        assert_eq!(query.end_date, "20250131");
    }

    #[test]
    fn query_rejects_bad_input() {
        assert!(PeriodicPriceQuery::new(
            " ",
            Venue::Krx,
            "20250101",
            "20250131",
            Period::Day,
            true
        )
        .is_err());
        assert!(PeriodicPriceQuery::new(
            "005930",
            Venue::Nas,
            "20250101",
            "20250131",
            Period::Day,
            true
        )
        .is_err());
        assert!(PeriodicPriceQuery::new(
            "005930",
            Venue::Krx,
            "2025-13",
            "20250131",
            Period::Day,
            true
        )
        .is_err());
        assert!(PeriodicPriceQuery::new(
            "005930",
            Venue::Krx,
            "20250201",
            "20250131",
            Period::Day,
            true
        )
        .is_err());
    }

    #[test]
    fn bars_parse_from_output_items() {
        let item = json!({
            "stck_bsop_date": "20250102",
            "stck_oprc": "71000",
            "stck_hgpr": "72500",
            "stck_lwpr": "70900",
            "stck_clpr": "72000",
            "acml_vol": "1500000",
            "acml_tr_pbmn": "107000000000",
            "prdy_vrss": "500"
        });
        let bar = PeriodicPrice::from_output_item(&item).unwrap();
        assert_eq!(bar.business_date, "20250102");
        assert_eq!(bar.close, Some(dec!(72000)));
        assert_eq!(bar.trade_amount, Some(dec!(107000000000)));

        assert!(PeriodicPrice::from_output_item(&json!({"stck_clpr": "1"})).is_none());
        assert!(PeriodicPrice::from_output_item(&json!({"stck_bsop_date": ""})).is_none());
    }
}
