//! The upstream seam consumed by the domain services.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{Period, Venue};

/// Raw price access against the brokerage API.
///
/// Implementations return the full upstream payload with the application
/// result code already checked; callers pick the `output` blocks they need.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current price of a domestic instrument on one venue
    /// (`Krx`/`Nxt`/`Unified`).
    async fn domestic_price(&self, code: &str, venue: Venue) -> Result<Value, MarketDataError>;

    /// Current price detail of an overseas instrument (`Nas`/`Nys`).
    async fn overseas_price(&self, exchange: Venue, symbol: &str)
        -> Result<Value, MarketDataError>;

    /// Daily/weekly/monthly/yearly bars for a domestic instrument over an
    /// inclusive `YYYYMMDD` date range.
    async fn periodic_prices(
        &self,
        code: &str,
        venue: Venue,
        start_date: &str,
        end_date: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<Value, MarketDataError>;
}
