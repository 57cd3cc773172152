//! Quote result types with provenance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockwatch_market_data::{Quote, Venue};

/// Where a returned price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Cache,
    Live,
    Error,
}

impl PriceSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            PriceSource::Cache => "cache",
            PriceSource::Live => "live",
            PriceSource::Error => "error",
        }
    }
}

/// A quote together with the venue it was fetched for, its provenance and
/// the timestamp it was cached at.
#[derive(Debug, Clone, Serialize)]
pub struct PricedQuote {
    pub code: String,
    pub venue: Venue,
    pub quote: Quote,
    pub source: PriceSource,
    pub updated_at: String,
}

/// One venue's result inside a combined fetch. Failures are carried as
/// descriptions instead of aborting the other venue.
#[derive(Debug, Clone, Serialize)]
pub struct VenueOutcome {
    pub venue: Venue,
    pub quote: Option<Quote>,
    pub error: Option<String>,
}

impl VenueOutcome {
    /// A venue is usable when it produced a quote with a last price.
    pub fn usable_price(&self) -> Option<Decimal> {
        self.quote.as_ref().and_then(|quote| quote.last)
    }

    /// Cumulative volume for reconciliation; an absent volume counts as
    /// zero.
    pub fn volume(&self) -> Decimal {
        self.quote
            .as_ref()
            .and_then(|quote| quote.volume)
            .unwrap_or(Decimal::ZERO)
    }
}

/// The reconciled winner of a combined fetch. Empty when neither venue
/// produced a usable price.
#[derive(Debug, Clone, Serialize)]
pub struct BestPrice {
    pub venue: Option<Venue>,
    pub price: Option<Decimal>,
}

impl BestPrice {
    pub fn empty() -> Self {
        BestPrice {
            venue: None,
            price: None,
        }
    }
}

/// Combined two-venue quote for one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedQuote {
    pub code: String,
    pub krx: VenueOutcome,
    pub nxt: VenueOutcome,
    pub best: BestPrice,
    /// Venues currently inside a trading session, from the session table.
    pub active_venues: Vec<Venue>,
}
