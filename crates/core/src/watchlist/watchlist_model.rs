//! Watchlist items and batch fetch result types.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockwatch_market_data::{MarketKind, Quote, Venue};

use crate::quotes::model::PriceSource;

/// A tracked instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub code: String,
    pub name: Option<String>,
    pub memo: Option<String>,
}

impl WatchlistItem {
    pub fn new(code: impl Into<String>) -> Self {
        WatchlistItem {
            code: code.into(),
            name: None,
            memo: None,
        }
    }
}

/// Knobs for a batch fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Consult the cache before anything else.
    pub use_cache: bool,
    /// Freshness bound for cached entries; unset accepts any entry.
    pub max_age: Option<Duration>,
    /// Fetch live for items the cache could not answer.
    pub refresh_missing: bool,
    /// Also fetch the alternate domestic venue for each domestic item.
    pub include_alternate: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            use_cache: true,
            max_age: None,
            refresh_missing: false,
            include_alternate: false,
        }
    }
}

/// Flattened price fields for one item and venue. `source` is `None` when
/// the fetch was skipped (cache miss without `refresh_missing`).
#[derive(Debug, Clone, Serialize)]
pub struct ItemPrice {
    pub source: Option<PriceSource>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_rate: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub error: Option<String>,
}

impl ItemPrice {
    pub fn empty() -> Self {
        ItemPrice {
            source: None,
            last: None,
            change: None,
            change_rate: None,
            volume: None,
            error: None,
        }
    }

    pub fn from_quote(quote: &Quote, source: PriceSource) -> Self {
        ItemPrice {
            source: Some(source),
            last: quote.last,
            change: quote.change,
            change_rate: quote.change_rate,
            volume: quote.volume,
            error: None,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        ItemPrice {
            source: Some(PriceSource::Error),
            last: None,
            change: None,
            change_rate: None,
            volume: None,
            error: Some(message.into()),
        }
    }
}

/// One item's result inside a batch. The batch always yields one outcome
/// per input item, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub item: WatchlistItem,
    pub market: Option<MarketKind>,
    /// The resolved overseas exchange, for overseas items.
    pub exchange: Option<Venue>,
    pub price: ItemPrice,
    /// Alternate-venue price, present only when requested.
    pub alternate: Option<ItemPrice>,
}
