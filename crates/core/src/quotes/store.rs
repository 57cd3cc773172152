//! Storage seams for cached quotes and instrument reference data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stockwatch_market_data::{Instrument, Quote};

use crate::errors::Result;

/// A cached quote with the timestamp it was written at, stored as a
/// `"%Y-%m-%d %H:%M:%S"` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedQuote {
    pub quote: Quote,
    pub updated_at: String,
}

/// Keyed quote cache. Entries are keyed by `(code, venue_key)` where the
/// venue key is the market code (`J`, `NX`, `UN`, `NAS`, `NYS`).
#[async_trait]
pub trait QuoteCacheStore: Send + Sync {
    async fn get(&self, code: &str, venue_key: &str) -> Result<Option<CachedQuote>>;

    /// Overwrites any existing entry for the key.
    async fn put(&self, code: &str, venue_key: &str, entry: &CachedQuote) -> Result<()>;
}

/// Instrument reference lookup, used to route fetches between domestic and
/// overseas markets.
#[async_trait]
pub trait InstrumentStore: Send + Sync {
    async fn by_code(&self, code: &str) -> Result<Option<Instrument>>;
}
