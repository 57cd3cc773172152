//! Storage seam for periodic price bars.

use async_trait::async_trait;

use crate::errors::Result;
use crate::history::model::{PeriodicPrice, PeriodicPriceQuery};

/// Keyed storage for aggregated bars. Rows are addressed by
/// `(code, venue, period, adjusted)` plus the business date.
#[async_trait]
pub trait PeriodicPriceStore: Send + Sync {
    /// Stored bars inside the query's date range, ordered by business
    /// date.
    async fn get_range(&self, query: &PeriodicPriceQuery) -> Result<Vec<PeriodicPrice>>;

    /// Inserts or replaces bars by business date.
    async fn upsert(&self, query: &PeriodicPriceQuery, prices: &[PeriodicPrice]) -> Result<()>;
}
