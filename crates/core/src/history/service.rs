//! Periodic price fetching with a stored-bar cache.

use std::sync::Arc;

use log::debug;
use serde_json::Value;
use stockwatch_market_data::PriceProvider;

use crate::errors::Result;
use crate::history::model::{PeriodicPrice, PeriodicPriceQuery, PeriodicPrices};
use crate::history::store::PeriodicPriceStore;
use crate::quotes::model::PriceSource;

/// Serves daily/weekly/monthly/yearly bars, preferring stored rows over an
/// upstream round trip.
pub struct HistoryService {
    provider: Arc<dyn PriceProvider>,
    store: Arc<dyn PeriodicPriceStore>,
}

impl HistoryService {
    pub fn new(provider: Arc<dyn PriceProvider>, store: Arc<dyn PeriodicPriceStore>) -> Self {
        HistoryService { provider, store }
    }

    /// Answers the query from stored bars when any exist for the range,
    /// otherwise fetches live and writes the parsed bars through.
    pub async fn periodic_prices(
        &self,
        query: &PeriodicPriceQuery,
        use_cache: bool,
    ) -> Result<PeriodicPrices> {
        if use_cache {
            let stored = self.store.get_range(query).await?;
            if !stored.is_empty() {
                debug!(
                    "serving {} stored bars for {} {}..{}",
                    stored.len(),
                    query.code,
                    query.start_date,
                    query.end_date
                );
                return Ok(self.result(query, PriceSource::Cache, stored));
            }
        }

        let payload = self
            .provider
            .periodic_prices(
                &query.code,
                query.venue,
                &query.start_date,
                &query.end_date,
                query.period,
                query.adjusted,
            )
            .await?;
        let mut prices = parse_bars(&payload);
        prices.sort_by(|a, b| a.business_date.cmp(&b.business_date));
        self.store.upsert(query, &prices).await?;
        Ok(self.result(query, PriceSource::Live, prices))
    }

    fn result(
        &self,
        query: &PeriodicPriceQuery,
        source: PriceSource,
        prices: Vec<PeriodicPrice>,
    ) -> PeriodicPrices {
        PeriodicPrices {
            code: query.code.clone(),
            venue: query.venue,
            period: query.period,
            adjusted: query.adjusted,
            start_date: query.start_date.clone(),
            end_date: query.end_date.clone(),
            source,
            prices,
        }
    }
}

/// The chart endpoint returns bars in `output2`; items without a business
/// date (padding rows) are skipped.
fn parse_bars(payload: &Value) -> Vec<PeriodicPrice> {
    payload
        .get("output2")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(PeriodicPrice::from_output_item)
                .collect()
        })
        .unwrap_or_default()
}
