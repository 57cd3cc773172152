//! Batch price fetching over watchlist items.

use std::sync::Arc;

use futures::future::join_all;
use log::warn;
use stockwatch_market_data::{Instrument, MarketKind, Venue};

use crate::errors::Result;
use crate::quotes::model::PriceSource;
use crate::quotes::service::{validate_max_age, PriceService};
use crate::quotes::store::InstrumentStore;
use crate::watchlist::watchlist_model::{FetchOptions, ItemOutcome, ItemPrice, WatchlistItem};

/// Cache key for overseas instruments whose exchange could not be
/// resolved.
const OVERSEAS_FALLBACK_KEY: &str = "US";

/// Fans a price fetch out over a whole watchlist.
///
/// Items are fetched concurrently and failures never cross item
/// boundaries: the result always has one outcome per input item, in input
/// order, with failed items carrying an error-tagged price.
pub struct WatchlistPriceService {
    prices: Arc<PriceService>,
    instruments: Arc<dyn InstrumentStore>,
}

impl WatchlistPriceService {
    pub fn new(prices: Arc<PriceService>, instruments: Arc<dyn InstrumentStore>) -> Self {
        WatchlistPriceService {
            prices,
            instruments,
        }
    }

    pub async fn fetch_all(
        &self,
        items: &[WatchlistItem],
        options: &FetchOptions,
    ) -> Result<Vec<ItemOutcome>> {
        validate_max_age(options.max_age)?;
        Ok(join_all(items.iter().map(|item| self.fetch_item(item, options))).await)
    }

    async fn fetch_item(&self, item: &WatchlistItem, options: &FetchOptions) -> ItemOutcome {
        let meta = match self.instruments.by_code(&item.code).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("instrument lookup failed for {}: {e}", item.code);
                return ItemOutcome {
                    item: item.clone(),
                    market: None,
                    exchange: None,
                    price: ItemPrice::from_error(e.to_string()),
                    alternate: None,
                };
            }
        };

        let market = meta.as_ref().and_then(|m| m.market);
        if market.is_some_and(MarketKind::is_overseas) {
            if let Some(meta) = meta.as_ref() {
                return self.fetch_overseas_item(item, meta, options).await;
            }
        }

        // Instruments without reference data are treated as domestic.
        let price = self.domestic_price(&item.code, Venue::Krx, options).await;
        let alternate = if options.include_alternate {
            Some(self.domestic_price(&item.code, Venue::Nxt, options).await)
        } else {
            None
        };
        ItemOutcome {
            item: item.clone(),
            market,
            exchange: None,
            price,
            alternate,
        }
    }

    async fn fetch_overseas_item(
        &self,
        item: &WatchlistItem,
        meta: &Instrument,
        options: &FetchOptions,
    ) -> ItemOutcome {
        let exchange = meta.overseas_venue();
        let price = self.overseas_price(&item.code, exchange, options).await;
        ItemOutcome {
            item: item.clone(),
            market: meta.market,
            exchange,
            price,
            alternate: None,
        }
    }

    async fn domestic_price(
        &self,
        code: &str,
        venue: Venue,
        options: &FetchOptions,
    ) -> ItemPrice {
        if options.use_cache {
            match self
                .prices
                .cached_quote(code, venue.market_code(), options.max_age)
                .await
            {
                Ok(Some(hit)) => return ItemPrice::from_quote(&hit.quote, PriceSource::Cache),
                Ok(None) => {}
                Err(e) => warn!("cache read failed for {code} on {venue}: {e}"),
            }
        }
        if !options.refresh_missing {
            return ItemPrice::empty();
        }
        match self.prices.get_quote(code, venue, false, None).await {
            Ok(priced) => ItemPrice::from_quote(&priced.quote, PriceSource::Live),
            Err(e) => {
                warn!("live fetch failed for {code} on {venue}: {e}");
                ItemPrice::from_error(e.to_string())
            }
        }
    }

    async fn overseas_price(
        &self,
        code: &str,
        exchange: Option<Venue>,
        options: &FetchOptions,
    ) -> ItemPrice {
        let cache_key = exchange
            .map(Venue::market_code)
            .unwrap_or(OVERSEAS_FALLBACK_KEY);
        if options.use_cache {
            match self.prices.cached_quote(code, cache_key, options.max_age).await {
                Ok(Some(hit)) => return ItemPrice::from_quote(&hit.quote, PriceSource::Cache),
                Ok(None) => {}
                Err(e) => warn!("cache read failed for {code} on {cache_key}: {e}"),
            }
        }
        if !options.refresh_missing {
            return ItemPrice::empty();
        }
        let Some(exchange) = exchange else {
            return ItemPrice::from_error(format!(
                "overseas exchange could not be resolved for {code}"
            ));
        };
        match self
            .prices
            .get_overseas_quote(code, exchange, false, None)
            .await
        {
            Ok(priced) => ItemPrice::from_quote(&priced.quote, PriceSource::Live),
            Err(e) => {
                warn!("live fetch failed for {code} on {exchange}: {e}");
                ItemPrice::from_error(e.to_string())
            }
        }
    }
}
