//! Tests for batch fan-out, per-item isolation, and market routing.

#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::quotes::freshness::format_timestamp;
    use crate::quotes::model::PriceSource;
    use crate::quotes::service::PriceService;
    use crate::quotes::store::{CachedQuote, QuoteCacheStore};
    use crate::storage::memory::{MemoryInstrumentStore, MemoryQuoteStore};
    use crate::watchlist::watchlist_model::{FetchOptions, WatchlistItem};
    use crate::watchlist::watchlist_service::WatchlistPriceService;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use stockwatch_market_data::{
        Instrument, MarketDataError, MarketKind, Period, PriceProvider, Quote, Venue,
    };

    #[derive(Default)]
    struct FakeProvider {
        responses: Mutex<HashMap<(String, String), Value>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self::default()
        }

        fn respond(&self, code: &str, venue_key: &str, price: &str) {
            let payload = json!({
                "rt_cd": "0",
                "output": {
                    "stck_prpr": price,
                    "prdy_vrss": "0",
                    "prdy_ctrt": "0.00",
                    "acml_vol": "1000",
                    "last": price,
                    "base": price,
                    "tvol": "1000"
                }
            });
            self.responses
                .lock()
                .unwrap()
                .insert((code.to_string(), venue_key.to_string()), payload);
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn lookup(&self, code: &str, venue_key: &str) -> Result<Value, MarketDataError> {
            let key = (code.to_string(), venue_key.to_string());
            self.calls.lock().unwrap().push(key.clone());
            self.responses
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .ok_or_else(|| {
                    MarketDataError::upstream(
                        None,
                        "invalid stock code",
                        json!({"rt_cd": "1", "msg1": "invalid stock code"}),
                    )
                })
        }
    }

    #[async_trait]
    impl PriceProvider for FakeProvider {
        async fn domestic_price(
            &self,
            code: &str,
            venue: Venue,
        ) -> Result<Value, MarketDataError> {
            self.lookup(code, venue.market_code())
        }

        async fn overseas_price(
            &self,
            exchange: Venue,
            symbol: &str,
        ) -> Result<Value, MarketDataError> {
            self.lookup(symbol, exchange.market_code())
        }

        async fn periodic_prices(
            &self,
            code: &str,
            venue: Venue,
            _: &str,
            _: &str,
            _: Period,
            _: bool,
        ) -> Result<Value, MarketDataError> {
            self.lookup(code, venue.market_code())
        }
    }

    struct Fixture {
        provider: Arc<FakeProvider>,
        cache: Arc<MemoryQuoteStore>,
        instruments: Arc<MemoryInstrumentStore>,
        service: WatchlistPriceService,
    }

    fn fixture() -> Fixture {
        let provider = Arc::new(FakeProvider::new());
        let cache = Arc::new(MemoryQuoteStore::new());
        let instruments = Arc::new(MemoryInstrumentStore::new());
        let prices = Arc::new(PriceService::new(provider.clone(), cache.clone()));
        let service = WatchlistPriceService::new(prices, instruments.clone());
        Fixture {
            provider,
            cache,
            instruments,
            service,
        }
    }

    fn items(codes: &[&str]) -> Vec<WatchlistItem> {
        codes.iter().map(|code| WatchlistItem::new(*code)).collect()
    }

    fn refresh_options() -> FetchOptions {
        FetchOptions {
            use_cache: false,
            max_age: None,
            refresh_missing: true,
            include_alternate: false,
        }
    }

    fn overseas_instrument(code: &str, exchange: Option<&str>, standard_code: Option<&str>) -> Instrument {
        Instrument {
            code: code.to_string(),
            standard_code: standard_code.map(str::to_string),
            name: None,
            market: Some(MarketKind::Us),
            exchange: exchange.map(str::to_string),
        }
    }

    async fn seed_cache(cache: &MemoryQuoteStore, code: &str, venue_key: &str, price: &str) {
        let quote = Quote::from_domestic_output(&json!({"stck_prpr": price}));
        cache
            .put(
                code,
                venue_key,
                &CachedQuote {
                    quote,
                    updated_at: format_timestamp(Utc::now().naive_utc()),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn batch_preserves_order_and_isolates_failures() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");
        // 999999 has no response configured, so its fetch fails.
        f.provider.respond("000660", "J", "180000");

        let outcomes = f
            .service
            .fetch_all(&items(&["005930", "999999", "000660"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        let codes: Vec<&str> = outcomes.iter().map(|o| o.item.code.as_str()).collect();
        assert_eq!(codes, vec!["005930", "999999", "000660"]);

        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
        assert_eq!(outcomes[0].price.last, Some(dec!(72000)));

        assert_eq!(outcomes[1].price.source, Some(PriceSource::Error));
        assert!(outcomes[1].price.error.as_deref().unwrap().contains("invalid stock code"));
        assert_eq!(outcomes[1].price.last, None);

        assert_eq!(outcomes[2].price.source, Some(PriceSource::Live));
        assert_eq!(outcomes[2].price.last, Some(dec!(180000)));
    }

    #[tokio::test]
    async fn empty_cache_fetches_live_once_then_serves_from_cache() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");

        let options = FetchOptions {
            max_age: Some(Duration::seconds(300)),
            refresh_missing: true,
            ..FetchOptions::default()
        };

        let first = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();
        assert_eq!(first[0].price.source, Some(PriceSource::Live));
        assert_eq!(first[0].price.last, Some(dec!(72000)));
        assert_eq!(f.provider.calls().len(), 1);

        let second = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();
        assert_eq!(second[0].price.source, Some(PriceSource::Cache));
        assert_eq!(second[0].price.last, Some(dec!(72000)));
        assert_eq!(f.provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn without_refresh_missing_misses_stay_empty() {
        let f = fixture();
        let outcomes = f
            .service
            .fetch_all(&items(&["005930", "000660"]), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert_eq!(outcome.price.source, None);
            assert_eq!(outcome.price.error, None);
        }
        assert!(f.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn fresh_cache_entries_are_served_without_upstream_calls() {
        let f = fixture();
        seed_cache(&f.cache, "005930", "J", "71500").await;

        let options = FetchOptions {
            max_age: Some(Duration::seconds(300)),
            refresh_missing: true,
            ..FetchOptions::default()
        };
        let outcomes = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();

        assert_eq!(outcomes[0].price.source, Some(PriceSource::Cache));
        assert_eq!(outcomes[0].price.last, Some(dec!(71500)));
        assert!(f.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_cache_entries_are_refreshed_when_requested() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");
        let stale = Quote::from_domestic_output(&json!({"stck_prpr": "70000"}));
        f.cache
            .put(
                "005930",
                "J",
                &CachedQuote {
                    quote: stale,
                    updated_at: "2020-01-01 00:00:00".to_string(),
                },
            )
            .await
            .unwrap();

        let options = FetchOptions {
            max_age: Some(Duration::seconds(60)),
            refresh_missing: true,
            ..FetchOptions::default()
        };
        let outcomes = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();

        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
        assert_eq!(outcomes[0].price.last, Some(dec!(72000)));
    }

    #[tokio::test]
    async fn include_alternate_attaches_an_independent_alternate_fetch() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");
        f.provider.respond("005930", "NX", "72100");

        let options = FetchOptions {
            include_alternate: true,
            ..refresh_options()
        };
        let outcomes = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();

        assert_eq!(outcomes[0].price.last, Some(dec!(72000)));
        let alternate = outcomes[0].alternate.as_ref().unwrap();
        assert_eq!(alternate.source, Some(PriceSource::Live));
        assert_eq!(alternate.last, Some(dec!(72100)));
    }

    #[tokio::test]
    async fn alternate_failure_does_not_taint_the_primary() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");
        // No NX response configured.

        let options = FetchOptions {
            include_alternate: true,
            ..refresh_options()
        };
        let outcomes = f
            .service
            .fetch_all(&items(&["005930"]), &options)
            .await
            .unwrap();

        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
        let alternate = outcomes[0].alternate.as_ref().unwrap();
        assert_eq!(alternate.source, Some(PriceSource::Error));
        assert!(alternate.error.is_some());
    }

    #[tokio::test]
    async fn overseas_items_are_routed_by_their_resolved_exchange() {
        let f = fixture();
        f.instruments
            .insert(overseas_instrument("TSLA", Some("NAS"), None));
        f.provider.respond("TSLA", "NAS", "412.50");

        let outcomes = f
            .service
            .fetch_all(&items(&["TSLA"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes[0].market, Some(MarketKind::Us));
        assert_eq!(outcomes[0].exchange, Some(Venue::Nas));
        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
        assert_eq!(outcomes[0].price.last, Some(dec!(412.50)));
        assert_eq!(
            f.provider.calls(),
            vec![("TSLA".to_string(), "NAS".to_string())]
        );
    }

    #[tokio::test]
    async fn overseas_exchange_falls_back_to_the_standard_code_prefix() {
        let f = fixture();
        f.instruments
            .insert(overseas_instrument("KO", None, Some("NYS0042")));
        f.provider.respond("KO", "NYS", "62.10");

        let outcomes = f
            .service
            .fetch_all(&items(&["KO"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes[0].exchange, Some(Venue::Nys));
        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
    }

    #[tokio::test]
    async fn unresolvable_overseas_exchange_is_an_error_outcome() {
        let f = fixture();
        f.instruments
            .insert(overseas_instrument("MYSTERY", None, None));

        let outcomes = f
            .service
            .fetch_all(&items(&["MYSTERY"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes[0].price.source, Some(PriceSource::Error));
        assert!(outcomes[0]
            .price
            .error
            .as_deref()
            .unwrap()
            .contains("could not be resolved"));
        assert!(f.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn multibyte_standard_code_stays_an_isolated_error_outcome() {
        let f = fixture();
        f.instruments
            .insert(overseas_instrument("ODD", None, Some("a한국")));
        f.provider.respond("005930", "J", "72000");

        let outcomes = f
            .service
            .fetch_all(&items(&["ODD", "005930"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].exchange, None);
        assert_eq!(outcomes[0].price.source, Some(PriceSource::Error));
        assert_eq!(outcomes[1].price.source, Some(PriceSource::Live));
    }

    #[tokio::test]
    async fn items_without_reference_data_default_to_domestic() {
        let f = fixture();
        f.provider.respond("005930", "J", "72000");

        let outcomes = f
            .service
            .fetch_all(&items(&["005930"]), &refresh_options())
            .await
            .unwrap();

        assert_eq!(outcomes[0].market, None);
        assert_eq!(outcomes[0].price.source, Some(PriceSource::Live));
    }

    #[tokio::test]
    async fn negative_max_age_rejects_the_whole_batch() {
        let f = fixture();
        let options = FetchOptions {
            max_age: Some(Duration::seconds(-5)),
            ..FetchOptions::default()
        };
        assert!(matches!(
            f.service.fetch_all(&items(&["005930"]), &options).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn empty_watchlist_yields_an_empty_batch() {
        let f = fixture();
        let outcomes = f
            .service
            .fetch_all(&[], &FetchOptions::default())
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }
}
