//! In-memory store implementations.
//!
//! Used by the test suites and by embedders that bring no durable storage.
//! All of them are safe for concurrent use; quote writes are last writer
//! wins.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use async_trait::async_trait;
use dashmap::DashMap;
use stockwatch_market_data::Instrument;

use crate::errors::Result;
use crate::history::model::{PeriodicPrice, PeriodicPriceQuery};
use crate::history::store::PeriodicPriceStore;
use crate::quotes::store::{CachedQuote, InstrumentStore, QuoteCacheStore};

/// Quote cache keyed by `(code, venue_key)`.
#[derive(Debug, Default)]
pub struct MemoryQuoteStore {
    entries: DashMap<(String, String), CachedQuote>,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteCacheStore for MemoryQuoteStore {
    async fn get(&self, code: &str, venue_key: &str) -> Result<Option<CachedQuote>> {
        let key = (code.to_string(), venue_key.to_string());
        Ok(self.entries.get(&key).map(|entry| entry.clone()))
    }

    async fn put(&self, code: &str, venue_key: &str, entry: &CachedQuote) -> Result<()> {
        self.entries
            .insert((code.to_string(), venue_key.to_string()), entry.clone());
        Ok(())
    }
}

/// Instrument reference data keyed by code.
#[derive(Debug, Default)]
pub struct MemoryInstrumentStore {
    instruments: DashMap<String, Instrument>,
}

impl MemoryInstrumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, instrument: Instrument) {
        self.instruments
            .insert(instrument.code.clone(), instrument);
    }
}

#[async_trait]
impl InstrumentStore for MemoryInstrumentStore {
    async fn by_code(&self, code: &str) -> Result<Option<Instrument>> {
        Ok(self.instruments.get(code).map(|entry| entry.clone()))
    }
}

type BarKey = (String, String, String, bool);

/// Periodic bars keyed by `(code, venue, period, adjusted)` and, within a
/// key, by business date.
#[derive(Debug, Default)]
pub struct MemoryPeriodicPriceStore {
    bars: DashMap<BarKey, BTreeMap<String, PeriodicPrice>>,
}

impl MemoryPeriodicPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(query: &PeriodicPriceQuery) -> BarKey {
        (
            query.code.clone(),
            query.venue.market_code().to_string(),
            query.period.as_code().to_string(),
            query.adjusted,
        )
    }

    fn range(query: &PeriodicPriceQuery) -> RangeInclusive<String> {
        query.start_date.clone()..=query.end_date.clone()
    }
}

#[async_trait]
impl PeriodicPriceStore for MemoryPeriodicPriceStore {
    async fn get_range(&self, query: &PeriodicPriceQuery) -> Result<Vec<PeriodicPrice>> {
        let Some(bars) = self.bars.get(&Self::key(query)) else {
            return Ok(Vec::new());
        };
        Ok(bars
            .range(Self::range(query))
            .map(|(_, bar)| bar.clone())
            .collect())
    }

    async fn upsert(&self, query: &PeriodicPriceQuery, prices: &[PeriodicPrice]) -> Result<()> {
        let mut bars = self.bars.entry(Self::key(query)).or_default();
        for price in prices {
            bars.insert(price.business_date.clone(), price.clone());
        }
        Ok(())
    }
}
