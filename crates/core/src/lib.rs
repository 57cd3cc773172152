//! Watchlist price aggregation core.
//!
//! This crate orchestrates price fetching on top of the
//! `stockwatch-market-data` crate:
//!
//! - [`quotes`] - cache-versus-live single fetches and the combined
//!   two-venue best price
//! - [`watchlist`] - order-preserving batch fetches with per-item error
//!   isolation
//! - [`history`] - periodic price bars with stored-row reuse
//! - [`storage`] - in-memory store implementations behind the storage
//!   traits
//!
//! Storage and the upstream are both traits, so embedders supply their own
//! persistence and the services are testable against fakes.

pub mod errors;
pub mod history;
pub mod quotes;
pub mod storage;
pub mod watchlist;

pub use errors::{Error, Result};
pub use history::{HistoryService, PeriodicPrice, PeriodicPriceQuery, PeriodicPrices};
pub use quotes::{
    BestPrice, CachedQuote, CombinedQuote, InstrumentStore, PriceService, PriceSource,
    PricedQuote, QuoteCacheStore, VenueOutcome,
};
pub use storage::{MemoryInstrumentStore, MemoryPeriodicPriceStore, MemoryQuoteStore};
pub use watchlist::{FetchOptions, ItemOutcome, ItemPrice, WatchlistItem, WatchlistPriceService};
