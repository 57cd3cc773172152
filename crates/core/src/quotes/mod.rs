//! Quote fetching and caching.
//!
//! - [`model`] - Priced quotes, per-venue outcomes, and the reconciled
//!   best price
//! - [`store`] - Storage traits for the quote cache and instrument
//!   reference data
//! - [`freshness`] - The cache freshness policy
//! - [`service`] - The cache-versus-live price orchestrator

pub mod freshness;
pub mod model;
pub mod service;
pub mod store;


pub use model::{BestPrice, CombinedQuote, PriceSource, PricedQuote, VenueOutcome};
pub use service::PriceService;
pub use store::{CachedQuote, InstrumentStore, QuoteCacheStore};
