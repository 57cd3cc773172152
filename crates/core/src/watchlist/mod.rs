//! Watchlist batch price fetching.

pub mod watchlist_model;
pub mod watchlist_service;

#[cfg(test)]
mod watchlist_service_tests;

pub use watchlist_model::{FetchOptions, ItemOutcome, ItemPrice, WatchlistItem};
pub use watchlist_service::WatchlistPriceService;
