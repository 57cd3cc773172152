//! Periodic (daily/weekly/monthly/yearly) price bars.

pub mod model;
pub mod service;
pub mod store;

pub use model::{PeriodicPrice, PeriodicPriceQuery, PeriodicPrices};
pub use service::HistoryService;
pub use store::PeriodicPriceStore;
