//! Store implementations.

pub mod memory;

pub use memory::{MemoryInstrumentStore, MemoryPeriodicPriceStore, MemoryQuoteStore};
