//! Brokerage market data access.
//!
//! This crate owns everything that touches the brokerage upstream:
//!
//! - [`client::BrokerClient`] — authenticated HTTP client for the
//!   quotation endpoints (domestic, overseas, periodic bars)
//! - [`auth`] — access token lifecycle with serialized refresh and
//!   pluggable token storage
//! - [`session`] — domestic market session windows per venue
//! - [`models`] — venues, instruments, and normalized quotes with numbers
//!   parsed at the wire boundary
//!
//! The domain layer consumes it through the [`provider::PriceProvider`]
//! trait, so services can be exercised against fakes.

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod provider;
pub mod session;

pub use auth::{MemoryTokenStore, TokenManager, TokenStore};
pub use client::BrokerClient;
pub use config::BrokerConfig;
pub use errors::MarketDataError;
pub use models::{Instrument, MarketKind, Period, Quote, Venue};
pub use provider::PriceProvider;
pub use session::{active_venues, active_venues_now};
