//! Durable storage for issued access tokens.
//!
//! Tokens are keyed by `(app_key, base_url)` so sandbox and production
//! credentials never shadow each other.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// A persisted access token as handed back by the credential exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    /// Relative lifetime in seconds, when the upstream reported one.
    pub expires_in: Option<i64>,
    /// Absolute expiry as a `"%Y-%m-%d %H:%M:%S"` string.
    pub expired_at: Option<String>,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(
        &self,
        app_key: &str,
        base_url: &str,
    ) -> Result<Option<StoredToken>, MarketDataError>;

    /// Inserts or overwrites the token for the key.
    async fn upsert(
        &self,
        app_key: &str,
        base_url: &str,
        token: &StoredToken,
    ) -> Result<(), MarketDataError>;

    async fn delete(&self, app_key: &str, base_url: &str) -> Result<(), MarketDataError>;
}

/// In-memory token store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<(String, String), StoredToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(
        &self,
        app_key: &str,
        base_url: &str,
    ) -> Result<Option<StoredToken>, MarketDataError> {
        let key = (app_key.to_string(), base_url.to_string());
        Ok(self.tokens.get(&key).map(|entry| entry.clone()))
    }

    async fn upsert(
        &self,
        app_key: &str,
        base_url: &str,
        token: &StoredToken,
    ) -> Result<(), MarketDataError> {
        self.tokens
            .insert((app_key.to_string(), base_url.to_string()), token.clone());
        Ok(())
    }

    async fn delete(&self, app_key: &str, base_url: &str) -> Result<(), MarketDataError> {
        self.tokens
            .remove(&(app_key.to_string(), base_url.to_string()));
        Ok(())
    }
}
