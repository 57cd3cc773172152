//! Access token lifecycle.
//!
//! The brokerage hands out bearer tokens with a one-day lifetime and rate
//! limits the exchange endpoint, so tokens are cached in memory, persisted
//! through a [`TokenStore`], and refreshed at most once at a time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use log::{debug, warn};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::auth::store::{StoredToken, TokenStore};
use crate::errors::MarketDataError;

/// Storage format for absolute expiry timestamps.
pub const TOKEN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tokens are treated as expired this long before their actual expiry, so a
/// token that is about to lapse is never used for a request.
pub const REFRESH_BUFFER_MINUTES: i64 = 30;

/// Assumed lifetime when the upstream reports neither an absolute expiry
/// nor a relative one.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

const TOKEN_ENDPOINT: &str = "/oauth2/tokenP";

/// A usable access token with its resolved absolute expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    pub expired_at: NaiveDateTime,
}

impl AccessToken {
    /// A token inside the refresh buffer counts as expired.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expired_at - Duration::minutes(REFRESH_BUFFER_MINUTES)
    }
}

/// Raw result of one credential exchange, before expiry resolution.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    /// The upstream's absolute expiry string, verbatim.
    pub expired_at_raw: Option<String>,
}

/// The single network interaction of the token lifecycle. Kept behind a
/// trait so the manager can be exercised without an upstream.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(&self) -> Result<IssuedToken, MarketDataError>;
}

/// Exchanges app credentials for a token against the brokerage OAuth
/// endpoint.
pub struct HttpCredentialExchange {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
}

impl HttpCredentialExchange {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        HttpCredentialExchange {
            http,
            base_url: base_url.into(),
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }
}

#[async_trait]
impl CredentialExchange for HttpCredentialExchange {
    async fn exchange(&self) -> Result<IssuedToken, MarketDataError> {
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        let body = json!({
            "grant_type": "client_credentials",
            "appkey": self.app_key,
            "appsecret": self.app_secret,
        });
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(MarketDataError::Credential(format!(
                "token exchange failed with status {status}: {}",
                payload
                    .get("error_description")
                    .and_then(Value::as_str)
                    .unwrap_or("no detail")
            )));
        }

        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                MarketDataError::Credential(
                    payload
                        .get("error_description")
                        .and_then(Value::as_str)
                        .unwrap_or("token missing from exchange response")
                        .to_string(),
                )
            })?
            .to_string();

        Ok(IssuedToken {
            access_token,
            token_type: payload
                .get("token_type")
                .and_then(Value::as_str)
                .unwrap_or("Bearer")
                .to_string(),
            expires_in: payload.get("expires_in").and_then(Value::as_i64),
            expired_at_raw: payload
                .get("access_token_token_expired")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Serializes token access for one `(app_key, base_url)` pair.
///
/// `get_token` holds an internal mutex for its whole duration, so any number
/// of concurrent callers arriving with an expired token trigger exactly one
/// credential exchange; the rest observe the refreshed token.
pub struct TokenManager {
    app_key: String,
    base_url: String,
    exchange: Arc<dyn CredentialExchange>,
    store: Arc<dyn TokenStore>,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        app_key: impl Into<String>,
        base_url: impl Into<String>,
        exchange: Arc<dyn CredentialExchange>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        TokenManager {
            app_key: app_key.into(),
            base_url: base_url.into(),
            exchange,
            store,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid token, refreshing through the credential exchange
    /// only when the cached and stored ones are absent or expired.
    pub async fn get_token(&self) -> Result<String, MarketDataError> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.revive_from_store().await;
        }
        let now = Utc::now().naive_utc();
        if let Some(token) = cached.as_ref() {
            if !token.is_expired(now) {
                return Ok(token.token.clone());
            }
            debug!("access token for {} is stale, refreshing", self.app_key);
        }

        let fresh = self.refresh(now).await?;
        let value = fresh.token.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drops the cached and stored token. The next `get_token` call will
    /// run a fresh credential exchange.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        *cached = None;
        if let Err(e) = self.store.delete(&self.app_key, &self.base_url).await {
            warn!("failed to delete stored access token: {e}");
        }
    }

    async fn refresh(&self, now: NaiveDateTime) -> Result<AccessToken, MarketDataError> {
        let issued = self.exchange.exchange().await?;
        let expired_at = resolve_expiry(now, issued.expired_at_raw.as_deref(), issued.expires_in);
        let token = AccessToken {
            token: issued.access_token.clone(),
            token_type: issued.token_type.clone(),
            expired_at,
        };

        let stored = StoredToken {
            access_token: issued.access_token,
            token_type: issued.token_type,
            expires_in: issued.expires_in,
            expired_at: Some(expired_at.format(TOKEN_TIMESTAMP_FORMAT).to_string()),
        };
        // Persistence is best effort; a usable token was still issued.
        if let Err(e) = self
            .store
            .upsert(&self.app_key, &self.base_url, &stored)
            .await
        {
            warn!("failed to persist access token: {e}");
        }

        Ok(token)
    }

    async fn revive_from_store(&self) -> Option<AccessToken> {
        let stored = match self.store.get(&self.app_key, &self.base_url).await {
            Ok(stored) => stored?,
            Err(e) => {
                debug!("token store read failed, treating as absent: {e}");
                return None;
            }
        };
        if stored.access_token.is_empty() {
            return None;
        }
        let expired_at = stored
            .expired_at
            .as_deref()
            .and_then(|raw| NaiveDateTime::parse_from_str(raw, TOKEN_TIMESTAMP_FORMAT).ok())
            .or_else(|| {
                stored
                    .expires_in
                    .map(|secs| Utc::now().naive_utc() + Duration::seconds(secs))
            })?;
        Some(AccessToken {
            token: stored.access_token,
            token_type: stored.token_type,
            expired_at,
        })
    }
}

/// Resolves the absolute expiry of a freshly issued token: the upstream's
/// absolute timestamp when parsable, else issuance plus the reported
/// relative lifetime, else issuance plus the default lifetime.
fn resolve_expiry(
    issued_at: NaiveDateTime,
    expired_at_raw: Option<&str>,
    expires_in: Option<i64>,
) -> NaiveDateTime {
    expired_at_raw
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, TOKEN_TIMESTAMP_FORMAT).ok())
        .unwrap_or_else(|| {
            issued_at + Duration::seconds(expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS))
        })
}
