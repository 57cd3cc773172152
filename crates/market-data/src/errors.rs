//! Error types for brokerage market data access.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to the brokerage API.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Credential exchange failed or the upstream refused the credentials.
    #[error("Credential error: {0}")]
    Credential(String),

    /// The upstream answered, but with a failure. Carries the HTTP status
    /// (when the failure was at the transport level) and the raw payload so
    /// callers can surface upstream diagnostics.
    #[error("Upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        payload: Value,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    /// A required configuration value is absent.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl MarketDataError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>, payload: Value) -> Self {
        MarketDataError::Upstream {
            status,
            message: message.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_error_keeps_payload() {
        let err = MarketDataError::upstream(
            Some(500),
            "upstream request failed",
            json!({"msg1": "server busy"}),
        );
        match err {
            MarketDataError::Upstream {
                status, payload, ..
            } => {
                assert_eq!(status, Some(500));
                assert_eq!(payload["msg1"], "server busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
