//! HTTP client for the brokerage REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use crate::auth::{HttpCredentialExchange, TokenManager, TokenStore};
use crate::config::BrokerConfig;
use crate::errors::MarketDataError;
use crate::models::{Period, Venue};
use crate::provider::PriceProvider;

const REQUEST_TIMEOUT_SECS: u64 = 30;

const DOMESTIC_PRICE_ENDPOINT: &str = "/uapi/domestic-stock/v1/quotations/inquire-price";
const DOMESTIC_PRICE_TR_ID: &str = "FHKST01010100";

const OVERSEAS_PRICE_ENDPOINT: &str = "/uapi/overseas-price/v1/quotations/price-detail";
const OVERSEAS_PRICE_TR_ID: &str = "HHDFS76200200";

const PERIODIC_PRICE_ENDPOINT: &str =
    "/uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice";
const PERIODIC_PRICE_TR_ID: &str = "FHKST03010100";

/// Authenticated client for the brokerage quotation endpoints.
///
/// Every request goes out with a bearer token obtained from the embedded
/// [`TokenManager`], which refreshes lazily and serialized.
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
    tokens: TokenManager,
}

impl BrokerClient {
    pub fn new(
        config: &BrokerConfig,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, MarketDataError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = config.base_url().to_string();
        let exchange = Arc::new(HttpCredentialExchange::new(
            http.clone(),
            base_url.clone(),
            config.app_key.clone(),
            config.app_secret.clone(),
        ));
        let tokens = TokenManager::new(
            config.app_key.clone(),
            base_url.clone(),
            exchange,
            token_store,
        );
        Ok(BrokerClient {
            http,
            base_url,
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            tokens,
        })
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Drops the current token and exchanges credentials for a new one.
    pub async fn refresh_token(&self) -> Result<String, MarketDataError> {
        self.tokens.invalidate().await;
        self.tokens.get_token().await
    }

    async fn get_json(
        &self,
        endpoint: &str,
        tr_id: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, MarketDataError> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {endpoint} tr_id={tr_id}");

        let response = self
            .http
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .header("appkey", &self.app_key)
            .header("appsecret", &self.app_secret)
            .header("tr_id", tr_id)
            .header("custtype", "P")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // Error bodies are not always JSON; keep the raw text around either
        // way so failures stay diagnosable.
        let payload: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw_response": text }));

        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // The token was rejected; the next call will exchange anew.
                self.tokens.invalidate().await;
            }
            return Err(MarketDataError::upstream(
                Some(status.as_u16()),
                format!("upstream request failed with status {status}"),
                payload,
            ));
        }
        check_result_code(payload)
    }
}

/// HTTP 200 does not mean success: the application-level result code
/// (`rt_cd`) must be `"0"`, otherwise the payload describes a domain
/// failure such as an unknown stock code.
fn check_result_code(payload: Value) -> Result<Value, MarketDataError> {
    match payload.get("rt_cd").and_then(Value::as_str) {
        Some("0") => Ok(payload),
        _ => {
            let message = payload
                .get("msg1")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|msg| !msg.is_empty())
                .unwrap_or("upstream returned a failure result code")
                .to_string();
            Err(MarketDataError::upstream(None, message, payload))
        }
    }
}

#[async_trait]
impl PriceProvider for BrokerClient {
    async fn domestic_price(&self, code: &str, venue: Venue) -> Result<Value, MarketDataError> {
        self.get_json(
            DOMESTIC_PRICE_ENDPOINT,
            DOMESTIC_PRICE_TR_ID,
            &[
                ("fid_cond_mrkt_div_code", venue.market_code()),
                ("fid_input_iscd", code),
            ],
        )
        .await
    }

    async fn overseas_price(
        &self,
        exchange: Venue,
        symbol: &str,
    ) -> Result<Value, MarketDataError> {
        self.get_json(
            OVERSEAS_PRICE_ENDPOINT,
            OVERSEAS_PRICE_TR_ID,
            &[
                ("AUTH", ""),
                ("EXCD", exchange.market_code()),
                ("SYMB", symbol),
            ],
        )
        .await
    }

    async fn periodic_prices(
        &self,
        code: &str,
        venue: Venue,
        start_date: &str,
        end_date: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<Value, MarketDataError> {
        self.get_json(
            PERIODIC_PRICE_ENDPOINT,
            PERIODIC_PRICE_TR_ID,
            &[
                ("fid_cond_mrkt_div_code", venue.market_code()),
                ("fid_input_iscd", code),
                ("fid_input_date_1", start_date),
                ("fid_input_date_2", end_date),
                ("fid_period_div_code", period.as_code()),
                ("fid_org_adj_prc", if adjusted { "0" } else { "1" }),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_result_code_passes_payload_through() {
        let payload = json!({"rt_cd": "0", "output": {"stck_prpr": "72000"}});
        let checked = check_result_code(payload).unwrap();
        assert_eq!(checked["output"]["stck_prpr"], "72000");
    }

    #[test]
    fn nonzero_result_code_is_an_upstream_error() {
        let payload = json!({"rt_cd": "1", "msg1": "invalid stock code", "msg_cd": "40100000"});
        match check_result_code(payload) {
            Err(MarketDataError::Upstream {
                status,
                message,
                payload,
            }) => {
                assert_eq!(status, None);
                assert_eq!(message, "invalid stock code");
                assert_eq!(payload["msg_cd"], "40100000");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_result_code_is_an_upstream_error() {
        assert!(check_result_code(json!({"output": {}})).is_err());
    }
}
