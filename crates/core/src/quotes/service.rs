//! Price fetching with a write-through cache.

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::{debug, warn};
use serde_json::Value;
use stockwatch_market_data::session::active_venues_now;
use stockwatch_market_data::{PriceProvider, Quote, Venue};

use crate::errors::{Error, Result};
use crate::quotes::freshness::{format_timestamp, is_fresh};
use crate::quotes::model::{BestPrice, CombinedQuote, PriceSource, PricedQuote, VenueOutcome};
use crate::quotes::store::{CachedQuote, QuoteCacheStore};

/// Orchestrates cache-versus-live price fetching for single venues and the
/// combined two-venue view.
pub struct PriceService {
    provider: Arc<dyn PriceProvider>,
    cache: Arc<dyn QuoteCacheStore>,
}

impl PriceService {
    pub fn new(provider: Arc<dyn PriceProvider>, cache: Arc<dyn QuoteCacheStore>) -> Self {
        PriceService { provider, cache }
    }

    /// Fetches the current price of a domestic instrument on one venue.
    ///
    /// With `use_cache`, a cached entry fresh under `max_age` is served and
    /// tagged [`PriceSource::Cache`]; otherwise the upstream is queried and
    /// the result written through before being returned as
    /// [`PriceSource::Live`].
    pub async fn get_quote(
        &self,
        code: &str,
        venue: Venue,
        use_cache: bool,
        max_age: Option<Duration>,
    ) -> Result<PricedQuote> {
        validate_code(code)?;
        validate_max_age(max_age)?;
        if venue.is_overseas() {
            return Err(Error::validation(format!(
                "venue {venue} is not a domestic venue"
            )));
        }

        if use_cache {
            if let Some(hit) = self.cached_quote(code, venue.market_code(), max_age).await? {
                debug!("cache hit for {code} on {venue}");
                return Ok(PricedQuote {
                    code: code.to_string(),
                    venue,
                    quote: hit.quote,
                    source: PriceSource::Cache,
                    updated_at: hit.updated_at,
                });
            }
        }

        let payload = self.provider.domestic_price(code, venue).await?;
        let quote = Quote::from_domestic_output(output_block(&payload));
        self.write_through(code, venue, quote).await
    }

    /// Fetches the current price of an overseas instrument, same contract
    /// as [`get_quote`](Self::get_quote). The cache key is the exchange
    /// code.
    pub async fn get_overseas_quote(
        &self,
        symbol: &str,
        exchange: Venue,
        use_cache: bool,
        max_age: Option<Duration>,
    ) -> Result<PricedQuote> {
        validate_code(symbol)?;
        validate_max_age(max_age)?;
        if !exchange.is_overseas() {
            return Err(Error::validation(format!(
                "venue {exchange} is not an overseas exchange"
            )));
        }

        if use_cache {
            if let Some(hit) = self
                .cached_quote(symbol, exchange.market_code(), max_age)
                .await?
            {
                debug!("cache hit for {symbol} on {exchange}");
                return Ok(PricedQuote {
                    code: symbol.to_string(),
                    venue: exchange,
                    quote: hit.quote,
                    source: PriceSource::Cache,
                    updated_at: hit.updated_at,
                });
            }
        }

        let payload = self.provider.overseas_price(exchange, symbol).await?;
        let quote = Quote::from_overseas_output(output_block(&payload));
        self.write_through(symbol, exchange, quote).await
    }

    /// Cache-only read: the entry, if present and fresh under `max_age`.
    /// Misses and stale entries are `None`, never errors.
    pub async fn cached_quote(
        &self,
        code: &str,
        venue_key: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<CachedQuote>> {
        let Some(entry) = self.cache.get(code, venue_key).await? else {
            return Ok(None);
        };
        let now = Utc::now().naive_utc();
        if is_fresh(Some(&entry.updated_at), max_age, now) {
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    /// Fetches both domestic venues concurrently and reconciles a best
    /// price. A failure on one venue is recorded on its outcome and never
    /// aborts the other.
    pub async fn combined_quote(
        &self,
        code: &str,
        use_cache: bool,
        max_age: Option<Duration>,
    ) -> Result<CombinedQuote> {
        validate_code(code)?;
        validate_max_age(max_age)?;

        let (krx, nxt) = tokio::join!(
            self.venue_outcome(code, Venue::Krx, use_cache, max_age),
            self.venue_outcome(code, Venue::Nxt, use_cache, max_age),
        );
        let best = reconcile_best(&krx, &nxt);

        Ok(CombinedQuote {
            code: code.to_string(),
            krx,
            nxt,
            best,
            active_venues: active_venues_now(),
        })
    }

    async fn venue_outcome(
        &self,
        code: &str,
        venue: Venue,
        use_cache: bool,
        max_age: Option<Duration>,
    ) -> VenueOutcome {
        match self.get_quote(code, venue, use_cache, max_age).await {
            Ok(priced) => VenueOutcome {
                venue,
                quote: Some(priced.quote),
                error: None,
            },
            Err(e) => {
                warn!("price fetch failed for {code} on {venue}: {e}");
                VenueOutcome {
                    venue,
                    quote: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn write_through(&self, code: &str, venue: Venue, quote: Quote) -> Result<PricedQuote> {
        let updated_at = format_timestamp(Utc::now().naive_utc());
        let entry = CachedQuote {
            quote: quote.clone(),
            updated_at: updated_at.clone(),
        };
        self.cache.put(code, venue.market_code(), &entry).await?;
        Ok(PricedQuote {
            code: code.to_string(),
            venue,
            quote,
            source: PriceSource::Live,
            updated_at,
        })
    }
}

fn output_block(payload: &Value) -> &Value {
    payload.get("output").unwrap_or(&Value::Null)
}

pub(crate) fn validate_code(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(Error::validation("stock code must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_max_age(max_age: Option<Duration>) -> Result<()> {
    if matches!(max_age, Some(age) if age < Duration::zero()) {
        return Err(Error::validation("max age must not be negative"));
    }
    Ok(())
}

/// Picks the venue to quote from the two outcomes.
///
/// A single usable venue wins outright. With both usable, the alternate
/// venue must show strictly greater cumulative volume to win; ties go to
/// the primary venue.
pub(crate) fn reconcile_best(krx: &VenueOutcome, nxt: &VenueOutcome) -> BestPrice {
    match (krx.usable_price(), nxt.usable_price()) {
        (Some(price), None) => BestPrice {
            venue: Some(Venue::Krx),
            price: Some(price),
        },
        (None, Some(price)) => BestPrice {
            venue: Some(Venue::Nxt),
            price: Some(price),
        },
        (None, None) => BestPrice::empty(),
        (Some(krx_price), Some(nxt_price)) => {
            if nxt.volume() > krx.volume() {
                BestPrice {
                    venue: Some(Venue::Nxt),
                    price: Some(nxt_price),
                }
            } else {
                BestPrice {
                    venue: Some(Venue::Krx),
                    price: Some(krx_price),
                }
            }
        }
    }
}
