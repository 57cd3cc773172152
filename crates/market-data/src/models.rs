//! Core data types shared by the brokerage client and the domain layer.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A venue a quote can be requested from.
///
/// `Krx` is the primary domestic venue and `Nxt` the alternate one; `Unified`
/// asks the upstream for its merged view of both. `Nas` and `Nys` are the
/// supported overseas exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Venue {
    Krx,
    Nxt,
    Unified,
    Nas,
    Nys,
}

impl Venue {
    /// The market division code the upstream expects, also used as the
    /// cache key segment for stored quotes.
    pub const fn market_code(self) -> &'static str {
        match self {
            Venue::Krx => "J",
            Venue::Nxt => "NX",
            Venue::Unified => "UN",
            Venue::Nas => "NAS",
            Venue::Nys => "NYS",
        }
    }

    pub const fn is_overseas(self) -> bool {
        matches!(self, Venue::Nas | Venue::Nys)
    }

    /// Resolves an overseas exchange label (`"NAS"`, `"NYS"`) to a venue.
    pub fn overseas_from_code(code: &str) -> Option<Venue> {
        match code.trim().to_ascii_uppercase().as_str() {
            "NAS" => Some(Venue::Nas),
            "NYS" => Some(Venue::Nys),
            _ => None,
        }
    }

    /// Parses a domestic market division code (`J`/`NX`/`UN`).
    pub fn from_market_code(code: &str) -> Option<Venue> {
        match code.trim().to_ascii_uppercase().as_str() {
            "J" => Some(Venue::Krx),
            "NX" => Some(Venue::Nxt),
            "UN" => Some(Venue::Unified),
            _ => None,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Venue::Krx => "KRX",
            Venue::Nxt => "NXT",
            Venue::Unified => "UN",
            Venue::Nas => "NAS",
            Venue::Nys => "NYS",
        };
        write!(f, "{label}")
    }
}

/// Market classification carried by instrument reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketKind {
    Kospi,
    Kosdaq,
    Us,
}

impl MarketKind {
    pub fn from_code(code: &str) -> Option<MarketKind> {
        match code.trim().to_ascii_uppercase().as_str() {
            "KOSPI" => Some(MarketKind::Kospi),
            "KOSDAQ" => Some(MarketKind::Kosdaq),
            "US" => Some(MarketKind::Us),
            _ => None,
        }
    }

    pub const fn is_overseas(self) -> bool {
        matches!(self, MarketKind::Us)
    }
}

/// Chart aggregation period for periodic price queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const fn as_code(self) -> &'static str {
        match self {
            Period::Day => "D",
            Period::Week => "W",
            Period::Month => "M",
            Period::Year => "Y",
        }
    }

    pub fn from_code(code: &str) -> Option<Period> {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" => Some(Period::Day),
            "W" => Some(Period::Week),
            "M" => Some(Period::Month),
            "Y" => Some(Period::Year),
            _ => None,
        }
    }
}

/// Instrument reference data used to route a fetch to the right market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub code: String,
    pub standard_code: Option<String>,
    pub name: Option<String>,
    pub market: Option<MarketKind>,
    pub exchange: Option<String>,
}

impl Instrument {
    /// Resolves the overseas venue: the explicit exchange label wins, else
    /// the first three characters of the standard code.
    pub fn overseas_venue(&self) -> Option<Venue> {
        if let Some(exchange) = self.exchange.as_deref() {
            if let Some(venue) = Venue::overseas_from_code(exchange) {
                return Some(venue);
            }
        }
        self.standard_code
            .as_deref()
            .and_then(|code| code.get(..3))
            .and_then(Venue::overseas_from_code)
    }
}

/// A normalized quote. Upstream payloads carry numbers as strings; they are
/// parsed into `Decimal` here, at the boundary, so everything downstream
/// works with typed values. The untouched upstream output is kept in
/// `extra` for callers that need fields outside the normalized set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_rate: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub extra: Value,
}

impl Quote {
    /// Builds a quote from the domestic current-price `output` block.
    pub fn from_domestic_output(output: &Value) -> Quote {
        Quote {
            last: decimal_field(output, "stck_prpr"),
            change: decimal_field(output, "prdy_vrss"),
            change_rate: decimal_field(output, "prdy_ctrt"),
            volume: decimal_field(output, "acml_vol"),
            extra: output.clone(),
        }
    }

    /// Builds a quote from the overseas price-detail `output` block.
    ///
    /// The overseas endpoint does not return change figures directly; they
    /// are derived from `last` and `base` (previous close), rounded to four
    /// and two decimal places respectively.
    pub fn from_overseas_output(output: &Value) -> Quote {
        let last = decimal_field(output, "last");
        let base = decimal_field(output, "base");
        let change = match (last, base) {
            (Some(l), Some(b)) => Some((l - b).round_dp(4)),
            _ => None,
        };
        let change_rate = match (last, base) {
            (Some(l), Some(b)) if !b.is_zero() => {
                Some(((l - b) / b * Decimal::from(100)).round_dp(2))
            }
            _ => None,
        };
        Quote {
            last,
            change,
            change_rate,
            volume: decimal_field(output, "tvol"),
            extra: output.clone(),
        }
    }

    pub fn has_price(&self) -> bool {
        self.last.is_some()
    }
}

/// Reads a decimal field that the upstream may encode as a string or a
/// bare number. Empty strings and unparsable values become `None`.
pub fn decimal_field(output: &Value, key: &str) -> Option<Decimal> {
    match output.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .or_else(|| n.as_i64().map(Decimal::from)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn domestic_output_parses_string_numbers() {
        let output = json!({
            "stck_prpr": "72000",
            "prdy_vrss": "-500",
            "prdy_ctrt": "-0.69",
            "acml_vol": "1500000",
            "stck_mxpr": "93600"
        });
        let quote = Quote::from_domestic_output(&output);
        assert_eq!(quote.last, Some(dec!(72000)));
        assert_eq!(quote.change, Some(dec!(-500)));
        assert_eq!(quote.change_rate, Some(dec!(-0.69)));
        assert_eq!(quote.volume, Some(dec!(1500000)));
        assert_eq!(quote.extra["stck_mxpr"], "93600");
    }

    #[test]
    fn empty_and_missing_fields_become_none() {
        let output = json!({"stck_prpr": "", "prdy_vrss": "abc"});
        let quote = Quote::from_domestic_output(&output);
        assert_eq!(quote.last, None);
        assert_eq!(quote.change, None);
        assert_eq!(quote.volume, None);
        assert!(!quote.has_price());
    }

    #[test]
    fn overseas_output_derives_change_figures() {
        let output = json!({"last": "412.50", "base": "410.00", "tvol": "1000000"});
        let quote = Quote::from_overseas_output(&output);
        assert_eq!(quote.last, Some(dec!(412.50)));
        assert_eq!(quote.change, Some(dec!(2.5000)));
        assert_eq!(quote.change_rate, Some(dec!(0.61)));
        assert_eq!(quote.volume, Some(dec!(1000000)));
    }

    #[test]
    fn overseas_zero_base_has_no_rate() {
        let output = json!({"last": "10", "base": "0"});
        let quote = Quote::from_overseas_output(&output);
        assert_eq!(quote.change, Some(dec!(10)));
        assert_eq!(quote.change_rate, None);
    }

    #[test]
    fn venue_codes_round_trip() {
        assert_eq!(Venue::Krx.market_code(), "J");
        assert_eq!(Venue::Nxt.market_code(), "NX");
        assert_eq!(Venue::from_market_code("nx"), Some(Venue::Nxt));
        assert_eq!(Venue::from_market_code("X"), None);
        assert_eq!(Venue::overseas_from_code("NAS"), Some(Venue::Nas));
        assert_eq!(Venue::overseas_from_code("LSE"), None);
        assert!(Venue::Nas.is_overseas());
        assert!(!Venue::Krx.is_overseas());
    }

    #[test]
    fn overseas_venue_prefers_explicit_exchange() {
        let instrument = Instrument {
            code: "TSLA".into(),
            standard_code: Some("NYS0001".into()),
            name: None,
            market: Some(MarketKind::Us),
            exchange: Some("NAS".into()),
        };
        assert_eq!(instrument.overseas_venue(), Some(Venue::Nas));
    }

    #[test]
    fn overseas_venue_falls_back_to_standard_code_prefix() {
        let instrument = Instrument {
            code: "KO".into(),
            standard_code: Some("NYS0042".into()),
            name: None,
            market: Some(MarketKind::Us),
            exchange: None,
        };
        assert_eq!(instrument.overseas_venue(), Some(Venue::Nys));

        let unknown = Instrument {
            code: "X".into(),
            standard_code: Some("ZZ".into()),
            name: None,
            market: Some(MarketKind::Us),
            exchange: None,
        };
        assert_eq!(unknown.overseas_venue(), None);
    }

    #[test]
    fn overseas_venue_tolerates_multibyte_standard_codes() {
        // Reference data is externally owned; a prefix that is not a
        // valid three-byte slice must be unresolvable, not a panic.
        let instrument = Instrument {
            code: "X".into(),
            standard_code: Some("a한국".into()),
            name: None,
            market: Some(MarketKind::Us),
            exchange: None,
        };
        assert_eq!(instrument.overseas_venue(), None);
    }

    #[test]
    fn period_codes() {
        assert_eq!(Period::from_code("d"), Some(Period::Day));
        assert_eq!(Period::from_code("Q"), None);
        assert_eq!(Period::Month.as_code(), "M");
    }
}
