//! Market data types: ticks, candles and tradable symbols.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::flag;

/// Candle granularities (seconds) the broker accepts for `ticks_history`.
pub const CANDLE_GRANULARITIES: [u32; 12] = [
    60, 120, 180, 300, 600, 900, 1800, 3600, 7200, 14400, 28800, 86400,
];

/// Check whether a granularity is one the broker serves candles for.
#[must_use]
pub fn is_supported_granularity(seconds: u32) -> bool {
    CANDLE_GRANULARITIES.contains(&seconds)
}

fn timestamp(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
}

/// A single price tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub quote: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Seconds since the Unix epoch.
    pub epoch: i64,
    #[serde(default)]
    pub pip_size: Option<u32>,
    /// Stream id, echoed inside the tick by the broker.
    #[serde(default)]
    pub id: Option<String>,
}

impl Tick {
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        timestamp(self.epoch)
    }

    /// Ask minus bid, when both sides are quoted.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.ask? - self.bid?)
    }
}

/// One OHLC candle from `ticks_history` with `style: candles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub epoch: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        timestamp(self.epoch)
    }
}

/// A symbol from `active_symbols`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSymbol {
    pub symbol: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub submarket: Option<String>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub exchange_is_open: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_trading_suspended: bool,
    #[serde(default)]
    pub pip: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn tick_decodes_and_computes_spread() {
        let tick: Tick = serde_json::from_value(json!({
            "symbol": "frxEURUSD",
            "quote": 1.08512,
            "bid": 1.0851,
            "ask": 1.08514,
            "epoch": 1_700_000_000,
            "pip_size": 5,
            "id": "sub123"
        }))
        .unwrap();

        assert_eq!(tick.quote, dec!(1.08512));
        assert_eq!(tick.spread(), Some(dec!(0.00004)));
        assert_eq!(tick.timestamp().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn tick_without_bid_has_no_spread() {
        let tick: Tick =
            serde_json::from_value(json!({"symbol": "R_100", "quote": 1234.5, "epoch": 1}))
                .unwrap();
        assert_eq!(tick.spread(), None);
    }

    #[test]
    fn supported_granularities() {
        assert!(is_supported_granularity(60));
        assert!(is_supported_granularity(86400));
        assert!(!is_supported_granularity(0));
        assert!(!is_supported_granularity(45));
    }

    #[test]
    fn active_symbol_flags_decode() {
        let symbol: ActiveSymbol = serde_json::from_value(json!({
            "symbol": "frxEURUSD",
            "display_name": "EUR/USD",
            "market": "forex",
            "exchange_is_open": 1,
            "is_trading_suspended": 0,
            "pip": 0.00001
        }))
        .unwrap();
        assert!(symbol.exchange_is_open);
        assert!(!symbol.is_trading_suspended);
        assert_eq!(symbol.pip, Some(dec!(0.00001)));
    }
}
