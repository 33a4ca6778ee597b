//! Handlers for `ticks`, `history` and `assets`.

use std::path::Path;

use serde_json::json;
use tabled::Tabled;
use tokio::sync::mpsc;

use super::context::load_config;
use super::output::{self, format_epoch, Progress, Tone};
use crate::domain::{ActiveSymbol, Candle, Tick};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::port::outbound::broker::BrokerGateway;

#[derive(Tabled)]
struct CandleRow {
    #[tabled(rename = "Time (UTC)")]
    time: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Close")]
    close: String,
}

impl From<&Candle> for CandleRow {
    fn from(candle: &Candle) -> Self {
        Self {
            time: format_epoch(candle.timestamp(), candle.epoch, "%Y-%m-%d %H:%M"),
            open: candle.open.to_string(),
            high: candle.high.to_string(),
            low: candle.low.to_string(),
            close: candle.close.to_string(),
        }
    }
}

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Open")]
    open: &'static str,
}

impl From<&ActiveSymbol> for AssetRow {
    fn from(symbol: &ActiveSymbol) -> Self {
        Self {
            symbol: symbol.symbol.clone(),
            name: symbol.display_name.clone(),
            market: symbol.market.clone().unwrap_or_default(),
            open: if symbol.is_trading_suspended {
                "suspended"
            } else if symbol.exchange_is_open {
                "yes"
            } else {
                "no"
            },
        }
    }
}

/// Execute `ticks`: stream `count` ticks, then unsubscribe.
///
/// Market data needs no authorization, so no token is required.
pub async fn execute_ticks(config_path: &Path, symbol: &str, count: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let broker = bootstrap::build_broker(&config)?;
    let result = stream_ticks(broker.as_ref(), symbol, count).await;
    broker.disconnect().await;
    result
}

async fn stream_ticks(broker: &dyn BrokerGateway, symbol: &str, count: usize) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
    let progress = Progress::start(&format!("Subscribing to {symbol}..."));
    let id = match broker
        .subscribe_ticks(
            symbol,
            Box::new(move |tick| {
                let _ = tx.send(tick);
            }),
        )
        .await
    {
        Ok(id) => {
            progress.done(&format!("Streaming {symbol}"));
            id
        }
        Err(e) => {
            progress.failed(&format!("Could not subscribe to {symbol}"));
            return Err(e);
        }
    };

    let mut previous: Option<Tick> = None;
    let mut received = 0;
    while received < count {
        let Some(tick) = rx.recv().await else {
            output::say(Tone::Warn, "Tick stream ended early");
            break;
        };
        received += 1;
        output::tick(&tick, previous.as_ref());
        previous = Some(tick);
    }

    broker.unsubscribe(&id).await?;
    output::say(
        Tone::Hint,
        &format!("received {received} ticks, subscription {id} closed"),
    );
    Ok(())
}

/// Execute `history`. Like `ticks`, this needs no token.
pub async fn execute_history(
    config_path: &Path,
    symbol: &str,
    granularity: u32,
    last: Option<usize>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let broker = bootstrap::build_broker(&config)?;
    let result = broker.get_tick_history(symbol, granularity).await;
    broker.disconnect().await;

    let mut candles = result?;
    if let Some(last) = last {
        let skip = candles.len().saturating_sub(last);
        candles.drain(..skip);
    }

    if output::is_json() {
        output::report(
            "history",
            json!({ "symbol": symbol, "granularity": granularity, "candles": candles }),
        );
        return Ok(());
    }

    output::heading(&format!("{symbol} candles ({granularity}s)"));
    output::table(candles.iter().map(CandleRow::from), "(no candles)");
    Ok(())
}

/// Execute `assets`.
pub async fn execute_assets(
    config_path: &Path,
    market: Option<&str>,
    open_only: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let broker = bootstrap::build_broker(&config)?;
    let result = broker.get_trading_assets().await;
    broker.disconnect().await;

    let symbols: Vec<ActiveSymbol> = result?
        .into_iter()
        .filter(|symbol| market.map_or(true, |m| symbol.market.as_deref() == Some(m)))
        .filter(|symbol| !open_only || (symbol.exchange_is_open && !symbol.is_trading_suspended))
        .collect();

    if output::is_json() {
        output::report("assets", json!({ "symbols": symbols }));
        return Ok(());
    }

    output::heading("Tradable symbols");
    output::table(symbols.iter().map(AssetRow::from), "(no matching symbols)");
    if !symbols.is_empty() {
        output::say(Tone::Note, &format!("{} symbols", symbols.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn candle_row_formats_utc_time() {
        let row = CandleRow::from(&Candle {
            epoch: 1_700_000_000,
            open: dec!(1.1),
            high: dec!(1.3),
            low: dec!(1.0),
            close: dec!(1.2),
        });
        assert_eq!(row.time, "2023-11-14 22:13");
        assert_eq!(row.close, "1.2");
    }

    #[test]
    fn asset_row_reports_suspension_first() {
        let row = AssetRow::from(&ActiveSymbol {
            symbol: "R_100".into(),
            display_name: "Volatility 100 Index".into(),
            market: Some("synthetic_index".into()),
            submarket: None,
            exchange_is_open: true,
            is_trading_suspended: true,
            pip: None,
        });
        assert_eq!(row.open, "suspended");
        assert_eq!(row.market, "synthetic_index");
    }
}
