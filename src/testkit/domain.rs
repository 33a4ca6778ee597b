//! Builders for broker payloads and domain values used across tests.
//!
//! The JSON builders return just the payload part of a frame; pair them with
//! [`ServerConnection::respond`](super::transport::ServerConnection::respond)
//! which adds `req_id`, `echo_req` and `msg_type`.

use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::domain::{Basis, DurationUnit, TradeRequest};

/// `authorize` payload for `loginid` with a real and a demo login.
pub fn authorize_payload(loginid: &str) -> Value {
    json!({
        "authorize": {
            "loginid": loginid,
            "user_id": 9_000_001,
            "email": "trader@example.com",
            "fullname": "Test Trader",
            "currency": "USD",
            "balance": 10_000,
            "is_virtual": u8::from(loginid.starts_with("VR")),
            "landing_company_name": "svg",
            "account_list": [
                {"loginid": "CR9000001", "currency": "USD", "is_virtual": 0, "is_disabled": 0},
                {"loginid": "VRTC9000002", "currency": "USD", "is_virtual": 1, "is_disabled": 0}
            ]
        }
    })
}

/// Error payload as the broker sends it.
pub fn error_payload(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

/// `balance` payload, optionally opening a stream with `subscription`.
pub fn balance_payload(amount: f64, subscription: Option<&str>) -> Value {
    let mut payload = json!({
        "balance": {
            "balance": amount,
            "currency": "USD",
            "loginid": "CR9000001",
            "id": subscription,
        }
    });
    if let Some(id) = subscription {
        payload["subscription"] = json!({ "id": id });
    }
    payload
}

/// A tick stream frame for `subscription`.
///
/// Stream frames carry no `req_id`, so push these directly.
pub fn tick_frame(subscription: &str, symbol: &str, quote: f64, epoch: i64) -> Value {
    json!({
        "msg_type": "tick",
        "subscription": { "id": subscription },
        "tick": {
            "symbol": symbol,
            "quote": quote,
            "epoch": epoch,
            "pip_size": 2,
            "id": subscription,
        }
    })
}

/// `n` one-minute candles starting at `start`.
pub fn candles_payload(n: usize, start: i64) -> Value {
    let candles: Vec<Value> = (0..n)
        .map(|i| {
            let base = 100.0 + i as f64;
            json!({
                "epoch": start + 60 * i as i64,
                "open": base,
                "high": base + 0.5,
                "low": base - 0.5,
                "close": base + 0.25,
            })
        })
        .collect();
    json!({ "candles": candles })
}

/// `buy` payload for a contract.
pub fn buy_payload(contract_id: u64, payout: f64) -> Value {
    json!({
        "buy": {
            "contract_id": contract_id,
            "transaction_id": contract_id + 100_000,
            "buy_price": 10,
            "payout": payout,
            "balance_after": 9_990,
            "longcode": "Win payout if the exit spot is strictly higher than the entry spot.",
            "purchase_time": 1_700_000_000,
        }
    })
}

/// A valid rise contract on `symbol`.
pub fn trade_request(symbol: &str, amount: Decimal) -> TradeRequest {
    TradeRequest {
        amount,
        basis: Basis::Stake,
        currency: "USD".into(),
        duration: 5,
        duration_unit: DurationUnit::Ticks,
        symbol: symbol.into(),
        contract_type: "CALL".into(),
    }
}
