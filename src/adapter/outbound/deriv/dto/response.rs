//! Inbound envelope decoding.
//!
//! Every inbound frame is a JSON object. Envelope keys (`req_id`,
//! `msg_type`, `echo_req`, `subscription`) are lifted into [`Envelope`];
//! the rest is decoded into exactly one [`Response`] variant. An `error`
//! key wins over any payload field sent alongside it.
//!
//! ```json
//! {"msg_type":"tick","req_id":3,"subscription":{"id":"sub123"},
//!  "tick":{"symbol":"R_100","quote":1234.56,"epoch":1700000000}}
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{
    AccountEntry, AccountSwitch, ActiveSymbol, Authorization, Balance, BrokerFault, Candle,
    RequestId, SubscriptionId, Tick, TradeReceipt,
};
use crate::error::GatewayError;

/// Keys that frame a payload rather than carry one.
const ENVELOPE_KEYS: [&str; 5] = ["req_id", "msg_type", "echo_req", "subscription", "passthrough"];

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Echo of the request identifier, absent on pure stream frames.
    pub req_id: Option<RequestId>,
    pub msg_type: Option<String>,
    /// Stream identifier, present on acks and every stream frame.
    pub subscription: Option<SubscriptionId>,
    pub body: Response,
}

/// The payload of an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Error(BrokerFault),
    Authorize(Authorization),
    Balance(Balance),
    AccountList(Vec<AccountEntry>),
    AccountSwitch(AccountSwitch),
    Tick(Tick),
    Candles(Vec<Candle>),
    Buy(TradeReceipt),
    ActiveSymbols(Vec<ActiveSymbol>),
    Forget(bool),
    Pong,
    /// Nothing besides envelope keys, e.g. a bare subscription acknowledgement.
    Ack,
    /// A known payload field with a shape we could not decode.
    Malformed {
        field: &'static str,
        reason: String,
    },
    Unknown(Value),
}

impl Response {
    /// Variant name, for logging and mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Authorize(_) => "authorize",
            Self::Balance(_) => "balance",
            Self::AccountList(_) => "account_list",
            Self::AccountSwitch(_) => "account_switch",
            Self::Tick(_) => "tick",
            Self::Candles(_) => "candles",
            Self::Buy(_) => "buy",
            Self::ActiveSymbols(_) => "active_symbols",
            Self::Forget(_) => "forget",
            Self::Pong => "pong",
            Self::Ack => "ack",
            Self::Malformed { .. } => "malformed",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Mismatch error for a facade that expected `expected`.
    #[must_use]
    pub fn unexpected(&self, expected: &'static str) -> GatewayError {
        let got = match self {
            Self::Malformed { field, reason } => format!("malformed {field}: {reason}"),
            other => other.kind().to_string(),
        };
        GatewayError::UnexpectedResponse { expected, got }
    }

    fn decode(map: &serde_json::Map<String, Value>, whole: &Value) -> Self {
        if let Some(error) = map.get("error") {
            return Self::Error(BrokerFault::from_value(error));
        }
        if let Some(value) = map.get("authorize") {
            return typed("authorize", value, Self::Authorize);
        }
        if let Some(value) = map.get("balance") {
            return typed("balance", value, Self::Balance);
        }
        if let Some(value) = map.get("account_list") {
            return typed("account_list", value, Self::AccountList);
        }
        if let Some(value) = map.get("account_switch") {
            // Some servers acknowledge with a bare flag.
            if !value.is_object() {
                return Self::AccountSwitch(AccountSwitch::default());
            }
            return typed("account_switch", value, Self::AccountSwitch);
        }
        if let Some(value) = map.get("tick") {
            return typed("tick", value, Self::Tick);
        }
        if let Some(value) = map.get("candles") {
            return typed("candles", value, Self::Candles);
        }
        if let Some(value) = map.get("buy") {
            return typed("buy", value, Self::Buy);
        }
        if let Some(value) = map.get("active_symbols") {
            return typed("active_symbols", value, Self::ActiveSymbols);
        }
        if let Some(value) = map.get("forget") {
            return match value {
                Value::Bool(done) => Self::Forget(*done),
                Value::Number(n) => Self::Forget(n.as_u64() == Some(1)),
                _ => Self::Malformed {
                    field: "forget",
                    reason: format!("expected 0/1, got {value}"),
                },
            };
        }
        if map.contains_key("ping") {
            return Self::Pong;
        }
        if map.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str())) {
            return Self::Ack;
        }
        Self::Unknown(whole.clone())
    }
}

fn typed<T: DeserializeOwned>(
    field: &'static str,
    value: &Value,
    wrap: impl FnOnce(T) -> Response,
) -> Response {
    match T::deserialize(value) {
        Ok(payload) => wrap(payload),
        Err(e) => Response::Malformed {
            field,
            reason: e.to_string(),
        },
    }
}

impl Envelope {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Parse`] if the frame is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| GatewayError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Decode an already parsed frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Parse`] if the value is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, GatewayError> {
        let Some(map) = value.as_object() else {
            return Err(GatewayError::Parse(format!(
                "expected a JSON object, got {value}"
            )));
        };

        Ok(Self {
            req_id: map.get("req_id").and_then(Value::as_u64).map(RequestId::new),
            msg_type: map
                .get("msg_type")
                .and_then(Value::as_str)
                .map(str::to_string),
            subscription: map
                .get("subscription")
                .and_then(|s| s.get("id"))
                .and_then(Value::as_str)
                .map(SubscriptionId::new),
            body: Response::decode(map, value),
        })
    }

    /// True when the frame carries nothing but envelope keys.
    #[must_use]
    pub const fn is_ack(&self) -> bool {
        matches!(self.body, Response::Ack)
    }

    #[must_use]
    pub const fn fault(&self) -> Option<&BrokerFault> {
        match &self.body {
            Response::Error(fault) => Some(fault),
            _ => None,
        }
    }

    /// Turn an error envelope into [`GatewayError::Broker`].
    ///
    /// # Errors
    ///
    /// Returns the broker's code and message if the envelope is an error.
    pub fn into_result(self) -> Result<Self, GatewayError> {
        match self.body {
            Response::Error(fault) => Err(GatewayError::Broker {
                code: fault.code,
                message: fault.message,
            }),
            _ => Ok(self),
        }
    }
}
