//! Outbound request shapes.
//!
//! Every request is a flat JSON object whose first key names the operation.
//! The gateway injects `req_id` (and `subscribe: 1` for streams) when the
//! request is framed into an [`OutboundMessage`].
//!
//! ```json
//! {"ticks_history":"R_100","adjust_start_time":1,"count":100,"granularity":60,
//!  "style":"candles","end_type":"latest","req_id":7}
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{Basis, DurationUnit, RequestId, SubscriptionId, TradeRequest};
use crate::error::GatewayError;

/// Number of candles requested by [`Request::ticks_history`].
pub const HISTORY_COUNT: u32 = 100;

/// A typed broker request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Request {
    Authorize {
        authorize: String,
    },
    Balance {
        balance: u8,
        subscribe: u8,
    },
    AccountList {
        account_list: u8,
    },
    AccountSwitch {
        account_switch: u8,
        loginid: String,
    },
    Ticks {
        ticks: String,
    },
    TicksHistory {
        ticks_history: String,
        adjust_start_time: u8,
        count: u32,
        granularity: u32,
        style: &'static str,
        end_type: &'static str,
    },
    Buy(BuyRequest),
    ActiveSymbols {
        active_symbols: &'static str,
        product_type: &'static str,
    },
    Forget {
        forget: String,
    },
    Ping {
        ping: u8,
    },
}

/// Flat contract purchase, `{buy: 1, amount, basis, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyRequest {
    pub buy: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub basis: Basis,
    pub currency: String,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    pub symbol: String,
    pub contract_type: String,
}

impl Request {
    pub fn authorize(token: impl Into<String>) -> Self {
        Self::Authorize {
            authorize: token.into(),
        }
    }

    /// Balance query. The broker always opens a balance stream for this shape.
    #[must_use]
    pub const fn balance() -> Self {
        Self::Balance {
            balance: 1,
            subscribe: 1,
        }
    }

    #[must_use]
    pub const fn account_list() -> Self {
        Self::AccountList { account_list: 1 }
    }

    pub fn account_switch(loginid: impl Into<String>) -> Self {
        Self::AccountSwitch {
            account_switch: 1,
            loginid: loginid.into(),
        }
    }

    pub fn ticks(symbol: impl Into<String>) -> Self {
        Self::Ticks {
            ticks: symbol.into(),
        }
    }

    /// The latest [`HISTORY_COUNT`] candles at `granularity` seconds.
    pub fn ticks_history(symbol: impl Into<String>, granularity: u32) -> Self {
        Self::TicksHistory {
            ticks_history: symbol.into(),
            adjust_start_time: 1,
            count: HISTORY_COUNT,
            granularity,
            style: "candles",
            end_type: "latest",
        }
    }

    #[must_use]
    pub fn buy(trade: &TradeRequest) -> Self {
        Self::Buy(BuyRequest {
            buy: 1,
            amount: trade.amount,
            basis: trade.basis,
            currency: trade.currency.clone(),
            duration: trade.duration,
            duration_unit: trade.duration_unit,
            symbol: trade.symbol.clone(),
            contract_type: trade.contract_type.clone(),
        })
    }

    #[must_use]
    pub const fn active_symbols() -> Self {
        Self::ActiveSymbols {
            active_symbols: "brief",
            product_type: "basic",
        }
    }

    #[must_use]
    pub fn forget(id: &SubscriptionId) -> Self {
        Self::Forget {
            forget: id.as_str().to_string(),
        }
    }

    #[must_use]
    pub const fn ping() -> Self {
        Self::Ping { ping: 1 }
    }

    /// Operation name, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authorize { .. } => "authorize",
            Self::Balance { .. } => "balance",
            Self::AccountList { .. } => "account_list",
            Self::AccountSwitch { .. } => "account_switch",
            Self::Ticks { .. } => "ticks",
            Self::TicksHistory { .. } => "ticks_history",
            Self::Buy(_) => "buy",
            Self::ActiveSymbols { .. } => "active_symbols",
            Self::Forget { .. } => "forget",
            Self::Ping { .. } => "ping",
        }
    }
}

/// A request framed for the wire.
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    pub req_id: RequestId,
    pub subscribe: bool,
    pub request: &'a Request,
}

impl<'a> OutboundMessage<'a> {
    #[must_use]
    pub const fn new(req_id: RequestId, request: &'a Request) -> Self {
        Self {
            req_id,
            subscribe: false,
            request,
        }
    }

    #[must_use]
    pub const fn streaming(req_id: RequestId, request: &'a Request) -> Self {
        Self {
            req_id,
            subscribe: true,
            request,
        }
    }

    /// Serialize to the JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the request does not
    /// serialize to a JSON object.
    pub fn encode(&self) -> Result<String, GatewayError> {
        let invalid = |reason: String| GatewayError::InvalidRequest {
            field: "payload",
            reason,
        };

        let mut value = serde_json::to_value(self.request).map_err(|e| invalid(e.to_string()))?;
        let Value::Object(map) = &mut value else {
            return Err(invalid(format!("{} is not a JSON object", self.request.kind())));
        };
        if self.subscribe {
            map.insert("subscribe".into(), Value::from(1));
        }
        map.insert("req_id".into(), Value::from(self.req_id.get()));

        serde_json::to_string(&value).map_err(|e| invalid(e.to_string()))
    }
}
