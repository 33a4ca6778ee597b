//! Contract purchase types.
//!
//! A [`TradeRequest`] describes a contract to buy; the broker answers a
//! successful purchase with a [`TradeReceipt`].
//!
//! # Examples
//!
//! ```
//! use derivgate::domain::trade::{Basis, DurationUnit, TradeRequest};
//! use rust_decimal::Decimal;
//!
//! let request = TradeRequest {
//!     amount: Decimal::new(10, 0),
//!     basis: Basis::Stake,
//!     currency: "USD".into(),
//!     duration: 5,
//!     duration_unit: DurationUnit::Ticks,
//!     symbol: "R_100".into(),
//!     contract_type: "CALL".into(),
//! };
//!
//! assert!(request.validate().is_ok());
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Whether `amount` is the stake paid or the payout targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    Stake,
    Payout,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stake => write!(f, "stake"),
            Self::Payout => write!(f, "payout"),
        }
    }
}

/// Contract duration unit, as the broker's single-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "t")]
    Ticks,
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "d")]
    Days,
}

impl DurationUnit {
    /// The broker's wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ticks => "t",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A contract purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub amount: Decimal,
    pub basis: Basis,
    pub currency: String,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    pub symbol: String,
    /// Broker contract type, e.g. `CALL`, `PUT`, `DIGITEVEN`.
    pub contract_type: String,
}

impl TradeRequest {
    /// Reject requests the broker would refuse anyway.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] naming the first bad field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidRequest {
                field: "amount",
                reason: format!("must be positive, got {}", self.amount),
            });
        }
        if self.duration == 0 {
            return Err(GatewayError::InvalidRequest {
                field: "duration",
                reason: "must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            ("currency", &self.currency),
            ("symbol", &self.symbol),
            ("contract_type", &self.contract_type),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::InvalidRequest {
                    field,
                    reason: "cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Receipt for a purchased contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub contract_id: u64,
    pub transaction_id: u64,
    pub payout: Decimal,
    #[serde(default)]
    pub buy_price: Option<Decimal>,
    #[serde(default)]
    pub balance_after: Option<Decimal>,
    #[serde(default)]
    pub longcode: Option<String>,
    #[serde(default)]
    pub purchase_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request() -> TradeRequest {
        TradeRequest {
            amount: dec!(10),
            basis: Basis::Stake,
            currency: "USD".into(),
            duration: 5,
            duration_unit: DurationUnit::Ticks,
            symbol: "R_100".into(),
            contract_type: "CALL".into(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut req = request();
        req.amount = Decimal::ZERO;
        assert!(matches!(
            req.validate(),
            Err(GatewayError::InvalidRequest { field: "amount", .. })
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut req = request();
        req.duration = 0;
        assert!(matches!(
            req.validate(),
            Err(GatewayError::InvalidRequest { field: "duration", .. })
        ));
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let mut req = request();
        req.symbol = "  ".into();
        assert!(matches!(
            req.validate(),
            Err(GatewayError::InvalidRequest { field: "symbol", .. })
        ));
    }

    #[test]
    fn duration_unit_uses_single_letter_codes() {
        assert_eq!(serde_json::to_value(DurationUnit::Minutes).unwrap(), json!("m"));
        assert_eq!(DurationUnit::Ticks.to_string(), "t");
        assert_eq!(serde_json::to_value(Basis::Payout).unwrap(), json!("payout"));
    }

    #[test]
    fn receipt_decodes() {
        let receipt: TradeReceipt = serde_json::from_value(json!({
            "contract_id": 11_111,
            "transaction_id": 22_222,
            "payout": 19.55,
            "buy_price": 10,
            "longcode": "Win payout if ..."
        }))
        .unwrap();
        assert_eq!(receipt.contract_id, 11_111);
        assert_eq!(receipt.payout, dec!(19.55));
        assert_eq!(receipt.buy_price, Some(dec!(10)));
    }
}
