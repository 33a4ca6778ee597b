//! Broker-facing domain types.
//!
//! Everything here is plain data decoded from or encoded to the broker's
//! payloads. Wire framing (`req_id`, `subscription`, envelopes) lives in the
//! Deriv adapter.

pub mod account;
pub mod currency;
pub mod fault;
pub mod id;
pub mod market;
pub mod trade;

mod flag;

pub use account::{AccountEntry, AccountSwitch, Authorization, Balance};
pub use fault::BrokerFault;
pub use id::{RequestId, SubscriptionId};
pub use market::{ActiveSymbol, Candle, Tick};
pub use trade::{Basis, DurationUnit, TradeReceipt, TradeRequest};
