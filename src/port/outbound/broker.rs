//! Broker port: typed account, market-data and trading operations.
//!
//! This is the surface the application layer programs against. Error
//! envelopes from the broker surface as
//! [`GatewayError::Broker`](crate::error::GatewayError::Broker).

use async_trait::async_trait;

use crate::domain::{
    AccountEntry, AccountSwitch, ActiveSymbol, Authorization, Balance, Candle, SubscriptionId,
    Tick, TradeReceipt, TradeRequest,
};
use crate::error::Result;

/// Receives every tick of a subscription, in arrival order.
///
/// Runs on the connection's reader task; it must not block.
pub type TickHandler = Box<dyn FnMut(Tick) + Send>;

/// Receives every balance update of a subscription, in arrival order.
pub type BalanceHandler = Box<dyn FnMut(Balance) + Send>;

/// Typed broker operations.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Authorize the connection with an API token.
    async fn authorize(&self, token: &str) -> Result<Authorization>;

    /// Current balance of the authorized login.
    async fn get_account_balance(&self) -> Result<Balance>;

    /// All logins available to the authorized user.
    async fn get_account_list(&self) -> Result<Vec<AccountEntry>>;

    /// Make another login the active one.
    async fn switch_account(&self, loginid: &str) -> Result<AccountSwitch>;

    /// Stream ticks for a symbol until unsubscribed.
    async fn subscribe_ticks(&self, symbol: &str, handler: TickHandler) -> Result<SubscriptionId>;

    /// Stream balance updates until unsubscribed.
    async fn subscribe_balance(&self, handler: BalanceHandler) -> Result<SubscriptionId>;

    /// Stop a stream. Returns whether the subscription was known locally.
    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<bool>;

    /// The latest 100 candles for a symbol.
    async fn get_tick_history(&self, symbol: &str, granularity: u32) -> Result<Vec<Candle>>;

    /// Buy a contract.
    async fn place_trade(&self, request: &TradeRequest) -> Result<TradeReceipt>;

    /// Symbols currently offered for trading.
    async fn get_trading_assets(&self) -> Result<Vec<ActiveSymbol>>;

    /// Round-trip a keepalive through the broker.
    async fn ping(&self) -> Result<()>;

    /// Tear the connection down, failing anything still in flight.
    async fn disconnect(&self);

    /// Broker name for logging.
    fn broker_name(&self) -> &'static str;
}
