//! Typed Deriv operations over the [`Gateway`].
//!
//! Each operation makes sure the connection is open, sends one request
//! shape, and turns the broker's answer into a domain type. Error envelopes
//! become [`GatewayError::Broker`]; any other payload kind becomes
//! [`GatewayError::UnexpectedResponse`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::dto::{Envelope, Request, Response};
use super::gateway::Gateway;
use super::settings::DerivConfig;
use super::transport::WebSocketConnector;
use crate::domain::market::is_supported_granularity;
use crate::domain::{
    AccountEntry, AccountSwitch, ActiveSymbol, Authorization, Balance, Candle, SubscriptionId,
    TradeReceipt, TradeRequest,
};
use crate::error::{GatewayError, Result};
use crate::port::outbound::broker::{BalanceHandler, BrokerGateway, TickHandler};
use crate::port::outbound::transport::Connector;

/// Deriv implementation of [`BrokerGateway`].
pub struct DerivClient {
    gateway: Gateway,
}

impl DerivClient {
    /// Client over the production WebSocket transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is invalid.
    pub fn new(config: &DerivConfig) -> Result<Self> {
        Self::with_connector(Arc::new(WebSocketConnector), config)
    }

    /// Client over any transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is invalid.
    pub fn with_connector(connector: Arc<dyn Connector>, config: &DerivConfig) -> Result<Self> {
        Ok(Self {
            gateway: Gateway::new(connector, config)?,
        })
    }

    /// The underlying connection manager.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    async fn call(&self, request: Request) -> Result<Envelope> {
        self.gateway.connect().await?;
        let envelope = self.gateway.send(&request).await?.into_result()?;
        Ok(envelope)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidRequest {
            field,
            reason: "cannot be empty".into(),
        }
        .into());
    }
    Ok(())
}

#[async_trait]
impl BrokerGateway for DerivClient {
    async fn authorize(&self, token: &str) -> Result<Authorization> {
        require("token", token)?;
        match self.call(Request::authorize(token)).await?.body {
            Response::Authorize(auth) => {
                info!(
                    loginid = %auth.loginid,
                    currency = %auth.currency,
                    accounts = auth.account_list.len(),
                    "Authorized"
                );
                Ok(auth)
            }
            other => Err(other.unexpected("authorize").into()),
        }
    }

    async fn get_account_balance(&self) -> Result<Balance> {
        let envelope = self.call(Request::balance()).await?;
        if let Some(stream) = &envelope.subscription {
            self.gateway.forget_orphan(stream).await;
        }
        match envelope.body {
            Response::Balance(balance) => Ok(balance),
            other => Err(other.unexpected("balance").into()),
        }
    }

    async fn get_account_list(&self) -> Result<Vec<AccountEntry>> {
        match self.call(Request::account_list()).await?.body {
            Response::AccountList(accounts) => Ok(accounts),
            other => Err(other.unexpected("account_list").into()),
        }
    }

    async fn switch_account(&self, loginid: &str) -> Result<AccountSwitch> {
        require("loginid", loginid)?;
        match self.call(Request::account_switch(loginid)).await?.body {
            Response::AccountSwitch(switch) => {
                info!(loginid, "Switched account");
                Ok(AccountSwitch {
                    loginid: switch.loginid.or_else(|| Some(loginid.to_string())),
                    ..switch
                })
            }
            other => Err(other.unexpected("account_switch").into()),
        }
    }

    async fn subscribe_ticks(&self, symbol: &str, handler: TickHandler) -> Result<SubscriptionId> {
        require("symbol", symbol)?;
        self.gateway.connect().await?;

        let mut handler = handler;
        let id = self
            .gateway
            .subscribe(&Request::ticks(symbol), move |envelope| match envelope.body {
                Response::Tick(tick) => handler(tick),
                Response::Error(fault) => warn!(message = %fault.message, "Tick stream error"),
                other => debug!(kind = other.kind(), "Ignoring non-tick stream frame"),
            })
            .await?;

        info!(symbol, subscription = %id, "Subscribed to ticks");
        Ok(id)
    }

    async fn subscribe_balance(&self, handler: BalanceHandler) -> Result<SubscriptionId> {
        self.gateway.connect().await?;

        let mut handler = handler;
        let id = self
            .gateway
            .subscribe(&Request::balance(), move |envelope| match envelope.body {
                Response::Balance(balance) => handler(balance),
                Response::Error(fault) => warn!(message = %fault.message, "Balance stream error"),
                other => debug!(kind = other.kind(), "Ignoring non-balance stream frame"),
            })
            .await?;

        info!(subscription = %id, "Subscribed to balance");
        Ok(id)
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<bool> {
        Ok(self.gateway.unsubscribe(id).await)
    }

    async fn get_tick_history(&self, symbol: &str, granularity: u32) -> Result<Vec<Candle>> {
        require("symbol", symbol)?;
        if !is_supported_granularity(granularity) {
            return Err(GatewayError::InvalidRequest {
                field: "granularity",
                reason: format!("{granularity}s is not a supported candle size"),
            }
            .into());
        }

        match self
            .call(Request::ticks_history(symbol, granularity))
            .await?
            .body
        {
            Response::Candles(candles) => {
                debug!(symbol, granularity, count = candles.len(), "Fetched candles");
                Ok(candles)
            }
            other => Err(other.unexpected("candles").into()),
        }
    }

    async fn place_trade(&self, request: &TradeRequest) -> Result<TradeReceipt> {
        request.validate()?;
        match self.call(Request::buy(request)).await?.body {
            Response::Buy(receipt) => {
                info!(
                    contract_id = receipt.contract_id,
                    symbol = %request.symbol,
                    contract_type = %request.contract_type,
                    payout = %receipt.payout,
                    "Contract bought"
                );
                Ok(receipt)
            }
            other => Err(other.unexpected("buy").into()),
        }
    }

    async fn get_trading_assets(&self) -> Result<Vec<ActiveSymbol>> {
        match self.call(Request::active_symbols()).await?.body {
            Response::ActiveSymbols(symbols) => Ok(symbols),
            other => Err(other.unexpected("active_symbols").into()),
        }
    }

    async fn ping(&self) -> Result<()> {
        match self.call(Request::ping()).await?.body {
            Response::Pong => Ok(()),
            other => Err(other.unexpected("ping").into()),
        }
    }

    async fn disconnect(&self) {
        self.gateway.disconnect().await;
    }

    fn broker_name(&self) -> &'static str {
        "Deriv"
    }
}
