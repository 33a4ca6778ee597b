//! derivgate - Real-time gateway client for the Deriv trading API.
//!
//! One WebSocket connection carries every request/response pair and every
//! live stream (ticks, balance updates). Requests are correlated by a
//! locally assigned `req_id`; streams are routed by the server-assigned
//! subscription id.
//!
//! # Architecture
//!
//! - **`domain`** - Broker payload types: authorization, balances, ticks,
//!   candles, trades.
//! - **`port`** - Traits at the seams: the [`BrokerGateway`] facade, the
//!   socket transport and the persistence/auth backend.
//! - **`adapter`** - The Deriv implementation (connection manager, request
//!   correlator, subscription registry), in-memory backend adapters and the
//!   CLI.
//! - **`application`** - Session state machine and profile sync.
//! - **`infrastructure`** - Configuration, logging and wiring.
//!
//! # Example
//!
//! ```no_run
//! use derivgate::adapter::outbound::deriv::{DerivClient, DerivConfig};
//! use derivgate::port::outbound::broker::BrokerGateway;
//!
//! # async fn run() -> derivgate::Result<()> {
//! let client = DerivClient::new(&DerivConfig::default())?;
//! let auth = client.authorize("my-api-token").await?;
//! let balance = client.get_account_balance().await?;
//! println!("{} has {} {}", auth.loginid, balance.balance, balance.currency);
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`BrokerGateway`]: port::outbound::broker::BrokerGateway

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Error, Result};
