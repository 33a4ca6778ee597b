//! Deriv broker integration.
//!
//! Layering, bottom up: [`transport`] opens sockets, [`gateway`] correlates
//! requests and routes streams over one socket, [`client`] exposes typed
//! broker operations.

pub mod client;
pub mod dto;
pub mod gateway;
pub mod settings;
pub mod transport;

pub use client::DerivClient;
pub use gateway::Gateway;
pub use settings::DerivConfig;
pub use transport::WebSocketConnector;
