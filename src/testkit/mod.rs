//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - In-process broker: `MockServer`, `ChannelConnector`,
//!   `ServerConnection`.
//! - [`domain`] - Builders for broker payloads and trade requests.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod transport;
