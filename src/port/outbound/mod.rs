//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! - [`transport`] - Frame-level socket seam used by the gateway
//! - [`broker`] - Typed broker operations used by the application layer
//! - [`backend`] - Persistence and auth collaborator boundary

pub mod backend;
pub mod broker;
pub mod transport;
