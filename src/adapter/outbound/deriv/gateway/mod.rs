//! Connection manager, request correlator and subscription registry.
//!
//! The [`Gateway`] is the entry point; the other types are its internals,
//! exported for tests and diagnostics.

mod connection;
mod correlator;
mod manager;
mod registry;

pub use connection::Connection;
pub use correlator::{Correlator, PendingReply, RequestIds, Resolution};
pub use manager::Gateway;
pub use registry::{StreamHandler, SubscriptionRegistry};
