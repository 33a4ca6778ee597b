//! Deriv wire protocol DTOs.

pub mod request;
pub mod response;

pub use request::{BuyRequest, OutboundMessage, Request};
pub use response::{Envelope, Response};
