//! Outbound adapters (driven side).

pub mod deriv;
pub mod memory;
