//! CLI module graph.

pub mod account;
pub mod check;
pub mod command;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod market;
pub mod output;
pub mod paths;
pub mod trade;
