//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod profile;
pub mod session;

pub use profile::{ProfileSync, SyncOutcome, PROFILES_TABLE};
pub use session::{AccountOverview, AuthState, SessionService};
