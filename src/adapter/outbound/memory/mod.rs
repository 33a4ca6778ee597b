//! In-memory backend adapters.
//!
//! Stand-ins for the hosted persistence/auth backend, used by the CLI and
//! by tests.

pub mod auth;
pub mod store;

pub use auth::MemoryAuth;
pub use store::MemoryStore;
