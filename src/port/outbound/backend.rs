//! Persistence and auth backend boundary.
//!
//! The backend is an external collaborator consumed through a generic
//! row-level query surface ([`RecordStore`]) and a session subsystem
//! ([`AuthBackend`]). Nothing here is transactionally coupled to the broker
//! gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A row, keyed by column name.
pub type Record = Map<String, Value>;

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Check whether a record satisfies this filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.column) == Some(&self.value)
    }
}

/// Result ordering on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Generic row-level store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching every filter, optionally ordered.
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Record>>;

    /// Insert a row and return it as stored.
    async fn insert(&self, table: &str, record: Record) -> Result<Record>;

    /// Merge `patch` into every matching row. Returns the number of rows touched.
    async fn update(&self, table: &str, filters: &[Filter], patch: Record) -> Result<usize>;

    /// Delete matching rows. Returns the number of rows removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize>;
}

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

/// Session transitions announced to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Callback for [`AuthBackend::on_auth_state_change`].
pub type AuthListener = Box<dyn Fn(&AuthEvent) + Send + Sync>;

/// Handle returned when registering an [`AuthListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Session/auth subsystem.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The current session, if signed in.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Register a listener for sign-in/sign-out transitions.
    fn on_auth_state_change(&self, listener: AuthListener) -> ListenerId;

    /// Drop a listener registered with [`on_auth_state_change`](Self::on_auth_state_change).
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Register a new user and sign them in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session>;

    /// Sign in an existing user.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;
}
