//! Profile sync: persists the broker identity after authorization and reads
//! the saved API token back when a session is restored.
//!
//! Best effort. A missing backend session skips the write; callers log and
//! ignore failures rather than failing the authorization.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::Authorization;
use crate::error::Result;
use crate::port::outbound::backend::{AuthBackend, Filter, Record, RecordStore};

/// Table holding one profile row per backend user.
pub const PROFILES_TABLE: &str = "profiles";

/// What a sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted,
    Updated,
    /// No backend session, nothing written.
    Skipped,
}

/// Writes the authorized broker account into the caller's profile row.
pub struct ProfileSync {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthBackend>,
}

impl ProfileSync {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthBackend>) -> Self {
        Self { store, auth }
    }

    /// Upsert the profile row of the current backend user.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the session lookup or a write fails.
    pub async fn sync(&self, authorization: &Authorization, token: &str) -> Result<SyncOutcome> {
        let Some(session) = self.auth.get_session().await? else {
            warn!(loginid = %authorization.loginid, "No backend session, skipping profile sync");
            return Ok(SyncOutcome::Skipped);
        };

        let filters = [Filter::eq("user_id", session.user_id.clone())];
        let existing = self.store.select(PROFILES_TABLE, &filters, None).await?;
        let patch = profile_fields(authorization, token);

        if existing.is_empty() {
            let mut record = patch;
            record.insert("user_id".into(), Value::String(session.user_id.clone()));
            self.store.insert(PROFILES_TABLE, record).await?;
            info!(user_id = %session.user_id, loginid = %authorization.loginid, "Profile created");
            Ok(SyncOutcome::Inserted)
        } else {
            let touched = self.store.update(PROFILES_TABLE, &filters, patch).await?;
            debug!(user_id = %session.user_id, rows = touched, "Profile updated");
            Ok(SyncOutcome::Updated)
        }
    }

    /// The API token saved in the current backend user's profile.
    ///
    /// `None` without a backend session, without a profile row, or when the
    /// row holds no token.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the session lookup or the select fails.
    pub async fn saved_token(&self) -> Result<Option<String>> {
        let Some(session) = self.auth.get_session().await? else {
            return Ok(None);
        };

        let filters = [Filter::eq("user_id", session.user_id.clone())];
        let rows = self.store.select(PROFILES_TABLE, &filters, None).await?;
        let token = rows
            .first()
            .and_then(|row| row.get("deriv_api_token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        debug!(user_id = %session.user_id, found = token.is_some(), "Looked up saved token");
        Ok(token)
    }
}

fn profile_fields(authorization: &Authorization, token: &str) -> Record {
    let account_id = authorization
        .user_id
        .map_or_else(|| authorization.loginid.clone(), |id| id.to_string());

    let mut record = Record::new();
    record.insert("deriv_account_id".into(), Value::String(account_id));
    record.insert(
        "deriv_email".into(),
        authorization
            .email
            .clone()
            .map_or(Value::Null, Value::String),
    );
    record.insert("deriv_api_token".into(), Value::String(token.to_string()));
    record.insert(
        "deriv_loginid".into(),
        Value::String(authorization.loginid.clone()),
    );
    record.insert(
        "currency".into(),
        Value::String(authorization.currency.clone()),
    );
    record
}
