//! In-memory auth backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::{BackendError, Result};
use crate::port::outbound::backend::{AuthBackend, AuthEvent, AuthListener, ListenerId, Session};

type SharedListener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

struct Account {
    user_id: String,
    password: String,
}

/// Email/password accounts and a single current session.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    listeners: Mutex<Vec<(ListenerId, SharedListener)>>,
    next_listener: AtomicU64,
}

impl MemoryAuth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already signed-in session.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let auth = Self::default();
        *auth.session.write() = Some(session);
        auth
    }

    fn emit(&self, event: &AuthEvent) {
        let listeners: Vec<SharedListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn start_session(&self, session: Session) -> Session {
        *self.session.write() = Some(session.clone());
        debug!(user_id = %session.user_id, "Signed in");
        self.emit(&AuthEvent::SignedIn(session.clone()));
        session
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl AuthBackend for MemoryAuth {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().clone())
    }

    fn on_auth_state_change(&self, listener: AuthListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::from(listener)));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize(email);
        if email.is_empty() || password.is_empty() {
            return Err(BackendError::InvalidCredentials.into());
        }

        let user_id = {
            let mut accounts = self.accounts.write();
            if accounts.contains_key(&email) {
                return Err(BackendError::UserExists(email).into());
            }
            let user_id = Uuid::new_v4().to_string();
            accounts.insert(
                email.clone(),
                Account {
                    user_id: user_id.clone(),
                    password: password.to_string(),
                },
            );
            user_id
        };

        Ok(self.start_session(Session { user_id, email }))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize(email);
        let user_id = match self.accounts.read().get(&email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return Err(BackendError::InvalidCredentials.into()),
        };
        Ok(self.start_session(Session { user_id, email }))
    }

    async fn sign_out(&self) -> Result<()> {
        let previous = self.session.write().take();
        if previous.is_some() {
            self.emit(&AuthEvent::SignedOut);
        }
        Ok(())
    }
}
