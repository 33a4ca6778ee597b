//! Broker session service.
//!
//! Owns the authorization state machine on top of a [`BrokerGateway`]:
//!
//! ```text
//! Unauthorized ──authorize──► Authorizing ──ok──► Authorized(payload)
//!       ▲                          │                     │
//!       └────────── error ─────────┘◄──── sign_out ──────┘
//! ```
//!
//! The gateway itself keeps no authorization state; the cached payload here
//! is what account-scoped operations check against. The token that produced
//! it is kept alongside so a switch can refresh the payload.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::profile::ProfileSync;
use crate::domain::{AccountEntry, AccountSwitch, Authorization, Balance};
use crate::error::{Result, SessionError};
use crate::port::outbound::broker::BrokerGateway;

/// Authorization state of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthorized,
    Authorizing,
    Authorized(Box<Authorization>),
}

impl AuthState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Authorizing => "authorizing",
            Self::Authorized(_) => "authorized",
        }
    }
}

/// Balance plus the logins of the authorized user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountOverview {
    pub balance: Balance,
    pub accounts: Vec<AccountEntry>,
    /// The entry for the active login, if the broker listed it.
    pub current: Option<AccountEntry>,
}

/// Authorization-aware front of the broker gateway.
pub struct SessionService {
    broker: Arc<dyn BrokerGateway>,
    profiles: Option<ProfileSync>,
    state: RwLock<AuthState>,
    token: RwLock<Option<String>>,
}

impl SessionService {
    pub fn new(broker: Arc<dyn BrokerGateway>) -> Self {
        Self {
            broker,
            profiles: None,
            state: RwLock::new(AuthState::Unauthorized),
            token: RwLock::new(None),
        }
    }

    /// Persist the broker identity after every successful authorization.
    #[must_use]
    pub fn with_profile_sync(mut self, profiles: ProfileSync) -> Self {
        self.profiles = Some(profiles);
        self
    }

    #[must_use]
    pub fn broker(&self) -> &Arc<dyn BrokerGateway> {
        &self.broker
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(*self.state.read(), AuthState::Authorized(_))
    }

    /// The cached authorize payload.
    #[must_use]
    pub fn authorization(&self) -> Option<Authorization> {
        match &*self.state.read() {
            AuthState::Authorized(auth) => Some((**auth).clone()),
            _ => None,
        }
    }

    fn require_authorized(&self) -> Result<Authorization> {
        self.authorization()
            .ok_or_else(|| SessionError::NotAuthorized.into())
    }

    /// Authorize with an API token and cache the result.
    ///
    /// # Errors
    ///
    /// Returns the broker error; the session is then unauthorized.
    pub async fn authorize(&self, token: &str) -> Result<Authorization> {
        let auth = self.establish(token).await?;

        if let Some(profiles) = &self.profiles {
            match profiles.sync(&auth, token).await {
                Ok(outcome) => debug!(?outcome, "Profile sync finished"),
                Err(e) => warn!(error = %e, "Profile sync failed"),
            }
        }
        Ok(auth)
    }

    async fn establish(&self, token: &str) -> Result<Authorization> {
        *self.state.write() = AuthState::Authorizing;

        let auth = match self.broker.authorize(token).await {
            Ok(auth) => auth,
            Err(e) => {
                *self.state.write() = AuthState::Unauthorized;
                *self.token.write() = None;
                return Err(e);
            }
        };
        *self.token.write() = Some(token.to_string());
        *self.state.write() = AuthState::Authorized(Box::new(auth.clone()));
        Ok(auth)
    }

    /// Authorize with the token saved in the backend user's profile, then
    /// load the account overview.
    ///
    /// Returns `None` when there is nothing to restore: no profile sync, no
    /// backend session, or no saved token.
    ///
    /// # Errors
    ///
    /// Returns the backend error of the lookup, or the broker error.
    pub async fn restore(&self) -> Result<Option<AccountOverview>> {
        let Some(profiles) = &self.profiles else {
            return Ok(None);
        };
        let Some(token) = profiles.saved_token().await? else {
            debug!("No saved token to restore");
            return Ok(None);
        };

        let auth = self.establish(&token).await?;
        info!(loginid = %auth.loginid, "Restored broker session");
        self.account_overview().await.map(Some)
    }

    /// Switch the active login and refresh the cached payload.
    ///
    /// After the broker confirms the switch the session authorizes again so
    /// the cache describes the new login. If that refresh fails, the cached
    /// payload is patched from its own account list instead.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthorized`] before authorization, or the
    /// broker error of the switch.
    pub async fn switch_account(&self, loginid: &str) -> Result<AccountSwitch> {
        let current = self.require_authorized()?;
        let token = self.token.read().clone();
        let switch = self.broker.switch_account(loginid).await?;
        let active = switch.loginid.clone().unwrap_or_else(|| loginid.to_string());

        let refreshed = match token {
            Some(token) => match self.broker.authorize(&token).await {
                Ok(auth) => Some(auth),
                Err(e) => {
                    warn!(loginid = %active, error = %e, "Refreshing authorization after switch failed");
                    None
                }
            },
            None => None,
        };

        let mut auth = refreshed.unwrap_or(current);
        pin_login(&mut auth, &active, switch.currency.as_deref());
        info!(loginid = %auth.loginid, is_virtual = auth.is_virtual, "Switched account");

        if let AuthState::Authorized(cached) = &mut *self.state.write() {
            **cached = auth;
        }
        Ok(switch)
    }

    /// Balance, account list and the active account.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthorized`] before authorization, or the
    /// broker error.
    pub async fn account_overview(&self) -> Result<AccountOverview> {
        let auth = self.require_authorized()?;
        let balance = self.broker.get_account_balance().await?;
        let accounts = self.broker.get_account_list().await?;
        let current = accounts
            .iter()
            .find(|entry| entry.loginid == auth.loginid)
            .cloned();

        Ok(AccountOverview {
            balance,
            accounts,
            current,
        })
    }

    /// Forget the authorization and close the broker connection.
    pub async fn sign_out(&self) {
        *self.state.write() = AuthState::Unauthorized;
        *self.token.write() = None;
        self.broker.disconnect().await;
        info!("Signed out");
    }
}

/// Point `auth` at `loginid`, taking its details from the account list.
fn pin_login(auth: &mut Authorization, loginid: &str, currency: Option<&str>) {
    if auth.loginid != loginid {
        auth.loginid = loginid.to_string();
        if let Some(entry) = auth.account_list.iter().find(|e| e.loginid == loginid) {
            auth.is_virtual = entry.is_virtual;
            auth.currency.clone_from(&entry.currency);
            auth.landing_company_name.clone_from(&entry.landing_company_name);
            auth.balance = None;
        }
    }
    if let Some(currency) = currency {
        auth.currency = currency.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn demo_authorization() -> Authorization {
        serde_json::from_value(json!({
            "loginid": "VRTC1",
            "currency": "USD",
            "balance": 10000,
            "is_virtual": 1,
            "landing_company_name": "virtual",
            "account_list": [
                {"loginid": "VRTC1", "currency": "USD", "is_virtual": 1},
                {"loginid": "CR1", "currency": "EUR", "is_virtual": 0, "landing_company_name": "svg"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn pin_login_takes_details_from_account_list() {
        let mut auth = demo_authorization();
        pin_login(&mut auth, "CR1", None);

        assert_eq!(auth.loginid, "CR1");
        assert!(!auth.is_virtual);
        assert_eq!(auth.currency, "EUR");
        assert_eq!(auth.landing_company_name.as_deref(), Some("svg"));
        assert_eq!(auth.balance, None);
    }

    #[test]
    fn pin_login_keeps_matching_payload() {
        let mut auth = demo_authorization();
        pin_login(&mut auth, "VRTC1", Some("GBP"));

        assert!(auth.is_virtual);
        assert_eq!(auth.currency, "GBP");
        assert!(auth.balance.is_some());
    }
}
