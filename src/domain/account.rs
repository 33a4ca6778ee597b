//! Broker account types.
//!
//! - [`Authorization`] - Identity returned by a successful `authorize`
//! - [`AccountEntry`] - One login under the authorized user
//! - [`Balance`] - Balance snapshot or stream update
//! - [`AccountSwitch`] - Result of switching the active login

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::flag;

/// Identity and account data returned by `authorize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    /// Active login id, e.g. `CR1234567` or `VRTC1234567`.
    pub loginid: String,
    /// Broker-wide user id shared by all of the user's logins.
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    /// Account currency; empty until the user picks one.
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_virtual: bool,
    #[serde(default)]
    pub landing_company_name: Option<String>,
    /// Every login the token grants access to.
    #[serde(default)]
    pub account_list: Vec<AccountEntry>,
}

impl Authorization {
    /// Find the entry describing the active login.
    #[must_use]
    pub fn current_account(&self) -> Option<&AccountEntry> {
        self.account_list
            .iter()
            .find(|entry| entry.loginid == self.loginid)
    }
}

/// One login under the authorized user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub loginid: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_virtual: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_disabled: bool,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub landing_company_name: Option<String>,
}

/// Balance snapshot or stream update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub balance: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub loginid: Option<String>,
    /// Stream id when the balance was requested with `subscribe`.
    #[serde(default)]
    pub id: Option<String>,
}

/// Result of switching the active login.
///
/// The broker may answer with an object or a bare `1`; both decode here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSwitch {
    #[serde(default)]
    pub loginid: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn authorization_decodes_broker_payload() {
        let auth: Authorization = serde_json::from_value(json!({
            "loginid": "CR90000001",
            "user_id": 42,
            "email": "trader@example.com",
            "currency": "USD",
            "balance": 10150.5,
            "is_virtual": 0,
            "account_list": [
                {"loginid": "CR90000001", "currency": "USD", "is_virtual": 0, "is_disabled": 0},
                {"loginid": "VRTC9000002", "currency": "USD", "is_virtual": 1, "is_disabled": 0}
            ]
        }))
        .unwrap();

        assert_eq!(auth.user_id, Some(42));
        assert_eq!(auth.balance, Some(dec!(10150.5)));
        assert!(!auth.is_virtual);
        assert_eq!(auth.account_list.len(), 2);
        assert!(auth.account_list[1].is_virtual);
    }

    #[test]
    fn current_account_matches_active_login() {
        let auth: Authorization = serde_json::from_value(json!({
            "loginid": "VRTC9000002",
            "account_list": [
                {"loginid": "CR90000001"},
                {"loginid": "VRTC9000002", "is_virtual": 1}
            ]
        }))
        .unwrap();

        let current = auth.current_account().unwrap();
        assert_eq!(current.loginid, "VRTC9000002");
        assert!(current.is_virtual);
    }

    #[test]
    fn current_account_is_none_when_list_is_empty() {
        let auth: Authorization =
            serde_json::from_value(json!({ "loginid": "CR1" })).unwrap();
        assert!(auth.current_account().is_none());
        assert_eq!(auth.currency, "");
    }

    #[test]
    fn balance_decodes_numbers_as_decimals() {
        let balance: Balance = serde_json::from_value(json!({
            "balance": 9876.54,
            "currency": "USD",
            "loginid": "CR1",
            "id": "b-1"
        }))
        .unwrap();
        assert_eq!(balance.balance, dec!(9876.54));
        assert_eq!(balance.id.as_deref(), Some("b-1"));
    }
}
