//! Handlers for `authorize`, `balance`, `accounts` and `switch`.

use std::path::Path;

use serde_json::json;
use tabled::Tabled;
use tokio::sync::mpsc;

use super::context::authorized_session;
use super::output::{self, Tone};
use crate::application::SessionService;
use crate::domain::currency::{currency_name, format_balance};
use crate::domain::{AccountEntry, Balance};
use crate::error::Result;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Login")]
    loginid: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl AccountRow {
    fn new(entry: &AccountEntry, active: &str) -> Self {
        Self {
            marker: if entry.loginid == active { "*" } else { "" },
            loginid: entry.loginid.clone(),
            currency: entry.currency.clone(),
            kind: if entry.is_virtual { "demo" } else { "real" },
            status: if entry.is_disabled {
                "disabled"
            } else {
                "enabled"
            },
        }
    }
}

fn print_accounts(accounts: &[AccountEntry], active: &str) {
    output::table(
        accounts.iter().map(|entry| AccountRow::new(entry, active)),
        "(no accounts listed)",
    );
}

/// Execute `authorize`.
pub async fn execute_authorize(config_path: &Path) -> Result<()> {
    let session = authorized_session(config_path).await?;
    let result = show_authorization(&session);
    session.sign_out().await;
    result
}

fn show_authorization(session: &SessionService) -> Result<()> {
    let Some(auth) = session.authorization() else {
        return Ok(());
    };

    if output::is_json() {
        output::report("authorize", json!({ "authorization": auth }));
        return Ok(());
    }

    output::heading("Account");
    output::field("Login", output::accent(&auth.loginid));
    if let Some(name) = auth.fullname.as_deref().filter(|name| !name.is_empty()) {
        output::field("Name", name);
    }
    if let Some(email) = &auth.email {
        output::field("Email", email);
    }
    output::field("Currency", currency_name(&auth.currency));
    if let Some(balance) = auth.balance {
        output::field("Balance", format_balance(balance, &auth.currency));
    }
    output::field("Type", if auth.is_virtual { "demo" } else { "real" });
    if let Some(company) = &auth.landing_company_name {
        output::field("Company", output::dim(company));
    }

    output::heading("Logins");
    print_accounts(&auth.account_list, &auth.loginid);
    Ok(())
}

/// Execute `balance`, optionally streaming `watch` updates.
pub async fn execute_balance(config_path: &Path, watch: Option<usize>) -> Result<()> {
    let session = authorized_session(config_path).await?;
    let result = balance(&session, watch).await;
    session.sign_out().await;
    result
}

async fn balance(session: &SessionService, watch: Option<usize>) -> Result<()> {
    let broker = session.broker();
    let current = broker.get_account_balance().await?;

    if output::is_json() {
        output::report("balance", json!({ "balance": current }));
    } else {
        output::heading("Balance");
        output::balance(&current);
    }

    let Some(limit) = watch.filter(|limit| *limit > 0) else {
        return Ok(());
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Balance>();
    let id = broker
        .subscribe_balance(Box::new(move |update| {
            let _ = tx.send(update);
        }))
        .await?;
    output::say(Tone::Hint, &format!("waiting for {limit} balance updates"));

    let mut received = 0;
    while let Some(update) = rx.recv().await {
        received += 1;
        output::balance_update(&update);
        if received >= limit {
            break;
        }
    }
    broker.unsubscribe(&id).await?;

    if received < limit {
        output::say(Tone::Warn, "Balance stream ended early");
    }
    Ok(())
}

/// Execute `accounts`.
pub async fn execute_accounts(config_path: &Path) -> Result<()> {
    let session = authorized_session(config_path).await?;
    let result = accounts(&session).await;
    session.sign_out().await;
    result
}

async fn accounts(session: &SessionService) -> Result<()> {
    let overview = session.account_overview().await?;

    if output::is_json() {
        output::report("accounts", json!({ "overview": overview }));
        return Ok(());
    }

    let active = overview
        .current
        .as_ref()
        .map(|entry| entry.loginid.clone())
        .or_else(|| session.authorization().map(|auth| auth.loginid))
        .unwrap_or_default();

    output::heading("Balance");
    output::balance(&overview.balance);
    output::heading("Logins");
    print_accounts(&overview.accounts, &active);
    if overview.current.is_none() {
        output::say(Tone::Warn, "Active login is missing from the account list");
    }
    Ok(())
}

/// Execute `switch`.
pub async fn execute_switch(config_path: &Path, loginid: &str) -> Result<()> {
    let session = authorized_session(config_path).await?;
    let result = switch(&session, loginid).await;
    session.sign_out().await;
    result
}

async fn switch(session: &SessionService, loginid: &str) -> Result<()> {
    let switched = session.switch_account(loginid).await?;
    let active = session.authorization();

    if output::is_json() {
        output::report(
            "switch",
            json!({ "switch": switched, "authorization": active }),
        );
        return Ok(());
    }

    output::say(
        Tone::Done,
        &format!(
            "Switched to {}",
            switched.loginid.as_deref().unwrap_or(loginid)
        ),
    );
    if let Some(auth) = active {
        output::field("Currency", currency_name(&auth.currency));
        output::field("Type", if auth.is_virtual { "demo" } else { "real" });
        if let Some(balance) = auth.balance {
            output::field("Balance", format_balance(balance, &auth.currency));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loginid: &str, is_virtual: bool) -> AccountEntry {
        AccountEntry {
            loginid: loginid.into(),
            currency: "USD".into(),
            is_virtual,
            is_disabled: false,
            account_type: None,
            landing_company_name: None,
        }
    }

    #[test]
    fn account_row_marks_active_login() {
        let row = AccountRow::new(&entry("VRTC1", true), "VRTC1");
        assert_eq!(row.marker, "*");
        assert_eq!(row.kind, "demo");

        let row = AccountRow::new(&entry("CR1", false), "VRTC1");
        assert_eq!(row.marker, "");
        assert_eq!(row.kind, "real");
        assert_eq!(row.status, "enabled");
    }

    #[test]
    fn account_table_has_renamed_headers() {
        let table =
            tabled::Table::new(vec![AccountRow::new(&entry("CR1", false), "CR1")]).to_string();
        assert!(table.contains("Login"));
        assert!(table.contains("CR1"));
    }
}
