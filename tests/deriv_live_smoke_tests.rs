use std::env;
use std::time::Duration;

use derivgate::adapter::outbound::deriv::{DerivClient, DerivConfig};
use derivgate::port::outbound::broker::BrokerGateway;
use tokio::time::timeout;

fn smoke_enabled() -> bool {
    matches!(env::var("DERIVGATE_SMOKE").ok().as_deref(), Some("1"))
}

fn live_client() -> DerivClient {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = DerivConfig {
        ws_url: env::var("DERIV_WS_URL")
            .unwrap_or_else(|_| "wss://ws.derivws.com/websockets/v3".to_string()),
        ..DerivConfig::default()
    };
    DerivClient::new(&config).expect("valid live config")
}

#[tokio::test]
#[ignore = "requires DERIVGATE_SMOKE=1 and network access"]
async fn smoke_deriv_ping_and_symbols_readonly() {
    if !smoke_enabled() {
        eprintln!("Skipping smoke test (set DERIVGATE_SMOKE=1 to enable)");
        return;
    }

    let client = live_client();
    timeout(Duration::from_secs(20), client.ping())
        .await
        .expect("Timed out pinging Deriv")
        .expect("Ping failed");

    let symbols = timeout(Duration::from_secs(20), client.get_trading_assets())
        .await
        .expect("Timed out querying active symbols")
        .expect("Failed to fetch active symbols");
    client.disconnect().await;

    assert!(!symbols.is_empty(), "Expected at least one active symbol");
}

#[tokio::test]
#[ignore = "requires DERIVGATE_SMOKE=1, DERIV_API_TOKEN and network access"]
async fn smoke_deriv_authorize_and_balance() {
    if !smoke_enabled() {
        eprintln!("Skipping smoke test (set DERIVGATE_SMOKE=1 to enable)");
        return;
    }
    let Ok(token) = env::var("DERIV_API_TOKEN") else {
        eprintln!("Skipping smoke test (DERIV_API_TOKEN not set)");
        return;
    };

    let client = live_client();
    let auth = timeout(Duration::from_secs(20), client.authorize(&token))
        .await
        .expect("Timed out authorizing")
        .expect("Authorization failed");
    let balance = timeout(Duration::from_secs(20), client.get_account_balance())
        .await
        .expect("Timed out fetching balance")
        .expect("Balance failed");
    client.disconnect().await;

    assert_eq!(balance.loginid.as_deref(), Some(auth.loginid.as_str()));
}
