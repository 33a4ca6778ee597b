//! Handler for `check`: verifies the broker is reachable.

use std::path::Path;
use std::time::Instant;

use serde_json::json;

use super::context::load_config;
use super::output::{self, Progress, Tone};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::API_TOKEN_ENV;

/// Open the socket, round-trip a ping and, when a token is set, authorize.
pub async fn execute_connection(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let broker = bootstrap::build_broker(&config)?;

    output::heading("Connection Check");
    output::field("Broker", broker.broker_name());
    output::field("WebSocket", &config.deriv.ws_url);
    output::field("App ID", &config.deriv.app_id);

    let progress = Progress::start("Pinging broker...");
    let started = Instant::now();
    if let Err(e) = broker.ping().await {
        progress.failed("Ping failed");
        broker.disconnect().await;
        return Err(e);
    }
    let latency_ms = started.elapsed().as_millis();
    progress.done(&format!("Pong in {latency_ms}ms"));

    let loginid = match config.api_token.as_deref() {
        Some(token) => {
            let progress = Progress::start("Authorizing...");
            match broker.authorize(token).await {
                Ok(auth) => {
                    progress.done(&format!("Authorized as {}", auth.loginid));
                    Some(auth.loginid)
                }
                Err(e) => {
                    progress.failed("Authorization failed");
                    broker.disconnect().await;
                    return Err(e);
                }
            }
        }
        None => {
            output::say(
                Tone::Hint,
                &format!("set {API_TOKEN_ENV} to also check authorization"),
            );
            None
        }
    };
    broker.disconnect().await;

    if output::is_json() {
        output::report(
            "check",
            json!({
                "endpoint": config.deriv.endpoint()?.as_str(),
                "latency_ms": latency_ms,
                "loginid": loginid,
            }),
        );
        return Ok(());
    }
    output::say(Tone::Done, "Connection checks passed");
    Ok(())
}
