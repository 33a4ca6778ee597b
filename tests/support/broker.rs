//! Shared helpers for driving a client against the mock broker.

use std::time::Duration;

use derivgate::adapter::outbound::deriv::{DerivClient, Gateway};
use derivgate::testkit::transport::{MockServer, ServerConnection};
use serde_json::Value;

/// Open the client's connection and return the server side of it.
pub async fn connect(client: &DerivClient, server: &MockServer) -> ServerConnection {
    connect_gateway(client.gateway(), server).await
}

/// Open a gateway connection and return the server side of it.
pub async fn connect_gateway(gateway: &Gateway, server: &MockServer) -> ServerConnection {
    let (opened, conn) = tokio::join!(gateway.connect(), server.accept());
    opened.expect("gateway should connect");
    conn
}

/// Poll `condition` until it holds.
///
/// # Panics
///
/// Panics if it does not hold within two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 2s");
}

/// The `req_id` of a captured request.
pub fn req_id(request: &Value) -> u64 {
    request["req_id"].as_u64().expect("request has a numeric req_id")
}
