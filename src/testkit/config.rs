//! Canonical test configurations.

use crate::adapter::outbound::deriv::settings::DerivConfig;

/// Gateway settings for the mock transport.
///
/// Timeouts keep their production values; tests that hit them run with
/// paused time.
pub fn deriv() -> DerivConfig {
    DerivConfig {
        ws_url: "wss://mock.invalid/websockets/v3".into(),
        ..DerivConfig::default()
    }
}

/// Same as [`deriv`] with a custom request timeout.
pub fn deriv_with_timeout(request_timeout_ms: u64) -> DerivConfig {
    DerivConfig {
        request_timeout_ms,
        ..deriv()
    }
}
