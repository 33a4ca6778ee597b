//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::deriv::DerivClient;
use crate::adapter::outbound::memory::{MemoryAuth, MemoryStore};
use crate::application::{ProfileSync, SessionService};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::backend::{AuthBackend, RecordStore};
use crate::port::outbound::broker::BrokerGateway;

/// Build the broker client over the production transport.
///
/// # Errors
///
/// Returns an error if the configured endpoint is invalid.
pub fn build_broker(config: &Config) -> Result<Arc<dyn BrokerGateway>> {
    let client = DerivClient::new(&config.deriv)?;
    info!(endpoint = %client.gateway().endpoint(), "Broker client ready");
    Ok(Arc::new(client))
}

/// Build a session service with profile sync over the given backend.
pub fn build_session(
    broker: Arc<dyn BrokerGateway>,
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthBackend>,
) -> SessionService {
    SessionService::new(broker).with_profile_sync(ProfileSync::new(store, auth))
}

/// Build a session service backed by the in-memory backend.
///
/// # Errors
///
/// Returns an error if the configured endpoint is invalid.
pub fn build_local_session(config: &Config) -> Result<SessionService> {
    let broker = build_broker(config)?;
    Ok(build_session(
        broker,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAuth::new()),
    ))
}
