//! Connection manager.
//!
//! The [`Gateway`] owns at most one live [`Connection`]. It is created
//! lazily by [`connect`](Gateway::connect); concurrent callers during
//! establishment share the same attempt. When the socket drops, the next
//! `connect` builds a fresh one. Nothing from the old connection carries
//! over except the request id counter.
//!
//! # Slot states
//!
//! ```text
//! Idle ──connect──► Connecting ──open──► Open
//!   ▲                    │                 │
//!   └────── error ───────┘◄── disconnect ──┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::correlator::RequestIds;
use super::registry::StreamHandler;
use crate::adapter::outbound::deriv::dto::{Envelope, Request};
use crate::adapter::outbound::deriv::settings::DerivConfig;
use crate::domain::SubscriptionId;
use crate::error::{GatewayError, Result};
use crate::port::outbound::transport::Connector;

type Attempt = Shared<BoxFuture<'static, std::result::Result<Arc<Connection>, GatewayError>>>;

enum Slot {
    Idle,
    Connecting { attempt: u64, pending: Attempt },
    Open(Arc<Connection>),
}

/// The single shared connection to the broker.
pub struct Gateway {
    connector: Arc<dyn Connector>,
    endpoint: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    ids: Arc<RequestIds>,
    attempts: AtomicU64,
    slot: Mutex<Slot>,
}

impl Gateway {
    /// Create a gateway. Nothing is opened until the first `connect`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a valid URL.
    pub fn new(connector: Arc<dyn Connector>, config: &DerivConfig) -> Result<Self> {
        Ok(Self {
            connector,
            endpoint: config.endpoint()?.to_string(),
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            ids: Arc::new(RequestIds::new()),
            attempts: AtomicU64::new(0),
            slot: Mutex::new(Slot::Idle),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The open connection, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Connection>> {
        match &*self.slot.lock() {
            Slot::Open(conn) if conn.is_open() => Some(conn.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    /// Return the open connection or establish one.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Connection`] if the transport fails to open
    /// or the connect timeout elapses.
    pub async fn connect(&self) -> std::result::Result<Arc<Connection>, GatewayError> {
        let (attempt, pending) = {
            let mut slot = self.slot.lock();
            match &*slot {
                Slot::Open(conn) if conn.is_open() => return Ok(conn.clone()),
                Slot::Connecting { attempt, pending } => (*attempt, pending.clone()),
                Slot::Idle | Slot::Open(_) => {
                    let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    let pending = establish(
                        self.connector.clone(),
                        self.endpoint.clone(),
                        attempt,
                        self.connect_timeout,
                        self.request_timeout,
                        self.ids.clone(),
                    )
                    .boxed()
                    .shared();
                    *slot = Slot::Connecting {
                        attempt,
                        pending: pending.clone(),
                    };
                    (attempt, pending)
                }
            }
        };

        let result = pending.await;

        let superseded = {
            let mut slot = self.slot.lock();
            match &*slot {
                Slot::Connecting { attempt: current, .. } if *current == attempt => {
                    *slot = match &result {
                        Ok(conn) => Slot::Open(conn.clone()),
                        Err(_) => Slot::Idle,
                    };
                    false
                }
                Slot::Open(conn) => !result.as_ref().is_ok_and(|r| Arc::ptr_eq(r, conn)),
                _ => true,
            }
        };

        if superseded {
            if let Ok(conn) = &result {
                debug!(attempt, "Connection attempt superseded by disconnect");
                conn.close().await;
                return Err(GatewayError::Connection("disconnected while connecting".into()));
            }
        }
        result
    }

    /// Send a request on the open connection and wait for its response.
    ///
    /// Error envelopes are returned as ordinary responses.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConnected`] when no connection is open,
    /// or the transport/timeout error of the request.
    pub async fn send(&self, request: &Request) -> std::result::Result<Envelope, GatewayError> {
        let conn = self.current().ok_or(GatewayError::NotConnected)?;
        conn.request(self.ids.next(), request).await
    }

    /// Open a stream and route its frames to `handler`.
    ///
    /// If the acknowledgement itself carries a payload, `handler` receives
    /// it first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Broker`] if the broker refused the stream,
    /// [`GatewayError::UnexpectedResponse`] if the acknowledgement has no
    /// subscription id, or the errors of [`send`](Self::send).
    pub async fn subscribe(
        &self,
        request: &Request,
        handler: impl FnMut(Envelope) + Send + 'static,
    ) -> std::result::Result<SubscriptionId, GatewayError> {
        let conn = self.current().ok_or(GatewayError::NotConnected)?;
        let ack = conn
            .subscribe(self.ids.next(), request, StreamHandler::new(handler))
            .await?
            .into_result()?;

        match ack.subscription {
            Some(id) => {
                debug!(subscription = %id, kind = request.kind(), "Subscribed");
                Ok(id)
            }
            None => Err(ack.body.unexpected("subscription")),
        }
    }

    /// Stop a stream.
    ///
    /// Sends `forget` for the id without waiting for the answer, then drops
    /// the local handler. Returns whether a handler was registered.
    pub async fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let Some(conn) = self.current() else {
            return false;
        };
        self.forget(&conn, id).await;
        let known = conn.forget_local(id);
        debug!(subscription = %id, known, "Unsubscribed");
        known
    }

    /// Ask the broker to stop a stream nobody listens to.
    pub(crate) async fn forget_orphan(&self, id: &SubscriptionId) {
        if let Some(conn) = self.current() {
            if !conn.is_subscribed(id) {
                self.forget(&conn, id).await;
            }
        }
    }

    async fn forget(&self, conn: &Connection, id: &SubscriptionId) {
        if let Err(e) = conn.notify(self.ids.next(), &Request::forget(id)).await {
            warn!(subscription = %id, error = %e, "Failed to send forget");
        }
    }

    /// Close the connection, failing pending requests and dropping
    /// subscriptions. A no-op when nothing is open.
    pub async fn disconnect(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Idle);
        match previous {
            Slot::Open(conn) => {
                info!(generation = conn.generation(), "Disconnecting");
                conn.close().await;
            }
            Slot::Connecting { attempt, .. } => {
                debug!(attempt, "Abandoning connection attempt");
            }
            Slot::Idle => {}
        }
    }
}

async fn establish(
    connector: Arc<dyn Connector>,
    endpoint: String,
    attempt: u64,
    connect_timeout: Duration,
    request_timeout: Duration,
    ids: Arc<RequestIds>,
) -> std::result::Result<Arc<Connection>, GatewayError> {
    debug!(attempt, transport = connector.name(), "Opening connection");

    let link = tokio::time::timeout(connect_timeout, connector.open(&endpoint))
        .await
        .map_err(|_| {
            GatewayError::Connection(format!(
                "connect timed out after {}ms",
                connect_timeout.as_millis()
            ))
        })??;

    info!(attempt, "Connection established");
    Ok(Arc::new(Connection::start(link, attempt, request_timeout, ids)))
}
