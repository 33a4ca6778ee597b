//! One open socket and its bookkeeping.
//!
//! A [`Connection`] owns the outbound half of a [`Link`] and spawns a single
//! reader task for the inbound half. The reader is the only place frames are
//! demultiplexed, so responses and stream frames are handled in arrival
//! order. The same task sends `forget` for streams whose subscriber is gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::correlator::{Correlator, RequestIds, Resolution};
use super::registry::{StreamHandler, SubscriptionRegistry};
use crate::adapter::outbound::deriv::dto::{Envelope, OutboundMessage, Request};
use crate::domain::{RequestId, SubscriptionId};
use crate::error::GatewayError;
use crate::port::outbound::transport::{FrameSink, FrameSource, Link};

/// State shared between callers and the reader task.
struct Shared {
    generation: u64,
    open: AtomicBool,
    ids: Arc<RequestIds>,
    sink: tokio::sync::Mutex<Box<dyn FrameSink>>,
    correlator: Correlator,
    registry: SubscriptionRegistry,
}

impl Shared {
    /// Mark the connection closed and release all bookkeeping.
    fn teardown(&self, reason: &str) {
        let was_open = self.open.swap(false, Ordering::AcqRel);
        let failed = self
            .correlator
            .fail_all(&GatewayError::Connection(reason.to_string()));
        let dropped = self.registry.clear();
        if was_open {
            info!(
                generation = self.generation,
                reason,
                failed_requests = failed,
                dropped_subscriptions = dropped,
                "Connection closed"
            );
        }
    }

    fn route(&self, text: &str) {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "Failed to parse message");
                return;
            }
        };

        let envelope = match envelope.req_id {
            Some(id) => match self.correlator.resolve(id, envelope, &self.registry) {
                Resolution::Delivered => return,
                Resolution::FirstFrame(handler, envelope) => {
                    handler.call(envelope);
                    return;
                }
                Resolution::Unmatched(envelope) => envelope,
            },
            None => envelope,
        };

        let req_id = envelope.req_id;
        let kind = envelope.body.kind();
        if let Some(subscription) = envelope.subscription.clone() {
            if !envelope.is_ack() && self.registry.dispatch(&subscription, envelope) {
                return;
            }
        }
        debug!(req_id = ?req_id.map(RequestId::get), kind, "Dropping unmatched message");
    }

    async fn write(&self, frame: String) -> Result<(), GatewayError> {
        let mut sink = self.sink.lock().await;
        if !self.open.load(Ordering::Acquire) {
            return Err(GatewayError::NotConnected);
        }
        sink.send_text(frame).await
    }

    /// Drop the handler of a stream nobody holds and stop it on the server.
    async fn release(&self, subscription: SubscriptionId) {
        self.registry.remove(&subscription);
        let request = Request::forget(&subscription);
        let frame = match OutboundMessage::new(self.ids.next(), &request).encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%subscription, error = %e, "Failed to encode forget");
                return;
            }
        };
        match self.write(frame).await {
            Ok(()) => info!(%subscription, "Forgot orphaned stream"),
            Err(e) => warn!(%subscription, error = %e, "Failed to send forget"),
        }
    }
}

/// An open connection to the broker.
pub struct Connection {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("generation", &self.shared.generation)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Take over an open link and start its reader task.
    ///
    /// `ids` numbers the requests the connection sends on its own.
    pub fn start(
        link: Link,
        generation: u64,
        request_timeout: Duration,
        ids: Arc<RequestIds>,
    ) -> Self {
        let shared = Arc::new(Shared {
            generation,
            open: AtomicBool::new(true),
            ids,
            sink: tokio::sync::Mutex::new(link.sink),
            correlator: Correlator::new(),
            registry: SubscriptionRegistry::new(),
        });
        let reader = tokio::spawn(read_loop(shared.clone(), link.source));

        Self {
            shared,
            reader: Mutex::new(Some(reader)),
            request_timeout,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.generation
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.shared.correlator.len()
    }

    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.shared.registry.len()
    }

    #[must_use]
    pub fn is_subscribed(&self, id: &SubscriptionId) -> bool {
        self.shared.registry.contains(id)
    }

    /// Send a request and wait for its correlated response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConnected`] if the connection is closed,
    /// the transport error if the write fails, or a timeout.
    pub async fn request(&self, id: RequestId, request: &Request) -> Result<Envelope, GatewayError> {
        self.exchange(id, request, None).await
    }

    /// Send a streaming request. The handler is registered as soon as the
    /// broker acknowledges the stream.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn subscribe(
        &self,
        id: RequestId,
        request: &Request,
        handler: StreamHandler,
    ) -> Result<Envelope, GatewayError> {
        self.exchange(id, request, Some(handler)).await
    }

    async fn exchange(
        &self,
        id: RequestId,
        request: &Request,
        handler: Option<StreamHandler>,
    ) -> Result<Envelope, GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::NotConnected);
        }
        let frame = if handler.is_some() {
            OutboundMessage::streaming(id, request)
        } else {
            OutboundMessage::new(id, request)
        }
        .encode()?;

        let pending = self.shared.correlator.register(id, handler);
        trace!(req_id = %id, kind = request.kind(), "Sending request");
        self.shared.write(frame).await?;
        pending.wait(self.request_timeout).await
    }

    /// Send a request without waiting for its response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConnected`] or the transport error.
    pub async fn notify(&self, id: RequestId, request: &Request) -> Result<(), GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::NotConnected);
        }
        let frame = OutboundMessage::new(id, request).encode()?;
        trace!(req_id = %id, kind = request.kind(), "Sending notification");
        self.shared.write(frame).await
    }

    /// Remove a local subscription. Returns whether it existed.
    pub fn forget_local(&self, id: &SubscriptionId) -> bool {
        self.shared.registry.remove(id)
    }

    /// Close the socket, failing pending requests and dropping subscriptions.
    pub async fn close(&self) {
        self.shared.teardown("disconnected");
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        let mut sink = self.shared.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!(error = %e, "Error closing socket");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.abort();
        }
    }
}

async fn read_loop(shared: Arc<Shared>, mut source: Box<dyn FrameSource>) {
    debug!(generation = shared.generation, "Entering message loop");

    let reason = loop {
        tokio::select! {
            frame = source.next_text() => match frame {
                Some(Ok(text)) => shared.route(&text),
                Some(Err(e)) => break e.to_string(),
                None => break "connection closed by peer".to_string(),
            },
            orphans = shared.correlator.orphaned() => {
                for subscription in orphans {
                    shared.release(subscription).await;
                }
            }
        }
    };

    shared.teardown(&reason);
}
