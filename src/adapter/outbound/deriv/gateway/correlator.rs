//! Request correlation.
//!
//! Every request gets a fresh [`RequestId`] and a one-shot reply slot in the
//! pending table. An entry leaves the table exactly once: resolved by the
//! reader, cancelled by timeout or by the waiting caller going away, or
//! failed when the connection is torn down.
//!
//! A stream acknowledgement that nobody is waiting for any more (the caller
//! timed out or went away) is queued as an orphan; the connection's reader
//! drops its handler and sends `forget` for it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::registry::{StreamHandler, SubscriptionRegistry};
use crate::adapter::outbound::deriv::dto::Envelope;
use crate::domain::{RequestId, SubscriptionId};
use crate::error::GatewayError;

type Reply = Result<Envelope, GatewayError>;

/// Monotonic request id source, starting at 1.
#[derive(Debug)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> RequestId {
        RequestId::new(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

struct Pending {
    reply: oneshot::Sender<Reply>,
    created_at: Instant,
    stream: Option<StreamHandler>,
}

/// What the reader should do after offering a frame to the correlator.
pub enum Resolution {
    /// The frame answered a pending request.
    Delivered,
    /// The frame acknowledged a subscription and carries its first payload.
    FirstFrame(StreamHandler, Envelope),
    /// No pending request has this id.
    Unmatched(Envelope),
}

/// Pending-response table of one connection.
#[derive(Default)]
pub struct Correlator {
    pending: Mutex<HashMap<RequestId, Pending>>,
    /// Ids whose waiter gave up before any reply arrived.
    abandoned: Mutex<HashSet<RequestId>>,
    orphans: Mutex<Vec<SubscriptionId>>,
    orphaned: Notify,
}

impl Correlator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending entry for `id`.
    ///
    /// With a stream handler, a successful acknowledgement registers the
    /// handler before the caller is woken. Dropping the returned
    /// [`PendingReply`] without awaiting it removes the entry.
    pub fn register(&self, id: RequestId, stream: Option<StreamHandler>) -> PendingReply<'_> {
        let (reply, rx) = oneshot::channel();
        self.pending.lock().insert(
            id,
            Pending {
                reply,
                created_at: Instant::now(),
                stream,
            },
        );
        PendingReply {
            correlator: self,
            id,
            rx,
            armed: true,
        }
    }

    /// Offer an inbound frame carrying `req_id == id`.
    pub fn resolve(
        &self,
        id: RequestId,
        envelope: Envelope,
        registry: &SubscriptionRegistry,
    ) -> Resolution {
        let mut pending = self.pending.lock();
        let Some(entry) = pending.remove(&id) else {
            drop(pending);
            if self.abandoned.lock().remove(&id) {
                if let Some(subscription) = opened_stream(&envelope) {
                    debug!(req_id = %id, %subscription, "Late acknowledgement for abandoned request");
                    self.push_orphan(subscription);
                }
            }
            return Resolution::Unmatched(envelope);
        };

        let mut registered = None;
        let mut first_frame = None;
        if let (Some(handler), Some(subscription)) = (entry.stream, envelope.subscription.clone()) {
            if envelope.fault().is_none() {
                registry.insert(subscription.clone(), handler.clone());
                if !envelope.is_ack() {
                    first_frame = Some((handler, envelope.clone()));
                }
                registered = Some(subscription);
            }
        }

        trace!(
            req_id = %id,
            elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
            "Resolved request"
        );

        if let Err(Ok(envelope)) = entry.reply.send(Ok(envelope)) {
            drop(pending);
            if let Some(subscription) = registered.or_else(|| opened_stream(&envelope)) {
                warn!(%subscription, "Subscriber went away before the ack arrived");
                registry.remove(&subscription);
                self.push_orphan(subscription);
            }
            return Resolution::Delivered;
        }
        drop(pending);

        match first_frame {
            Some((handler, envelope)) => Resolution::FirstFrame(handler, envelope),
            None => Resolution::Delivered,
        }
    }

    /// Remove an entry without resolving it. Returns whether it was present.
    ///
    /// A reply that still arrives for `id` is checked for an opened stream.
    pub fn cancel(&self, id: RequestId) -> bool {
        let removed = self.pending.lock().remove(&id).is_some();
        if removed {
            self.abandoned.lock().insert(id);
        }
        removed
    }

    fn push_orphan(&self, subscription: SubscriptionId) {
        self.orphans.lock().push(subscription);
        self.orphaned.notify_one();
    }

    /// Take the queued orphan streams without waiting.
    pub fn drain_orphans(&self) -> Vec<SubscriptionId> {
        std::mem::take(&mut *self.orphans.lock())
    }

    /// Wait until at least one orphan stream is queued, then take them all.
    pub async fn orphaned(&self) -> Vec<SubscriptionId> {
        loop {
            let orphans = self.drain_orphans();
            if !orphans.is_empty() {
                return orphans;
            }
            self.orphaned.notified().await;
        }
    }

    /// Fail every pending request with `error`.
    pub fn fail_all(&self, error: &GatewayError) -> usize {
        self.abandoned.lock().clear();
        self.orphans.lock().clear();
        let drained: Vec<_> = self.pending.lock().drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            debug!(req_id = %id, error = %error, "Failing pending request");
            let _ = entry.reply.send(Err(error.clone()));
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, id: RequestId) -> bool {
        self.pending.lock().contains_key(&id)
    }
}

/// A registered request waiting for its reply.
pub struct PendingReply<'a> {
    correlator: &'a Correlator,
    id: RequestId,
    rx: oneshot::Receiver<Reply>,
    armed: bool,
}

impl PendingReply<'_> {
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the reply, at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Timeout`] if nothing arrived in time, or the
    /// teardown error if the connection went away first.
    pub async fn wait(mut self, timeout: Duration) -> Reply {
        let outcome = tokio::time::timeout(timeout, &mut self.rx).await;
        self.armed = false;

        match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(GatewayError::Connection("connection closed".into())),
            Err(_) => {
                if self.correlator.cancel(self.id) {
                    debug!(req_id = %self.id, "Request timed out");
                    return Err(timeout_error(self.id, timeout));
                }
                // Resolved between the deadline and the cancel.
                self.rx
                    .try_recv()
                    .unwrap_or_else(|_| Err(timeout_error(self.id, timeout)))
            }
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.correlator.cancel(self.id) {
            debug!(req_id = %self.id, "Dropped pending request");
            return;
        }
        // The reply landed while the caller was going away.
        if let Ok(Ok(envelope)) = self.rx.try_recv() {
            if let Some(subscription) = opened_stream(&envelope) {
                debug!(req_id = %self.id, %subscription, "Dropped acknowledged stream");
                self.correlator.push_orphan(subscription);
            }
        }
    }
}

/// The stream a successful reply opened, if any.
fn opened_stream(envelope: &Envelope) -> Option<SubscriptionId> {
    envelope
        .subscription
        .clone()
        .filter(|_| envelope.fault().is_none())
}

fn timeout_error(id: RequestId, after: Duration) -> GatewayError {
    GatewayError::Timeout {
        req_id: id.get(),
        after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
    }
}
