//! In-process broker transport for tests.
//!
//! [`MockServer`] plays the broker. Its [`ChannelConnector`] hands the
//! gateway channel-backed links; every opened link shows up on the server
//! side as a [`ServerConnection`] the test drives frame by frame.
//!
//! Dropping a [`ServerConnection`] looks like the peer closing the socket.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::config;
use crate::adapter::outbound::deriv::DerivClient;
use crate::error::GatewayError;
use crate::port::outbound::transport::{Connector, FrameSink, FrameSource, Link};

/// How long server-side waits block before failing the test.
const WAIT: Duration = Duration::from_secs(5);

const NON_PAYLOAD_KEYS: [&str; 5] = ["error", "subscription", "req_id", "echo_req", "passthrough"];

#[derive(Default)]
struct Behavior {
    connect_delay: Option<Duration>,
    refuse: Option<String>,
}

struct ServerState {
    opened: AtomicU32,
    behavior: Mutex<Behavior>,
    accepted: mpsc::UnboundedSender<ServerConnection>,
}

/// Fake broker endpoint.
pub struct MockServer {
    state: Arc<ServerState>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<ServerConnection>>,
}

impl MockServer {
    #[must_use]
    pub fn new() -> Self {
        let (accepted, incoming) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(ServerState {
                opened: AtomicU32::new(0),
                behavior: Mutex::new(Behavior::default()),
                accepted,
            }),
            incoming: tokio::sync::Mutex::new(incoming),
        }
    }

    /// A connector that opens links to this server.
    #[must_use]
    pub fn connector(&self) -> Arc<ChannelConnector> {
        Arc::new(ChannelConnector {
            state: self.state.clone(),
        })
    }

    /// Number of links opened so far, refused attempts included.
    #[must_use]
    pub fn opened(&self) -> u32 {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Delay every subsequent open by `delay`.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.behavior.lock().connect_delay = Some(delay);
    }

    /// Refuse subsequent opens with `reason`, or accept again with `None`.
    pub fn refuse_connections(&self, reason: Option<&str>) {
        self.state.behavior.lock().refuse = reason.map(str::to_string);
    }

    /// Wait for the next link the gateway opens.
    ///
    /// # Panics
    ///
    /// Panics if nothing connects within a few seconds.
    pub async fn accept(&self) -> ServerConnection {
        let mut incoming = self.incoming.lock().await;
        match tokio::time::timeout(WAIT, incoming.recv()).await {
            Ok(Some(conn)) => conn,
            Ok(None) => panic!("mock server channel closed"),
            Err(_) => panic!("no connection within {WAIT:?}"),
        }
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Connector`] backed by in-process channels.
pub struct ChannelConnector {
    state: Arc<ServerState>,
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn open(&self, endpoint: &str) -> Result<Link, GatewayError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let (delay, refuse) = {
            let behavior = self.state.behavior.lock();
            (behavior.connect_delay, behavior.refuse.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = refuse {
            return Err(GatewayError::Connection(reason));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let conn = ServerConnection {
            endpoint: endpoint.to_string(),
            inbound: server_rx,
            outbound: server_tx,
        };
        self.state
            .accepted
            .send(conn)
            .map_err(|_| GatewayError::Connection("mock server is gone".into()))?;

        Ok(Link::new(
            ChannelSink {
                tx: Some(client_tx),
            },
            ChannelSource { rx: client_rx },
        ))
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError> {
        let tx = self.tx.as_ref().ok_or(GatewayError::NotConnected)?;
        tx.send(text)
            .map_err(|_| GatewayError::Connection("peer went away".into()))
    }

    async fn close(&mut self) -> Result<(), GatewayError> {
        self.tx = None;
        Ok(())
    }
}

struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Result<String, GatewayError>>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_text(&mut self) -> Option<Result<String, GatewayError>> {
        self.rx.recv().await
    }
}

/// Server side of one open link.
pub struct ServerConnection {
    endpoint: String,
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<Result<String, GatewayError>>,
}

impl ServerConnection {
    /// The URL the client opened.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Next request the client sent, as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the client closed the link, nothing arrives within a few
    /// seconds, or the frame is not JSON.
    pub async fn recv_request(&mut self) -> Value {
        match tokio::time::timeout(WAIT, self.inbound.recv()).await {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => panic!("client sent invalid JSON {text:?}: {e}"),
            },
            Ok(None) => panic!("client closed the link"),
            Err(_) => panic!("no request within {WAIT:?}"),
        }
    }

    /// Send a JSON frame to the client.
    pub fn push(&self, frame: Value) {
        self.push_raw(&frame.to_string());
    }

    /// Send a text frame verbatim.
    pub fn push_raw(&self, text: &str) {
        let _ = self.outbound.send(Ok(text.to_string()));
    }

    /// Answer `request` with `payload`, echoing its `req_id` and the request
    /// itself the way the broker does.
    ///
    /// `msg_type` is taken from the payload field unless given.
    pub fn respond(&self, request: &Value, payload: Value) {
        let mut frame = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        if !frame.contains_key("msg_type") {
            if let Some(key) = frame
                .keys()
                .find(|key| !NON_PAYLOAD_KEYS.contains(&key.as_str()))
                .cloned()
            {
                frame.insert("msg_type".into(), Value::String(key));
            }
        }
        if let Some(req_id) = request.get("req_id") {
            frame.insert("req_id".into(), req_id.clone());
        }
        frame.insert("echo_req".into(), request.clone());
        self.push(Value::Object(frame));
    }

    /// Make the client's reader see a transport error.
    pub fn fail(&self, reason: &str) {
        let _ = self
            .outbound
            .send(Err(GatewayError::Connection(reason.to_string())));
    }
}

/// A [`DerivClient`] wired to `server` with the canonical test config.
///
/// # Panics
///
/// Panics if the test endpoint does not parse, which would be a bug here.
pub fn client(server: &MockServer) -> DerivClient {
    match DerivClient::with_connector(server.connector(), &config::deriv()) {
        Ok(client) => client,
        Err(e) => panic!("invalid test config: {e}"),
    }
}
