//! Transport port for the broker's real-time socket.
//!
//! The gateway never touches a socket library directly. A [`Connector`]
//! opens a [`Link`], whose two halves are driven independently: the sink by
//! callers issuing requests, the source by the connection's single reader
//! task.

use async_trait::async_trait;

use crate::error::GatewayError;

/// Outbound half of an open link.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError>;

    /// Close the link from our side.
    async fn close(&mut self) -> Result<(), GatewayError>;
}

/// Inbound half of an open link.
#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame.
    ///
    /// Returns `None` once the peer closed the link. An `Err` item means the
    /// link failed; callers stop reading after it.
    async fn next_text(&mut self) -> Option<Result<String, GatewayError>>;
}

/// An open, bidirectional link to the broker.
pub struct Link {
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
}

impl Link {
    pub fn new(sink: impl FrameSink + 'static, source: impl FrameSource + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            source: Box::new(source),
        }
    }
}

/// Opens links to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a link, resolving once the transport reports itself open.
    async fn open(&self, endpoint: &str) -> Result<Link, GatewayError>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
