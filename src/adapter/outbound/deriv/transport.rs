//! WebSocket transport over `tokio-tungstenite`.
//!
//! Opens the TLS socket and splits it into the [`FrameSink`]/[`FrameSource`]
//! halves the gateway drives. Control frames never reach the gateway: pings
//! are answered by tungstenite on the read path, a close frame ends the
//! source. The connect timeout is enforced by the gateway.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::error::GatewayError;
use crate::port::outbound::transport::{Connector, FrameSink, FrameSource, Link};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production [`Connector`] for `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, endpoint: &str) -> Result<Link, GatewayError> {
        info!(url = %endpoint, "Connecting to WebSocket");

        let (ws, response) = connect_async(endpoint)
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        info!(status = %response.status(), "WebSocket connected");

        let (sink, stream) = ws.split();
        Ok(Link::new(WsSink { sink }, WsSource { stream }))
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError> {
        trace!(bytes = text.len(), "Sending WebSocket text frame");
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), GatewayError> {
        self.sink
            .close()
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))
    }
}

struct WsSource {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_text(&mut self) -> Option<Result<String, GatewayError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Some(Ok(text));
                }
                Ok(Message::Ping(_)) => trace!("Received WebSocket ping"),
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    return None;
                }
                Ok(Message::Binary(data)) => {
                    debug!(bytes = data.len(), "Ignoring binary WebSocket frame");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket error");
                    return Some(Err(GatewayError::Connection(e.to_string())));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_reports_name() {
        let connector = WebSocketConnector;
        assert_eq!(connector.name(), "websocket");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connection_error() {
        let connector = WebSocketConnector;
        let result = connector.open("ws://127.0.0.1:1/websockets/v3").await;
        assert!(matches!(result, Err(GatewayError::Connection(_))));
    }
}
