//! `axum` WebSocket bridge implementing [`super::transport::Transport`],
//! grounded in the pack's `echo-session-ws-gateway` (`axum::extract::ws`
//! upgrade handling, JSON encode/decode at the boundary).

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::session::messages::{ClientMessage, ServerMessage};

use super::transport::{Transport, TransportError};

/// Bridges one `axum` WebSocket to [`Transport`], enforcing the per-endpoint
/// read/write deadlines of §5 via `tokio::time::timeout`.
pub struct WebSocketTransport {
    socket: WebSocket,
    read_deadline: Duration,
    write_deadline: Duration,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self::with_deadlines(socket, Duration::from_secs(30), Duration::from_secs(5))
    }

    pub fn with_deadlines(socket: WebSocket, read_deadline: Duration, write_deadline: Duration) -> Self {
        Self { socket, read_deadline, write_deadline }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError> {
        let text = serde_json::to_string(&message).map_err(|e| TransportError::Malformed(e.to_string()))?;
        match tokio::time::timeout(self.write_deadline, self.socket.send(Message::Text(text.into()))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::WriteDeadlineExceeded),
        }
    }

    async fn recv(&mut self) -> Result<ClientMessage, TransportError> {
        loop {
            let next = match tokio::time::timeout(self.read_deadline, self.socket.next()).await {
                Ok(next) => next,
                Err(_) => return Err(TransportError::ReadDeadlineExceeded),
            };
            match next {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).map_err(|e| TransportError::Malformed(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => continue, // ping/pong/binary frames carry no game data
                Some(Err(_)) => return Err(TransportError::Closed),
            }
        }
    }
}
