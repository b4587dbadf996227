//! Transport abstraction (§6): "a framed, ordered, full-duplex text-message
//! channel per endpoint." Kept as a trait so the engine/session layers
//! never depend on `axum` directly — tests can drive sessions with an
//! in-memory channel instead of a real socket.

use async_trait::async_trait;
use thiserror::Error;

use crate::session::messages::{ClientMessage, ServerMessage};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("read deadline exceeded")]
    ReadDeadlineExceeded,
    #[error("write deadline exceeded")]
    WriteDeadlineExceeded,
}

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Result<ClientMessage, TransportError>;
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use tokio::sync::mpsc;

    /// In-memory transport pair for session-layer tests.
    pub struct MemoryTransport {
        pub outbox: mpsc::UnboundedSender<ServerMessage>,
        pub inbox: mpsc::UnboundedReceiver<ClientMessage>,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError> {
            self.outbox.send(message).map_err(|_| TransportError::Closed)
        }

        async fn recv(&mut self) -> Result<ClientMessage, TransportError> {
            self.inbox.recv().await.ok_or(TransportError::Closed)
        }
    }
}
