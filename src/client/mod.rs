//! Messaging client boundary.
//!
//! The gateway never speaks the WhatsApp Web protocol itself. Everything
//! protocol-shaped lives behind [`MessagingClient`]: the production
//! implementation bridges to the sidecar automation engine over a Unix
//! socket, and tests substitute a scripted mock. Command results are opaque
//! JSON owned by the engine and passed through to API responses verbatim.

mod engine;
mod protocol;

pub use engine::{EngineClient, EngineClientFactory};
pub use protocol::{
    ClientCommand, EngineMessage, EngineRequest, LocationPayload, MediaPayload, MessageContent,
    PollPayload,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the messaging client boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The engine rejected or failed a command. The message is the engine's
    /// own wording and is passed through to API responses unmodified.
    #[error("{0}")]
    Engine(String),

    /// The connection to the engine is gone.
    #[error("engine connection closed")]
    Closed,

    /// Transport-level failure talking to the engine.
    #[error("engine transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The engine sent something we could not decode.
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

/// Lifecycle events emitted by a session's client.
///
/// Delivered in emission order over the per-session event channel; the
/// registry's state machine consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A pairing QR code was issued (or rotated).
    Qr { payload: String },
    /// Credentials were accepted.
    Authenticated,
    /// The client is fully connected and can serve requests.
    Ready,
    /// The connection dropped.
    Disconnected { reason: String },
    /// Authentication was rejected; the session will not recover on its own.
    AuthFailure { message: String },
}

/// Handle to one session's live connection to the automation engine.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Begin connecting. Returns once the engine has accepted the session;
    /// pairing and readiness are reported through [`ClientEvent`]s.
    async fn connect(&self) -> ClientResult<()>;

    /// Execute one messaging operation and return its raw JSON result.
    async fn execute(&self, command: ClientCommand) -> ClientResult<Value>;

    /// Tear down the connection. Safe to call more than once.
    async fn disconnect(&self) -> ClientResult<()>;
}

/// Creates clients bound to a session id and its credential state.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Build a client for the session, returning the handle together with
    /// the receiving end of its lifecycle event channel.
    async fn create(
        &self,
        session_id: &str,
    ) -> ClientResult<(Arc<dyn MessagingClient>, mpsc::Receiver<ClientEvent>)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_wire_shape() {
        let event = ClientEvent::Qr {
            payload: "2@abc".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "qr");
        assert_eq!(json["payload"], "2@abc");

        let back: ClientEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_engine_error_message_is_verbatim() {
        let err = ClientError::Engine("Evaluation failed: page crashed".to_string());
        assert_eq!(err.to_string(), "Evaluation failed: page crashed");
    }
}
