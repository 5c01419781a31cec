//! Session lifecycle management.
//!
//! The registry owns every live client connection, keyed by session id, and
//! drives the lifecycle state machine from the client's event stream. The
//! reaper tears down idle sessions in the background.

pub mod models;
pub mod reaper;
mod registry;

pub use models::{SessionSnapshot, SessionStatus};
pub use registry::{RegistryConfig, SessionRegistry};

use thiserror::Error;

use crate::client::ClientError;
use crate::qr::QrError;
use crate::store::StorageError;

/// Errors surfaced by the session registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No live session with this id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The session exists but cannot serve commands yet.
    #[error("session {id} is not ready (status: {status})")]
    NotReady { id: String, status: SessionStatus },

    /// The session is not awaiting a QR scan.
    #[error("QR code not available for session: {0}")]
    QrNotAvailable(String),

    /// The pairing QR rotated past the configured retry limit unscanned.
    #[error("QR retry limit exceeded for session: {0}")]
    QrRetriesExceeded(String),

    /// Credential store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Client boundary failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// QR rendering failure.
    #[error(transparent)]
    Qr(#[from] QrError),
}
