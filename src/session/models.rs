//! Session data models and the lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ClientEvent;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// The client is being created and connected.
    Starting,
    /// A pairing QR code is available and awaiting scan.
    ScanQrCode,
    /// Credentials were accepted; not yet fully connected.
    Authenticated,
    /// Fully connected; messaging operations are served.
    Connected,
    /// The connection dropped.
    Disconnected,
    /// Authentication was rejected; will not recover without a restart.
    Failed,
    /// Torn down. Terminal.
    Terminated,
}

impl SessionStatus {
    /// Apply one lifecycle event, yielding the next status.
    ///
    /// `Terminated` absorbs everything; `Disconnected` and `Failed` are
    /// reachable from any non-terminal state.
    pub fn apply(self, event: &ClientEvent) -> SessionStatus {
        if self == SessionStatus::Terminated {
            return self;
        }
        match event {
            ClientEvent::Qr { .. } => SessionStatus::ScanQrCode,
            ClientEvent::Authenticated => SessionStatus::Authenticated,
            ClientEvent::Ready => SessionStatus::Connected,
            ClientEvent::Disconnected { .. } => SessionStatus::Disconnected,
            ClientEvent::AuthFailure { .. } => SessionStatus::Failed,
        }
    }

    /// Whether the session can serve messaging operations.
    pub fn is_ready(self) -> bool {
        self == SessionStatus::Connected
    }

    /// Whether no further events will be applied.
    pub fn is_terminal(self) -> bool {
        self == SessionStatus::Terminated
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Starting => "STARTING",
            SessionStatus::ScanQrCode => "SCAN_QR_CODE",
            SessionStatus::Authenticated => "AUTHENTICATED",
            SessionStatus::Connected => "CONNECTED",
            SessionStatus::Disconnected => "DISCONNECTED",
            SessionStatus::Failed => "FAILED",
            SessionStatus::Terminated => "TERMINATED",
        };
        write!(f, "{}", s)
    }
}

/// Point-in-time view of a session, as reported by status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id (also the credential blob key).
    pub id: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Whether a QR payload is currently available to scan.
    pub qr_available: bool,
    /// Last time a session-scoped request touched this session.
    pub last_activity: DateTime<Utc>,
}
