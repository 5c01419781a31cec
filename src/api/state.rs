//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthState;
use crate::session::SessionRegistry;
use crate::user::UserService;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The session registry.
    pub registry: Arc<SessionRegistry>,
    /// Account service behind /auth.
    pub users: UserService,
    /// JWT issuance and validation.
    pub auth: AuthState,
    /// Shared key expected in `x-api-key`. `None` disables the key check.
    pub api_key: Option<String>,
    /// Idle threshold applied by /session/terminateInactive.
    pub idle_timeout: Duration,
    /// Expose POST /localCallbackExample.
    pub enable_local_callback: bool,
    /// Expose GET /api-docs.
    pub enable_swagger: bool,
}
