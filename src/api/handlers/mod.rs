//! HTTP handlers, split per resource.

pub mod auth;
pub mod chat;
pub mod client;
pub mod contact;
pub mod docs;
pub mod group_chat;
pub mod health;
pub mod message;
pub mod session;

use serde_json::Value;

use crate::client::ClientCommand;

use super::error::ApiError;
use super::state::AppState;

/// Execute one command against a session that must be ready.
pub(super) async fn run(
    state: &AppState,
    session_id: &str,
    command: ClientCommand,
) -> Result<Value, ApiError> {
    let client = state.registry.get(session_id)?;
    Ok(client.execute(command).await?)
}
