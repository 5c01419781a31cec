//! Chat-level handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::ClientCommand;

use super::super::error::ApiError;
use super::super::middleware::SessionName;
use super::super::state::AppState;
use super::run;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatIdBody {
    pub chat_id: String,
}

/// POST /chat/getClassInfo/{sessionId}
pub async fn get_class_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let chat = run(
        &state,
        &id,
        ClientCommand::GetChatById {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

/// POST /chat/clearMessages/{sessionId}
pub async fn clear_messages(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ChatClearMessages {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /chat/delete/{sessionId}
pub async fn delete_chat(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ChatDelete {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMessagesBody {
    pub chat_id: String,
    #[serde(default)]
    pub search_options: Value,
}

/// POST /chat/fetchMessages/{sessionId}
pub async fn fetch_messages(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<FetchMessagesBody>,
) -> Result<Json<Value>, ApiError> {
    let messages = run(
        &state,
        &id,
        ClientCommand::ChatFetchMessages {
            chat_id: body.chat_id,
            search_options: body.search_options,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

/// POST /chat/getContact/{sessionId}
pub async fn get_contact(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let contact = run(
        &state,
        &id,
        ClientCommand::ChatGetContact {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}
