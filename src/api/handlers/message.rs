//! Message-level handlers. Messages are addressed by chat id plus message id.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{ClientCommand, MessageContent};

use super::super::error::ApiError;
use super::super::middleware::SessionName;
use super::super::state::AppState;
use super::run;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRefBody {
    pub chat_id: String,
    pub message_id: String,
}

/// POST /message/getClassInfo/{sessionId}
pub async fn get_class_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<MessageRefBody>,
) -> Result<Json<Value>, ApiError> {
    let message = run(
        &state,
        &id,
        ClientCommand::MessageGetClassInfo {
            chat_id: body.chat_id,
            message_id: body.message_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageBody {
    pub chat_id: String,
    pub message_id: String,
    #[serde(default)]
    pub everyone: bool,
}

/// POST /message/delete/{sessionId}
pub async fn delete_message(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<DeleteMessageBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::MessageDelete {
            chat_id: body.chat_id,
            message_id: body.message_id,
            everyone: body.everyone,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /message/downloadMedia/{sessionId}
pub async fn download_media(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<MessageRefBody>,
) -> Result<Json<Value>, ApiError> {
    let media = run(
        &state,
        &id,
        ClientCommand::MessageDownloadMedia {
            chat_id: body.chat_id,
            message_id: body.message_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "media": media })))
}

/// POST /message/getInfo/{sessionId}
pub async fn get_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<MessageRefBody>,
) -> Result<Json<Value>, ApiError> {
    let info = run(
        &state,
        &id,
        ClientCommand::MessageGetInfo {
            chat_id: body.chat_id,
            message_id: body.message_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "info": info })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyBody {
    pub chat_id: String,
    pub message_id: String,
    #[serde(flatten)]
    pub content: MessageContent,
    #[serde(default)]
    pub destination_chat_id: Option<String>,
    #[serde(default)]
    pub options: Value,
}

/// POST /message/reply/{sessionId}
pub async fn reply(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ReplyBody>,
) -> Result<Json<Value>, ApiError> {
    let message = run(
        &state,
        &id,
        ClientCommand::MessageReply {
            chat_id: body.chat_id,
            message_id: body.message_id,
            content: body.content,
            destination_chat_id: body.destination_chat_id,
            options: body.options,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": message })))
}
