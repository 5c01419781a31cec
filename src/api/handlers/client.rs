//! Client-level messaging handlers.

use axum::extract::State;
use axum::Json;
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{ClientCommand, MessageContent};

use super::super::error::ApiError;
use super::super::middleware::SessionName;
use super::super::state::AppState;
use super::run;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub chat_id: String,
    #[serde(flatten)]
    pub content: MessageContent,
    #[serde(default)]
    pub options: Value,
}

/// POST /client/sendMessage/{sessionId}
pub async fn send_message(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<Value>, ApiError> {
    let message = run(
        &state,
        &id,
        ClientCommand::SendMessage {
            chat_id: body.chat_id,
            content: body.content,
            options: body.options,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageAllBody {
    pub messages: Vec<SendMessageBody>,
}

/// GET /client/sendMessageAll/{sessionId}
///
/// Sends each entry in turn; failures are logged and skipped so one bad
/// recipient does not abort the batch.
pub async fn send_message_all(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SendMessageAllBody>,
) -> Result<Json<Value>, ApiError> {
    let client = state.registry.get(&id)?;
    let mut sent = Vec::new();
    for item in body.messages {
        let chat_id = item.chat_id.clone();
        match client
            .execute(ClientCommand::SendMessage {
                chat_id: item.chat_id,
                content: item.content,
                options: item.options,
            })
            .await
        {
            Ok(message) => sent.push(message),
            Err(e) => warn!("Failed to send message to {}: {}", chat_id, e),
        }
    }
    Ok(Json(json!({ "success": true, "sentMessages": sent })))
}

/// GET /client/getClassInfo/{sessionId}
pub async fn get_class_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let session_info = run(&state, &id, ClientCommand::GetClassInfo).await?;
    Ok(Json(json!({ "success": true, "sessionInfo": session_info })))
}

/// GET /client/getState/{sessionId}
///
/// Works before the session is ready, so callers can poll the engine state
/// while pairing is still in progress.
pub async fn get_state(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let client = state.registry.client(&id)?;
    let engine_state = client.execute(ClientCommand::GetState).await?;
    Ok(Json(json!({ "success": true, "state": engine_state })))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub status: String,
}

/// POST /client/setStatus/{sessionId}
pub async fn set_status(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<Value>, ApiError> {
    run(&state, &id, ClientCommand::SetStatus { status: body.status }).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /client/getChats/{sessionId}
pub async fn get_chats(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let chats = run(&state, &id, ClientCommand::GetChats).await?;
    Ok(Json(json!({ "success": true, "chats": chats })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatIdBody {
    pub chat_id: String,
}

/// POST /client/getChatById/{sessionId}
pub async fn get_chat_by_id(
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

/// GET /client/getContacts/{sessionId}
pub async fn get_contacts(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let contacts = run(&state, &id, ClientCommand::GetContacts).await?;
    Ok(Json(json!({ "success": true, "contacts": contacts })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactIdBody {
    pub contact_id: String,
}

/// POST /client/getContactById/{sessionId}
pub async fn get_contact_by_id(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let contact = run(
        &state,
        &id,
        ClientCommand::GetContactById {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}

#[derive(Debug, Deserialize)]
pub struct NumberBody {
    pub number: String,
}

/// POST /client/getNumberId/{sessionId}
pub async fn get_number_id(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<NumberBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GetNumberId {
            number: body.number,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /client/isRegisteredUser/{sessionId}
pub async fn is_registered_user(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<NumberBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::IsRegisteredUser {
            number: body.number,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub name: String,
    pub participants: Vec<String>,
}

/// POST /client/createGroup/{sessionId}
pub async fn create_group(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<CreateGroupBody>,
) -> Result<Json<Value>, ApiError> {
    let response = run(
        &state,
        &id,
        ClientCommand::CreateGroup {
            title: body.name,
            participants: body.participants,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "response": response })))
}
