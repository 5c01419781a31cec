//! Group chat handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{ClientCommand, MediaPayload};

use super::super::error::ApiError;
use super::super::middleware::SessionName;
use super::super::state::AppState;
use super::run;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatIdBody {
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsBody {
    pub chat_id: String,
    pub participants: Vec<String>,
}

/// POST /groupChat/getClassInfo/{sessionId}
pub async fn get_class_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let chat = run(
        &state,
        &id,
        ClientCommand::GroupGetClassInfo {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

/// POST /groupChat/addParticipants/{sessionId}
pub async fn add_participants(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ParticipantsBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupAddParticipants {
            chat_id: body.chat_id,
            participants: body.participants,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /groupChat/removeParticipants/{sessionId}
pub async fn remove_participants(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ParticipantsBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupRemoveParticipants {
            chat_id: body.chat_id,
            participants: body.participants,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /groupChat/getInviteCode/{sessionId}
pub async fn get_invite_code(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let invite_code = run(
        &state,
        &id,
        ClientCommand::GroupGetInviteCode {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "inviteCode": invite_code })))
}

/// POST /groupChat/leave/{sessionId}
pub async fn leave(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupLeave {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSubjectBody {
    pub chat_id: String,
    pub subject: String,
}

/// POST /groupChat/setSubject/{sessionId}
pub async fn set_subject(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SetSubjectBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupSetSubject {
            chat_id: body.chat_id,
            subject: body.subject,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDescriptionBody {
    pub chat_id: String,
    pub description: String,
}

/// POST /groupChat/setDescription/{sessionId}
pub async fn set_description(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SetDescriptionBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupSetDescription {
            chat_id: body.chat_id,
            description: body.description,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminsOnlyBody {
    pub chat_id: String,
    #[serde(default)]
    pub admins_only: bool,
}

/// POST /groupChat/setInfoAdminsOnly/{sessionId}
pub async fn set_info_admins_only(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<AdminsOnlyBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupSetInfoAdminsOnly {
            chat_id: body.chat_id,
            admins_only: body.admins_only,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /groupChat/setMessagesAdminsOnly/{sessionId}
pub async fn set_messages_admins_only(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<AdminsOnlyBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupSetMessagesAdminsOnly {
            chat_id: body.chat_id,
            admins_only: body.admins_only,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPictureBody {
    pub chat_id: String,
    pub media: MediaPayload,
}

/// POST /groupChat/setPicture/{sessionId}
pub async fn set_picture(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<SetPictureBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupSetPicture {
            chat_id: body.chat_id,
            media: body.media,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /groupChat/deletePicture/{sessionId}
pub async fn delete_picture(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ChatIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::GroupDeletePicture {
            chat_id: body.chat_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}
