//! Contact-level handlers.

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
pub struct ContactIdBody {
    pub contact_id: String,
}

/// POST /contact/getClassInfo/{sessionId}
pub async fn get_class_info(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let contact = run(
        &state,
        &id,
        ClientCommand::ContactGetClassInfo {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}

/// POST /contact/block/{sessionId}
pub async fn block(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ContactBlock {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /contact/unblock/{sessionId}
pub async fn unblock(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ContactUnblock {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /contact/getAbout/{sessionId}
pub async fn get_about(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let about = run(
        &state,
        &id,
        ClientCommand::ContactGetAbout {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "about": about })))
}

/// POST /contact/getChat/{sessionId}
pub async fn get_chat(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let chat = run(
        &state,
        &id,
        ClientCommand::ContactGetChat {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

/// POST /contact/getFormattedNumber/{sessionId}
pub async fn get_formatted_number(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ContactGetFormattedNumber {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /contact/getCountryCode/{sessionId}
pub async fn get_country_code(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ContactGetCountryCode {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

/// POST /contact/getProfilePicUrl/{sessionId}
pub async fn get_profile_pic_url(
    State(state): State<AppState>,
    SessionName(id): SessionName,
    Json(body): Json<ContactIdBody>,
) -> Result<Json<Value>, ApiError> {
    let result = run(
        &state,
        &id,
        ClientCommand::ContactGetProfilePicUrl {
            contact_id: body.contact_id,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}
