//! Account registration and login handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::user::Credentials;

use super::super::error::ApiError;
use super::super::state::AppState;

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.users.register(&body.email, &body.password).await?;
    let token = state
        .auth
        .generate_token(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "user saved",
            "token": token,
            "user": user.info(),
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.login(&body.email, &body.password).await?;
    let token = state
        .auth
        .generate_token(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": user.info(),
    })))
}
