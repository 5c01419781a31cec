//! Session lifecycle handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use super::super::error::ApiError;
use super::super::middleware::SessionName;
use super::super::state::AppState;

/// GET /session/start/{sessionId}
pub async fn start(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let status = state.registry.start(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Session initiated successfully",
        "state": status,
    })))
}

/// GET /session/status/{sessionId}
pub async fn status(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.registry.status(&id)?;
    Ok(Json(json!({
        "success": true,
        "state": snapshot.status,
        "qrAvailable": snapshot.qr_available,
        "lastActivity": snapshot.last_activity,
    })))
}

/// GET /session/qr/{sessionId}
pub async fn qr_code(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let qr = state.registry.qr_code(&id)?;
    Ok(Json(json!({ "success": true, "qr": qr })))
}

/// GET /session/qr/{sessionId}/image
pub async fn qr_image(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<impl IntoResponse, ApiError> {
    let png = state.registry.qr_png(&id)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// GET /session/restart/{sessionId}
pub async fn restart(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    let status = state.registry.restart(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Restarted successfully",
        "state": status,
    })))
}

/// GET /session/terminate/{sessionId}
pub async fn terminate(
    State(state): State<AppState>,
    SessionName(id): SessionName,
) -> Result<Json<Value>, ApiError> {
    state.registry.terminate(&id).await;
    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}

/// GET /session/terminateInactive
pub async fn terminate_inactive(State(state): State<AppState>) -> Json<Value> {
    let terminated = state.registry.terminate_inactive(state.idle_timeout).await;
    Json(json!({
        "success": true,
        "message": "Flush completed successfully",
        "terminated": terminated,
    }))
}

/// GET /session/terminateAll
pub async fn terminate_all(State(state): State<AppState>) -> Json<Value> {
    let terminated = state.registry.terminate_all().await;
    Json(json!({
        "success": true,
        "message": "Flush completed successfully",
        "terminated": terminated,
    }))
}
