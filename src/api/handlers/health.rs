//! Health and callback-example handlers.

use axum::Json;
use log::info;
use serde_json::{json, Value};

/// GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "success": true, "message": "pong" }))
}

/// POST /localCallbackExample
///
/// Logs whatever webhook payload it receives. Meant for trying out the
/// webhook flow by pointing `webhook.base_url` at this gateway.
pub async fn local_callback_example(Json(payload): Json<Value>) -> Json<Value> {
    let session_id = payload
        .get("sessionId")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let data_type = payload
        .get("dataType")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!("Callback example received {} event for session {}", data_type, session_id);
    Json(json!({ "success": true }))
}
