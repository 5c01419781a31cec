//! Unified API error handling with enveloped responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::client::ClientError;
use crate::session::RegistryError;
use crate::user::UserError;

/// API error type. Every variant renders as `{"success": false, "message"}`
/// with a fixed status code; messages are human-readable and never carry
/// stack traces.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    /// Opaque failure from the automation engine, passed through verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("API error ({}): {}", status, self);
        } else {
            warn!("API error ({}): {}", status, self);
        }
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RegistryError::NotReady { .. } => ApiError::Conflict(err.to_string()),
            RegistryError::QrNotAvailable(_) => {
                ApiError::NotFound("QR code not ready or already scanned".to_string())
            }
            RegistryError::QrRetriesExceeded(_) => ApiError::Conflict(err.to_string()),
            RegistryError::Client(e) => e.into(),
            RegistryError::Storage(e) => ApiError::Internal(e.to_string()),
            RegistryError::Qr(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        // Engine failure messages reach the caller unmodified.
        ApiError::Upstream(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidEmail | UserError::WeakPassword(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UserError::EmailTaken => ApiError::Conflict(err.to_string()),
            UserError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            UserError::Internal(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;

    #[test]
    fn test_registry_errors_map_to_fixed_codes() {
        let not_found: ApiError = RegistryError::NotFound("abcd".into()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let not_ready: ApiError = RegistryError::NotReady {
            id: "abcd".into(),
            status: SessionStatus::Starting,
        }
        .into();
        assert_eq!(not_ready.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_engine_message_passes_through() {
        let err: ApiError = ClientError::Engine("Evaluation failed: target closed".into()).into();
        assert_eq!(err.to_string(), "Evaluation failed: target closed");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
