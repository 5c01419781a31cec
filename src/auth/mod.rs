//! Token-based authentication.
//!
//! HS256 JWTs issued at login, validated on resource routes. The API-key
//! guard for session routes lives in the API middleware; this module owns
//! claims, token issuance and validation.

mod claims;
mod state;

pub use claims::Claims;
pub use state::{bearer_token_from_header, AuthState};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization")]
    MissingAuth,

    #[error("invalid authorization header")]
    InvalidAuthHeader,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("authentication error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
