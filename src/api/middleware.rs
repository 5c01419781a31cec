//! Request guards: API key check and session name validation.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::auth::bearer_token_from_header;

use super::error::ApiError;
use super::state::AppState;

/// Session ids are path segments and credential directory names, so the
/// charset is locked down before anything touches the registry.
static SESSION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w-]+$").unwrap_or_else(|e| panic!("invalid session name pattern: {e}"))
});

/// Guard for session and resource routes.
///
/// Accepts either the configured `x-api-key` header or a valid bearer token
/// issued by /auth/login. With no API key configured, the guard is inactive.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = &state.api_key else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) {
        return Ok(next.run(req).await);
    }

    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| bearer_token_from_header(header).ok());
    if let Some(token) = bearer {
        if state.auth.validate_token(token).is_ok() {
            return Ok(next.run(req).await);
        }
    }

    Err(ApiError::Unauthorized("invalid API key".to_string()))
}

/// Validated `sessionId` path parameter.
///
/// Extraction rejects malformed names with 422 and refreshes the session's
/// activity timestamp, so every session-scoped request counts against the
/// idle reaper.
#[derive(Debug, Clone)]
pub struct SessionName(pub String);

impl FromRequestParts<AppState> for SessionName {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(params): Path<HashMap<String, String>> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::BadRequest("missing sessionId".to_string()))?;
        let id = params
            .get("sessionId")
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("missing sessionId".to_string()))?;

        if !SESSION_NAME_RE.is_match(&id) {
            return Err(ApiError::UnprocessableEntity(
                "session id may only contain letters, numbers, underscores and hyphens"
                    .to_string(),
            ));
        }

        state.registry.touch(&id);
        Ok(SessionName(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_pattern() {
        for ok in ["abcd", "my-session", "user_1", "ABC-123"] {
            assert!(SESSION_NAME_RE.is_match(ok), "{ok} should match");
        }
        for bad in ["", "a b", "a/b", "a.b", "a@b", "../x"] {
            assert!(!SESSION_NAME_RE.is_match(bad), "{bad} should not match");
        }
    }
}
