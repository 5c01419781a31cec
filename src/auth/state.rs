//! Token issuance and validation.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::warn;
use std::sync::Arc;

use crate::user::User;

use super::{AuthError, Claims};

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: i64 = 3600 * 24;

/// Issuer stamped into gateway tokens.
const ISSUER: &str = "wagate";

/// Extract a Bearer token from an Authorization header value.
pub fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Shared JWT state: one HS256 secret for encode and decode.
#[derive(Clone)]
pub struct AuthState {
    secret: Arc<String>,
    decoding_key: Arc<DecodingKey>,
}

impl AuthState {
    /// Create auth state from the configured secret.
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            secret: Arc::new(jwt_secret.to_string()),
            decoding_key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        }
    }

    /// Issue a token for an account.
    pub fn generate_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iss: Some(ISSUER.to_string()),
            exp: now + TOKEN_TTL_SECS,
            iat: Some(now),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Validate a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("JWT validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "usr_test".to_string(),
            email: "user@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_bearer_token_from_header_valid() {
        assert_eq!(
            bearer_token_from_header("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
        assert_eq!(
            bearer_token_from_header("bearer   token123").unwrap(),
            "token123"
        );
    }

    #[test]
    fn test_bearer_token_from_header_invalid() {
        let cases = ["", "Bearer", "Bearer ", "Token x", "Bearer token extra"];
        for case in cases {
            assert!(
                bearer_token_from_header(case).is_err(),
                "{case} should fail"
            );
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let state = AuthState::new("test-secret-for-unit-tests-minimum-32-chars");
        let token = state.generate_token(&test_user()).unwrap();
        let claims = state.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "usr_test");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.iss.as_deref(), Some("wagate"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuing = AuthState::new("secret-one-that-is-long-enough-for-tests");
        let verifying = AuthState::new("secret-two-that-is-long-enough-for-tests");
        let token = issuing.generate_token(&test_user()).unwrap();
        assert!(matches!(
            verifying.validate_token(&token).unwrap_err(),
            AuthError::InvalidToken(_)
        ));
    }
}
