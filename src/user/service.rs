//! Account service for registration and login.

use tracing::{info, instrument, warn};

use super::models::User;
use super::repository::UserRepository;
use super::UserError;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Service for account registration and credential checks.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new service over the repository.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Register a new account.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(UserError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if self
            .repo
            .get_by_email(&email)
            .await
            .map_err(UserError::Internal)?
            .is_some()
        {
            return Err(UserError::EmailTaken);
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| UserError::Internal(e.into()))?;
        let user = self
            .repo
            .create(&email, &hash)
            .await
            .map_err(UserError::Internal)?;
        info!(user_id = %user.id, "Registered new account");
        Ok(user)
    }

    /// Verify credentials; the same error covers unknown emails and wrong
    /// passwords so the endpoint does not leak which one it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self
            .repo
            .get_by_email(&email)
            .await
            .map_err(UserError::Internal)?
        else {
            warn!("Login attempt for unknown email");
            return Err(UserError::InvalidCredentials);
        };

        let ok = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| UserError::Internal(e.into()))?;
        if !ok {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        if let Err(e) = self.repo.touch_login(&user.id).await {
            warn!(user_id = %user.id, "Failed to stamp login: {e}");
        }
        Ok(user)
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn service() -> UserService {
        let db = Database::in_memory().await.unwrap();
        UserService::new(UserRepository::new(db.pool().clone()))
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let svc = service().await;
        let user = svc.register("user@example.com", "secret123").await.unwrap();
        assert_eq!(user.email, "user@example.com");

        let logged_in = svc.login("User@Example.com", "secret123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let svc = service().await;
        svc.register("user@example.com", "secret123").await.unwrap();
        let err = svc
            .register("user@example.com", "other-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let svc = service().await;
        svc.register("user@example.com", "secret123").await.unwrap();

        let wrong_pass = svc.login("user@example.com", "nope12").await.unwrap_err();
        let unknown = svc.login("ghost@example.com", "secret123").await.unwrap_err();
        assert_eq!(wrong_pass.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let svc = service().await;
        assert!(matches!(
            svc.register("not-an-email", "secret123").await.unwrap_err(),
            UserError::InvalidEmail
        ));
        assert!(matches!(
            svc.register("user@example.com", "short").await.unwrap_err(),
            UserError::WeakPassword(_)
        ));
    }
}
