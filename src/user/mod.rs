//! Gateway account management.
//!
//! Backs the `/auth/register` and `/auth/login` endpoints: accounts live in
//! SQLite, passwords are bcrypt-hashed, successful logins are stamped.

mod models;
mod repository;
mod service;

pub use models::{Credentials, User, UserInfo};
pub use repository::UserRepository;
pub use service::UserService;

use thiserror::Error;

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
