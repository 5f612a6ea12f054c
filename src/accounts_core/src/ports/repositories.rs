use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    email::Email, phone::Phone, user::User, user_id::UserId, verification_token::TokenDigest,
};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Phone is already registered")]
    DuplicatePhone,
    #[error("User not found")]
    UserNotFound,
    #[error("User was modified concurrently")]
    Conflict,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::DuplicateEmail, Self::DuplicateEmail)
                | (Self::DuplicatePhone, Self::DuplicatePhone)
                | (Self::UserNotFound, Self::UserNotFound)
                | (Self::Conflict, Self::Conflict)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

/// Whether a lookup may return deactivated accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Active,
    All,
}

/// Persistence boundary for the user aggregate.
///
/// Email and phone are unique across every record, deactivated ones included.
/// `update_user` is conditioned on the version the caller last saw and bumps it
/// on success; a stale version fails with [`UserStoreError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_user(&self, user: User) -> Result<User, UserStoreError>;
    async fn get_user(&self, id: &UserId, visibility: Visibility) -> Result<User, UserStoreError>;
    async fn find_by_email(&self, email: &Email) -> Result<User, UserStoreError>;
    async fn find_by_phone(&self, phone: &Phone) -> Result<User, UserStoreError>;
    async fn find_by_password_reset_token(
        &self,
        digest: &TokenDigest,
    ) -> Result<User, UserStoreError>;
    async fn update_user(&self, user: &User) -> Result<User, UserStoreError>;
}
