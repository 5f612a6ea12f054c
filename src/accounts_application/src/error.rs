use std::fmt;

use accounts_core::{PasswordHasherError, TokenError, UserError, UserStoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    Email,
    Phone,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateKey::Email => f.write_str("Email"),
            DuplicateKey::Phone => f.write_str("Phone"),
        }
    }
}

/// Every failure an account operation can surface to the calling layer.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0} is already registered")]
    DuplicateKey(DuplicateKey),

    #[error("Incorrect credentials")]
    Authentication,

    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("The account was modified concurrently, please retry")]
    Conflict,

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    PasswordHashing(#[from] PasswordHasherError),

    #[error("Failed to send email: {0}")]
    EmailDelivery(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AccountError {
    /// Only optimistic-concurrency conflicts are safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountError::Conflict)
    }
}

impl From<UserStoreError> for AccountError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::DuplicateEmail => AccountError::DuplicateKey(DuplicateKey::Email),
            UserStoreError::DuplicatePhone => AccountError::DuplicateKey(DuplicateKey::Phone),
            UserStoreError::UserNotFound => AccountError::NotFound,
            UserStoreError::Conflict => AccountError::Conflict,
            UserStoreError::UnexpectedError(e) => AccountError::Unexpected(e),
        }
    }
}

impl From<UserError> for AccountError {
    fn from(error: UserError) -> Self {
        AccountError::Validation(ValidationError::FieldConstraint(error))
    }
}
