use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use thiserror::Error;

use crate::domain::{
    email::Email,
    password::{Password, PasswordHash},
    tokens::{AccessClaims, AccessToken, RefreshClaims, RefreshToken, TokenError},
    user::User,
};

/// Port trait for email sending service
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), String>;
}

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("Password hashing backend failed: {0}")]
    Backend(String),
}

/// One-way, salted password hashing.
///
/// `verify` answers `Ok(false)` for malformed or foreign hashes; `Err` is
/// reserved for backend failures and must never be read as a match.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(
        &self,
        candidate: &Secret<String>,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;

    /// A well-formed hash made with the current cost parameters that belongs
    /// to no account. Verifying against it costs as much as a real check.
    fn dummy_hash(&self) -> &PasswordHash;
}

/// Issues and verifies signed access and refresh tokens.
///
/// Access and refresh tokens are signed with independent secrets and each is
/// only ever verified against its own.
pub trait TokenIssuer: Send + Sync {
    fn issue_access_token(&self, user: &User) -> Result<AccessToken, TokenError>;
    fn issue_refresh_token(&self, user: &User) -> Result<RefreshToken, TokenError>;
    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError>;
    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
