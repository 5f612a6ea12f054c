use accounts_core::{
    Clock, EmailClient, PasswordHasher, TokenIssuer, UserId, UserProfile, UserStore,
    ValidationError, VerificationToken, Visibility,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};

use crate::{credential_store::CredentialStore, error::AccountError};

const SUBJECT: &str = "Verify your email address";

/// Request email verification use case - emails a single-use token
pub struct RequestEmailVerificationUseCase<'a, U, H, T, C, E> {
    credential_store: CredentialStore<'a, U, H, T, C>,
    email_client: &'a E,
}

impl<'a, U, H, T, C, E> RequestEmailVerificationUseCase<'a, U, H, T, C, E>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
    E: EmailClient,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>, email_client: &'a E) -> Self {
        Self {
            credential_store,
            email_client,
        }
    }

    /// Execute the request email verification use case
    ///
    /// # Returns
    /// When the emailed token expires. Any earlier token stops working.
    #[tracing::instrument(name = "RequestEmailVerificationUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: &UserId) -> Result<DateTime<Utc>, AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::Active)
            .await?;

        let issuer = self.credential_store.verification_tokens();
        let (user, issued) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                if user.email_verified() {
                    return Err(ValidationError::EmailAlreadyVerified.into());
                }
                Ok(issuer.issue_email_verification(user))
            })
            .await?;

        let content = format!(
            "Use the code below to verify your email address:\n\n{}\n\nThe code expires at {}.",
            issued.token.as_ref().expose_secret(),
            issued.expires_at.to_rfc2822()
        );
        self.email_client
            .send_email(user.email(), SUBJECT, &content)
            .await
            .map_err(AccountError::EmailDelivery)?;

        tracing::info!(user_id = %user.id(), "Email verification token sent");
        Ok(issued.expires_at)
    }
}

/// Verify email use case - consumes the emailed token
pub struct VerifyEmailUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> VerifyEmailUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the verify email use case
    ///
    /// A wrong or expired token leaves the account unchanged.
    ///
    /// Every write drops pending tokens that have expired, so once anything
    /// else has been saved after the expiry a stale token reads as
    /// `TokenError::Mismatch` rather than `TokenError::Expired`.
    #[tracing::instrument(name = "VerifyEmailUseCase::execute", skip(self, token))]
    pub async fn execute(
        &self,
        user_id: &UserId,
        token: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        let token = VerificationToken::from(token);
        let user = self
            .credential_store
            .get_user(user_id, Visibility::Active)
            .await?;

        let issuer = self.credential_store.verification_tokens();
        let (user, ()) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                if user.email_verified() {
                    return Err(ValidationError::EmailAlreadyVerified.into());
                }
                Ok(issuer.consume_email_verification(user, &token)?)
            })
            .await?;

        tracing::info!(user_id = %user.id(), "Email verified");
        Ok(UserProfile::from(&user))
    }
}
