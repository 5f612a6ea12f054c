use accounts_core::{
    Clock, EmailClient, PasswordHasher, TokenError, TokenIssuer, UserProfile, UserStore,
    UserStoreError, VerificationToken, Visibility,
};
use secrecy::{ExposeSecret, Secret};

use crate::{credential_store::CredentialStore, error::AccountError};

const SUBJECT: &str = "Reset your password";

/// Request password reset use case - emails a reset token
pub struct RequestPasswordResetUseCase<'a, U, H, T, C, E> {
    credential_store: CredentialStore<'a, U, H, T, C>,
    email_client: &'a E,
}

impl<'a, U, H, T, C, E> RequestPasswordResetUseCase<'a, U, H, T, C, E>
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

    /// Execute the request password reset use case
    ///
    /// # Arguments
    /// * `identifier` - Email or phone number
    ///
    /// # Returns
    /// `Ok(())` whether or not an account matches, so callers cannot learn
    /// which identifiers are registered.
    #[tracing::instrument(name = "RequestPasswordResetUseCase::execute", skip(self))]
    pub async fn execute(&self, identifier: &str) -> Result<(), AccountError> {
        let user = match self.credential_store.find_by_identifier(identifier).await {
            Ok(user) => user,
            Err(AccountError::NotFound | AccountError::Validation(_)) => {
                tracing::debug!("Password reset requested for unknown account");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let issuer = self.credential_store.verification_tokens();
        let (user, issued) = self
            .credential_store
            .update(
                user,
                Visibility::Active,
                |user, _| Ok(issuer.issue_password_reset(user)),
            )
            .await?;

        let content = format!(
            "Use the code below to reset your password:\n\n{}\n\nThe code expires at {}. \
             If you did not ask for a reset you can ignore this email.",
            issued.token.as_ref().expose_secret(),
            issued.expires_at.to_rfc2822()
        );
        self.email_client
            .send_email(user.email(), SUBJECT, &content)
            .await
            .map_err(AccountError::EmailDelivery)?;

        tracing::info!(user_id = %user.id(), "Password reset token sent");
        Ok(())
    }
}

/// Reset password use case - sets a new password using an emailed token
pub struct ResetPasswordUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> ResetPasswordUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the reset password use case
    ///
    /// # Arguments
    /// * `token` - The emailed reset token
    /// * `password` - New password
    /// * `password_confirm` - Must equal `password`
    ///
    /// # Returns
    /// The updated profile. The token is consumed and every refresh token of
    /// the user is revoked.
    #[tracing::instrument(name = "ResetPasswordUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        token: Secret<String>,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        let password = self
            .credential_store
            .validate_new_password(password, password_confirm)?;
        let token = VerificationToken::from(token);

        let user = match self
            .credential_store
            .user_store()
            .find_by_password_reset_token(&token.digest())
            .await
        {
            Ok(user) => user,
            Err(UserStoreError::UserNotFound) => return Err(TokenError::Mismatch.into()),
            Err(e) => return Err(e.into()),
        };
        let now = self.credential_store.clock().now();
        if user
            .password_reset()
            .is_some_and(|pending| pending.is_expired(now))
        {
            return Err(TokenError::Expired.into());
        }

        let password_hash = self.credential_store.hash_password(&password).await?;
        let issuer = self.credential_store.verification_tokens();
        let registry = self.credential_store.refresh_tokens();
        let (user, ()) = self
            .credential_store
            .update(user, Visibility::Active, |user, now| {
                issuer.consume_password_reset(user, &token)?;
                user.set_password_hash(password_hash.clone(), now);
                registry.revoke_all(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id(), "Password reset, all sessions revoked");
        Ok(UserProfile::from(&user))
    }
}
