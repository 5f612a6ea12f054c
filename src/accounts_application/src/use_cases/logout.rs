use accounts_core::{Clock, PasswordHasher, TokenIssuer, UserId, UserStore, Visibility};

use crate::{credential_store::CredentialStore, error::AccountError};

/// Logout use case - ends one session or every session of a user
pub struct LogoutUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> LogoutUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Revokes a single refresh token. Revoking a token that is not live
    /// succeeds without touching the record.
    #[tracing::instrument(name = "LogoutUseCase::execute", skip(self, refresh_token))]
    pub async fn execute(&self, user_id: &UserId, refresh_token: &str) -> Result<(), AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::Active)
            .await?;
        if !user.refresh_tokens().contains(refresh_token) {
            tracing::debug!("Refresh token already revoked");
            return Ok(());
        }

        let registry = self.credential_store.refresh_tokens();
        self.credential_store
            .update(user, Visibility::Active, |user, _| {
                registry.revoke(user, refresh_token);
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Revokes every refresh token of the user, signing out all devices.
    #[tracing::instrument(name = "LogoutUseCase::execute_everywhere", skip(self))]
    pub async fn execute_everywhere(&self, user_id: &UserId) -> Result<(), AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::Active)
            .await?;
        if user.refresh_tokens().is_empty() {
            return Ok(());
        }

        let registry = self.credential_store.refresh_tokens();
        let (user, ()) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                registry.revoke_all(user);
                Ok(())
            })
            .await?;
        tracing::info!(user_id = %user.id(), "All sessions revoked");
        Ok(())
    }
}
