use accounts_core::{Clock, PasswordHasher, TokenIssuer, UserId, UserProfile, UserStore, Visibility};

use crate::{credential_store::CredentialStore, error::AccountError};

/// Account status use case - soft-deletes and restores accounts
///
/// A deactivated account keeps its row, so its email and phone stay reserved.
pub struct AccountStatusUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> AccountStatusUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Deactivates the account and revokes every refresh token.
    #[tracing::instrument(name = "AccountStatusUseCase::deactivate", skip(self))]
    pub async fn deactivate(&self, user_id: &UserId) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::All)
            .await?;

        let registry = self.credential_store.refresh_tokens();
        let (user, ()) = self
            .credential_store
            .update(user, Visibility::All, |user, _| {
                user.deactivate();
                registry.revoke_all(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id(), "Account deactivated");
        Ok(UserProfile::from(&user))
    }

    #[tracing::instrument(name = "AccountStatusUseCase::reactivate", skip(self))]
    pub async fn reactivate(&self, user_id: &UserId) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::All)
            .await?;

        let (user, ()) = self
            .credential_store
            .update(user, Visibility::All, |user, _| {
                user.reactivate();
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id(), "Account reactivated");
        Ok(UserProfile::from(&user))
    }
}
