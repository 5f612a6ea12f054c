use accounts_core::{
    Clock, PasswordHasher, TokenError, TokenIssuer, TokenPair, UserStore, UserStoreError,
    Visibility,
};

use crate::{credential_store::CredentialStore, error::AccountError};

/// Refresh use case - exchanges a live refresh token for a new token pair
pub struct RefreshUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> RefreshUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the refresh use case
    ///
    /// The presented token is rotated: it stops being accepted the moment the
    /// replacement is persisted. Presenting it again fails with
    /// [`TokenError::NotRecognized`].
    #[tracing::instrument(name = "RefreshUseCase::execute", skip_all)]
    pub async fn execute(&self, presented: &str) -> Result<TokenPair, AccountError> {
        let token_issuer = self.credential_store.token_issuer();
        let claims = token_issuer.verify_refresh_token(presented)?;
        let user_id = claims.user_id()?;

        let user = match self
            .credential_store
            .user_store()
            .get_user(&user_id, Visibility::Active)
            .await
        {
            Ok(user) => user,
            Err(UserStoreError::UserNotFound) => return Err(TokenError::NotRecognized.into()),
            Err(e) => return Err(e.into()),
        };

        let registry = self.credential_store.refresh_tokens();
        let (user, tokens) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                let access_token = token_issuer.issue_access_token(user)?;
                let refresh_token = registry.rotate(user, presented)?;
                Ok(TokenPair {
                    access_token,
                    refresh_token,
                })
            })
            .await?;

        tracing::debug!(user_id = %user.id(), "Refresh token rotated");
        Ok(tokens)
    }
}
