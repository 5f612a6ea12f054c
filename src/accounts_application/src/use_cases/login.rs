use accounts_core::{
    Clock, PasswordHasher, TokenIssuer, TokenPair, UserProfile, UserStore, Visibility,
};
use secrecy::Secret;
use serde::Serialize;

use crate::{credential_store::CredentialStore, error::AccountError};

/// Response from login use case
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Login use case - authenticates and opens a new session
pub struct LoginUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> LoginUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the login use case
    ///
    /// # Arguments
    /// * `identifier` - Email or phone number
    /// * `password` - Candidate password
    ///
    /// # Returns
    /// The profile plus an access token and a refresh token for the new
    /// session. Existing sessions on other devices stay live.
    #[tracing::instrument(name = "LoginUseCase::execute", skip(self, password))]
    pub async fn execute(
        &self,
        identifier: &str,
        password: Secret<String>,
    ) -> Result<LoginResponse, AccountError> {
        let user = self
            .credential_store
            .authenticate(identifier, &password)
            .await?;

        // Both tokens are minted before the session is stored, so a signing
        // failure leaves no orphaned refresh token behind.
        let token_issuer = self.credential_store.token_issuer();
        let registry = self.credential_store.refresh_tokens();
        let (user, tokens) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                let access_token = token_issuer.issue_access_token(user)?;
                let refresh_token = registry.issue(user)?;
                Ok(TokenPair {
                    access_token,
                    refresh_token,
                })
            })
            .await?;

        tracing::info!(
            user_id = %user.id(),
            sessions = user.refresh_tokens().len(),
            "User logged in"
        );
        Ok(LoginResponse {
            user: UserProfile::from(&user),
            tokens,
        })
    }
}
