use accounts_core::{Clock, PasswordHasher, TokenIssuer, UserProfile, UserStore};
use secrecy::Secret;

use crate::{
    credential_store::{CredentialStore, Registration},
    error::AccountError,
};

/// Register use case - creates a new account
pub struct RegisterUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> RegisterUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the register use case
    ///
    /// # Arguments
    /// * `registration` - Raw profile fields
    /// * `password` - Chosen password
    /// * `password_confirm` - Must equal `password`
    ///
    /// # Returns
    /// The public profile of the new account. No session is opened.
    #[tracing::instrument(name = "RegisterUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        registration: Registration,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store
            .register(registration, password, password_confirm)
            .await?;
        Ok(UserProfile::from(&user))
    }
}
