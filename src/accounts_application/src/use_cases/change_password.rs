use accounts_core::{Clock, PasswordHasher, TokenIssuer, UserId, UserProfile, UserStore};
use secrecy::Secret;

use crate::{credential_store::CredentialStore, error::AccountError};

/// Change password use case - replaces the password of a signed-in user
pub struct ChangePasswordUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> ChangePasswordUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// Execute the change password use case
    ///
    /// # Arguments
    /// * `user_id` - The authenticated user
    /// * `password` - New password
    /// * `password_confirm` - Must equal `password`
    ///
    /// # Returns
    /// The updated profile. Every refresh token of the user is revoked.
    #[tracing::instrument(
        name = "ChangePasswordUseCase::execute",
        skip(self, password, password_confirm)
    )]
    pub async fn execute(
        &self,
        user_id: &UserId,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store
            .change_password(user_id, password, password_confirm)
            .await?;
        Ok(UserProfile::from(&user))
    }
}
