use accounts_core::{
    Clock, PasswordHasher, Role, TokenIssuer, UserId, UserProfile, UserStore, Visibility,
};

use crate::{credential_store::CredentialStore, error::AccountError};

/// Change role use case - grants or removes administrative rights
pub struct ChangeRoleUseCase<'a, U, H, T, C> {
    credential_store: CredentialStore<'a, U, H, T, C>,
}

impl<'a, U, H, T, C> ChangeRoleUseCase<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(credential_store: CredentialStore<'a, U, H, T, C>) -> Self {
        Self { credential_store }
    }

    /// The new role shows up in access tokens issued from now on; tokens
    /// already issued keep the old role until they expire.
    #[tracing::instrument(name = "ChangeRoleUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: &UserId, role: Role) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store
            .get_user(user_id, Visibility::Active)
            .await?;
        if user.role() == role {
            return Ok(UserProfile::from(&user));
        }

        let (user, ()) = self
            .credential_store
            .update(user, Visibility::Active, |user, _| {
                user.set_role(role);
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id(), role = %role, "Role changed");
        Ok(UserProfile::from(&user))
    }
}
