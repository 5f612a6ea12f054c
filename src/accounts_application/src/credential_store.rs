use accounts_core::{
    Address, Clock, Email, NewUser, Password, PasswordHash, PasswordHasher, Phone,
    RefreshTokenRegistry, TokenIssuer, User, UserError, UserId, UserName, UserStore, UserStoreError,
    ValidationError, VerificationTokenIssuer, Visibility,
};
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, Secret};

use crate::error::AccountError;

/// Raw profile fields supplied at sign-up.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Secret<String>,
    pub phone: String,
    pub photo: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

impl Registration {
    fn into_new_user(self) -> Result<NewUser, UserError> {
        Ok(NewUser {
            name: UserName::parse(&self.name)?,
            email: Email::try_from(self.email)?,
            phone: Phone::parse(&self.phone)?,
            photo: self.photo,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
        })
    }
}

/// Entry point for every write to a user record.
///
/// Writes follow one explicit pipeline: validate, hash (outside the store),
/// apply the change to a copy of the last-seen record, discard expired pending
/// tokens, then persist conditioned on the record's version.
pub struct CredentialStore<'a, U, H, T, C> {
    user_store: &'a U,
    password_hasher: &'a H,
    token_issuer: &'a T,
    clock: &'a C,
    verification_token_ttl: Duration,
}

impl<'a, U, H, T, C> CredentialStore<'a, U, H, T, C>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
{
    pub fn new(
        user_store: &'a U,
        password_hasher: &'a H,
        token_issuer: &'a T,
        clock: &'a C,
        verification_token_ttl: Duration,
    ) -> Self {
        Self {
            user_store,
            password_hasher,
            token_issuer,
            clock,
            verification_token_ttl,
        }
    }

    pub fn user_store(&self) -> &'a U {
        self.user_store
    }

    pub fn token_issuer(&self) -> &'a T {
        self.token_issuer
    }

    pub fn clock(&self) -> &'a C {
        self.clock
    }

    pub fn refresh_tokens(&self) -> RefreshTokenRegistry<'a, T> {
        RefreshTokenRegistry::new(self.token_issuer)
    }

    pub fn verification_tokens(&self) -> VerificationTokenIssuer<'a, C> {
        VerificationTokenIssuer::new(self.clock, self.verification_token_ttl)
    }

    /// Creates a new account. Nothing is persisted unless every check passes.
    #[tracing::instrument(name = "CredentialStore::register", skip_all)]
    pub async fn register(
        &self,
        registration: Registration,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<User, AccountError> {
        ensure_confirmed(&password, &password_confirm)?;
        let new_user = registration.into_new_user()?;
        let password = Password::try_from(password)?;

        let password_hash = self.hash_password(&password).await?;
        let user = User::new(new_user, password_hash, self.clock.now());
        let user = self.user_store.add_user(user).await?;

        tracing::info!(user_id = %user.id(), "Registered new user");
        Ok(user)
    }

    /// Checks a login identifier (email or phone) and password.
    ///
    /// Unknown accounts, deactivated accounts and wrong passwords all fail with
    /// the same [`AccountError::Authentication`].
    #[tracing::instrument(name = "CredentialStore::authenticate", skip_all)]
    pub async fn authenticate(
        &self,
        identifier: &str,
        candidate: &Secret<String>,
    ) -> Result<User, AccountError> {
        let user = match self.find_by_identifier(identifier).await {
            Ok(user) => user,
            Err(AccountError::NotFound | AccountError::Validation(_)) => {
                tracing::debug!("Login attempt for unknown account");
                // Pay for one verification so unknown accounts answer as slowly
                // as wrong passwords.
                self.password_hasher
                    .verify(candidate, self.password_hasher.dummy_hash())
                    .await?;
                return Err(AccountError::Authentication);
            }
            Err(e) => return Err(e),
        };

        if !self
            .password_hasher
            .verify(candidate, user.password_hash())
            .await?
        {
            tracing::debug!(user_id = %user.id(), "Login attempt with wrong password");
            return Err(AccountError::Authentication);
        }

        Ok(user)
    }

    /// Replaces the password and signs the user out on every device.
    #[tracing::instrument(
        name = "CredentialStore::change_password",
        skip(self, password, password_confirm)
    )]
    pub async fn change_password(
        &self,
        user_id: &UserId,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<User, AccountError> {
        let password = self.validate_new_password(password, password_confirm)?;
        let password_hash = self.hash_password(&password).await?;
        let user = self.get_user(user_id, Visibility::Active).await?;

        let registry = self.refresh_tokens();
        let (user, ()) = self
            .update(user, Visibility::Active, |user, now| {
                user.set_password_hash(password_hash.clone(), now);
                registry.revoke_all(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id(), "Password changed, all sessions revoked");
        Ok(user)
    }

    pub fn validate_new_password(
        &self,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<Password, AccountError> {
        ensure_confirmed(&password, &password_confirm)?;
        Ok(Password::try_from(password)?)
    }

    pub async fn hash_password(&self, password: &Password) -> Result<PasswordHash, AccountError> {
        Ok(self.password_hasher.hash(password).await?)
    }

    pub async fn get_user(
        &self,
        user_id: &UserId,
        visibility: Visibility,
    ) -> Result<User, AccountError> {
        Ok(self.user_store.get_user(user_id, visibility).await?)
    }

    /// Looks up an active account by email (anything containing `@`) or phone.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<User, AccountError> {
        let result = if identifier.contains('@') {
            let email = Email::parse(identifier)?;
            self.user_store.find_by_email(&email).await
        } else {
            let phone = Phone::parse(identifier)?;
            self.user_store.find_by_phone(&phone).await
        };
        Ok(result?)
    }

    /// Applies `apply` to `user` and persists the result.
    ///
    /// The write is conditioned on the version of `user`. On a conflicting
    /// concurrent write the record is re-fetched and `apply` runs once more; a
    /// second conflict is returned as [`AccountError::Conflict`]. When `apply`
    /// fails nothing is written.
    pub async fn update<R, F>(
        &self,
        user: User,
        visibility: Visibility,
        mut apply: F,
    ) -> Result<(User, R), AccountError>
    where
        F: FnMut(&mut User, DateTime<Utc>) -> Result<R, AccountError> + Send,
        R: Send,
    {
        let mut current = user;
        let mut retried = false;

        loop {
            let now = self.clock.now();
            let mut draft = current.clone();
            let outcome = apply(&mut draft, now)?;
            draft.discard_expired_tokens(now);
            draft.touch(now);

            match self.user_store.update_user(&draft).await {
                Ok(saved) => return Ok((saved, outcome)),
                Err(UserStoreError::Conflict) if !retried => {
                    tracing::warn!(
                        user_id = %current.id(),
                        "Concurrent write detected, retrying once"
                    );
                    retried = true;
                    current = self.user_store.get_user(current.id(), visibility).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn ensure_confirmed(
    password: &Secret<String>,
    password_confirm: &Secret<String>,
) -> Result<(), ValidationError> {
    if password.expose_secret() != password_confirm.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
