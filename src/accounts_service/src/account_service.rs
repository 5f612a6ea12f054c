use std::time::Duration as StdDuration;

use accounts_adapters::{
    AccountsSetting, Argon2PasswordHasher, HashMapUserStore, JwtConfigError, JwtTokenIssuer,
    MockEmailClient, PostgresUserStore, PostmarkEmailClient, SettingsError, configure_postgresql,
};
use accounts_application::{
    AccountError, AccountStatusUseCase, ChangePasswordUseCase, ChangeRoleUseCase, CredentialStore,
    LoginResponse, LoginUseCase, LogoutUseCase, RefreshUseCase, Registration, RegisterUseCase,
    RequestEmailVerificationUseCase, RequestPasswordResetUseCase, ResetPasswordUseCase,
    VerifyEmailUseCase,
};
use accounts_core::{
    AccessClaims, Clock, Email, EmailClient, PasswordHasher, PasswordHasherError, Role, SystemClock,
    TokenIssuer, TokenPair, UserError, UserId, UserProfile, UserStore, Visibility,
};
use chrono::{DateTime, Duration, Utc};
use secrecy::Secret;
use thiserror::Error;

/// Errors raised while assembling an [`AccountService`] from settings.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Token issuer configuration: {0}")]
    TokenIssuer(#[from] JwtConfigError),
    #[error("Password hasher configuration: {0}")]
    PasswordHasher(#[from] PasswordHasherError),
    #[error("Database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Email client: {0}")]
    EmailClient(String),
    #[error("Missing configuration section `{0}`")]
    MissingSection(&'static str),
}

pub type InMemoryAccountService = AccountService<
    HashMapUserStore,
    Argon2PasswordHasher,
    JwtTokenIssuer,
    SystemClock,
    MockEmailClient,
>;

pub type PostgresAccountService = AccountService<
    PostgresUserStore,
    Argon2PasswordHasher,
    JwtTokenIssuer,
    SystemClock,
    PostmarkEmailClient,
>;

/// The account operations exposed to the calling layer.
///
/// Owns one instance of every adapter and runs each operation through a
/// short-lived [`CredentialStore`] borrowing them.
pub struct AccountService<U, H, T, C, E> {
    user_store: U,
    password_hasher: H,
    token_issuer: T,
    clock: C,
    email_client: E,
    verification_token_ttl: Duration,
}

impl<U, H, T, C, E> AccountService<U, H, T, C, E>
where
    U: UserStore,
    H: PasswordHasher,
    T: TokenIssuer,
    C: Clock,
    E: EmailClient,
{
    pub fn new(
        user_store: U,
        password_hasher: H,
        token_issuer: T,
        clock: C,
        email_client: E,
        verification_token_ttl: Duration,
    ) -> Self {
        Self {
            user_store,
            password_hasher,
            token_issuer,
            clock,
            email_client,
            verification_token_ttl,
        }
    }

    pub fn user_store(&self) -> &U {
        &self.user_store
    }

    pub fn email_client(&self) -> &E {
        &self.email_client
    }

    fn credential_store(&self) -> CredentialStore<'_, U, H, T, C> {
        CredentialStore::new(
            &self.user_store,
            &self.password_hasher,
            &self.token_issuer,
            &self.clock,
            self.verification_token_ttl,
        )
    }

    pub async fn register(
        &self,
        registration: Registration,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        RegisterUseCase::new(self.credential_store())
            .execute(registration, password, password_confirm)
            .await
    }

    /// Logs in with an email or phone number.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: Secret<String>,
    ) -> Result<LoginResponse, AccountError> {
        LoginUseCase::new(self.credential_store())
            .execute(identifier, password)
            .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AccountError> {
        RefreshUseCase::new(self.credential_store())
            .execute(refresh_token)
            .await
    }

    pub async fn logout(&self, user_id: &UserId, refresh_token: &str) -> Result<(), AccountError> {
        LogoutUseCase::new(self.credential_store())
            .execute(user_id, refresh_token)
            .await
    }

    pub async fn logout_all(&self, user_id: &UserId) -> Result<(), AccountError> {
        LogoutUseCase::new(self.credential_store())
            .execute_everywhere(user_id)
            .await
    }

    pub async fn change_password(
        &self,
        user_id: &UserId,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        ChangePasswordUseCase::new(self.credential_store())
            .execute(user_id, password, password_confirm)
            .await
    }

    pub async fn request_password_reset(&self, identifier: &str) -> Result<(), AccountError> {
        RequestPasswordResetUseCase::new(self.credential_store(), &self.email_client)
            .execute(identifier)
            .await
    }

    pub async fn reset_password(
        &self,
        token: Secret<String>,
        password: Secret<String>,
        password_confirm: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        ResetPasswordUseCase::new(self.credential_store())
            .execute(token, password, password_confirm)
            .await
    }

    pub async fn request_email_verification(
        &self,
        user_id: &UserId,
    ) -> Result<DateTime<Utc>, AccountError> {
        RequestEmailVerificationUseCase::new(self.credential_store(), &self.email_client)
            .execute(user_id)
            .await
    }

    pub async fn verify_email(
        &self,
        user_id: &UserId,
        token: Secret<String>,
    ) -> Result<UserProfile, AccountError> {
        VerifyEmailUseCase::new(self.credential_store())
            .execute(user_id, token)
            .await
    }

    pub async fn deactivate(&self, user_id: &UserId) -> Result<UserProfile, AccountError> {
        AccountStatusUseCase::new(self.credential_store())
            .deactivate(user_id)
            .await
    }

    pub async fn reactivate(&self, user_id: &UserId) -> Result<UserProfile, AccountError> {
        AccountStatusUseCase::new(self.credential_store())
            .reactivate(user_id)
            .await
    }

    pub async fn change_role(
        &self,
        user_id: &UserId,
        role: Role,
    ) -> Result<UserProfile, AccountError> {
        ChangeRoleUseCase::new(self.credential_store())
            .execute(user_id, role)
            .await
    }

    /// Returns the profile of an active account.
    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile, AccountError> {
        let user = self
            .credential_store()
            .get_user(user_id, Visibility::Active)
            .await?;
        Ok(UserProfile::from(&user))
    }

    /// Checks an access token's signature and expiry. Access tokens are
    /// stateless: they stay valid until they expire even after logout.
    pub fn verify_access_token(&self, access_token: &str) -> Result<AccessClaims, AccountError> {
        Ok(self.token_issuer.verify_access_token(access_token)?)
    }
}

impl InMemoryAccountService {
    /// Builds a service backed by the in-memory store and a recording email
    /// client.
    pub fn in_memory(settings: &AccountsSetting) -> Result<Self, ServiceError> {
        Ok(Self::new(
            HashMapUserStore::new(),
            Argon2PasswordHasher::new(settings.hash_params())?,
            JwtTokenIssuer::new(settings.access_jwt_config(), settings.refresh_jwt_config())?,
            SystemClock,
            MockEmailClient::new(),
            settings.verification_token_ttl(),
        ))
    }
}

impl PostgresAccountService {
    /// Connects to PostgreSQL, runs migrations and builds a service that
    /// delivers email through Postmark.
    #[tracing::instrument(name = "PostgresAccountService::from_settings", skip_all)]
    pub async fn from_settings(settings: &AccountsSetting) -> Result<Self, ServiceError> {
        let postgres = settings
            .postgres
            .as_ref()
            .ok_or(ServiceError::MissingSection("postgres"))?;
        let email_settings = settings
            .email_client
            .as_ref()
            .ok_or(ServiceError::MissingSection("email_client"))?;

        let pg_pool = configure_postgresql(&postgres.url).await?;

        let sender = Email::parse(&email_settings.sender)
            .map_err(|e: UserError| ServiceError::EmailClient(e.to_string()))?;
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_millis(email_settings.timeout_in_millis))
            .build()
            .map_err(|e| ServiceError::EmailClient(e.to_string()))?;
        let email_client = PostmarkEmailClient::new(
            email_settings.base_url.clone(),
            sender,
            email_settings.auth_token.clone(),
            http_client,
        );

        tracing::info!("Account service connected to PostgreSQL");
        Ok(Self::new(
            PostgresUserStore::new(pg_pool),
            Argon2PasswordHasher::new(settings.hash_params())?,
            JwtTokenIssuer::new(settings.access_jwt_config(), settings.refresh_jwt_config())?,
            SystemClock,
            email_client,
            settings.verification_token_ttl(),
        ))
    }
}
