use config::{
    Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState,
};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use thiserror::Error;

use super::constants::{
    BASE_CONFIG_FILE, CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, LOCAL_CONFIG_FILE, defaults, env,
};
use crate::{
    hashing::argon2_password_hasher::{Argon2PasswordHasher, HashParams},
    tokens::jwt_token_issuer::JwtConfig,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsSetting {
    pub auth: AuthSetting,
    pub password_hash: PasswordHashSetting,
    pub postgres: Option<PostgresSetting>,
    pub email_client: Option<EmailClientSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSetting {
    pub access_token: AccessTokenSetting,
    pub refresh_token: RefreshTokenSetting,
    pub verification_token: VerificationTokenSetting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenSetting {
    pub secret: Secret<String>,
    pub time_to_live: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenSetting {
    pub secret: Secret<String>,
    pub time_to_live: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationTokenSetting {
    pub time_to_live: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashSetting {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSetting {
    pub url: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailClientSetting {
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
    pub sender: String,
    pub auth_token: Secret<String>,
    #[serde(default = "default_email_timeout")]
    pub timeout_in_millis: u64,
}

fn default_email_base_url() -> String {
    defaults::email_client::BASE_URL.to_string()
}

fn default_email_timeout() -> u64 {
    defaults::email_client::TIMEOUT_IN_MILLIS
}

impl AccountsSetting {
    /// Loads defaults, then `config/base`, then `config/local`, then
    /// `ACCOUNTS__*` environment variables (after reading `.env`).
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let config = with_defaults()?
            .add_source(File::with_name(BASE_CONFIG_FILE).required(false))
            .add_source(File::with_name(LOCAL_CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator(CONFIG_ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Loads settings from a JSON document layered over the defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let config = with_defaults()?
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let access = &self.auth.access_token;
        let refresh = &self.auth.refresh_token;

        if access.secret.expose_secret().is_empty() {
            return Err(SettingsError::Invalid(format!(
                "access token secret is empty, set {}",
                env::ACCESS_TOKEN_SECRET_ENV_VAR
            )));
        }
        if refresh.secret.expose_secret().is_empty() {
            return Err(SettingsError::Invalid(format!(
                "refresh token secret is empty, set {}",
                env::REFRESH_TOKEN_SECRET_ENV_VAR
            )));
        }
        if access.secret.expose_secret() == refresh.secret.expose_secret() {
            return Err(SettingsError::Invalid(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        for (name, ttl) in [
            ("auth.access_token.time_to_live", access.time_to_live),
            ("auth.refresh_token.time_to_live", refresh.time_to_live),
            (
                "auth.verification_token.time_to_live",
                self.auth.verification_token.time_to_live,
            ),
        ] {
            if ttl <= 0 {
                return Err(SettingsError::Invalid(format!("{name} must be positive")));
            }
            if ttl > defaults::MAX_TIME_TO_LIVE_IN_SECONDS {
                return Err(SettingsError::Invalid(format!(
                    "{name} must not exceed {} seconds",
                    defaults::MAX_TIME_TO_LIVE_IN_SECONDS
                )));
            }
        }

        Argon2PasswordHasher::new(self.hash_params())
            .map_err(|e| SettingsError::Invalid(format!("password_hash: {e}")))?;

        if let Some(postgres) = &self.postgres
            && postgres.url.expose_secret().is_empty()
        {
            return Err(SettingsError::Invalid(format!(
                "postgres url is empty, set {}",
                env::DATABASE_URL_ENV_VAR
            )));
        }
        if let Some(email_client) = &self.email_client
            && email_client.auth_token.expose_secret().is_empty()
        {
            return Err(SettingsError::Invalid(format!(
                "email client token is empty, set {}",
                env::POSTMARK_AUTH_TOKEN_ENV_VAR
            )));
        }

        Ok(())
    }

    pub fn access_jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.auth.access_token.secret.clone(),
            token_ttl_in_seconds: self.auth.access_token.time_to_live,
        }
    }

    pub fn refresh_jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.auth.refresh_token.secret.clone(),
            token_ttl_in_seconds: self.auth.refresh_token.time_to_live,
        }
    }

    /// Clamped so settings built without [`Self::validate`] cannot overflow.
    pub fn verification_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            self.auth
                .verification_token
                .time_to_live
                .clamp(1, defaults::MAX_TIME_TO_LIVE_IN_SECONDS),
        )
    }

    pub fn hash_params(&self) -> HashParams {
        HashParams {
            memory_cost_kib: self.password_hash.memory_cost_kib,
            iterations: self.password_hash.iterations,
            parallelism: self.password_hash.parallelism,
        }
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default(
            "auth.access_token.time_to_live",
            defaults::ACCESS_TOKEN_TTL_IN_SECONDS,
        )?
        .set_default(
            "auth.refresh_token.time_to_live",
            defaults::REFRESH_TOKEN_TTL_IN_SECONDS,
        )?
        .set_default(
            "auth.verification_token.time_to_live",
            defaults::VERIFICATION_TOKEN_TTL_IN_SECONDS,
        )?
        .set_default(
            "password_hash.memory_cost_kib",
            i64::from(defaults::HASH_MEMORY_COST_KIB),
        )?
        .set_default(
            "password_hash.iterations",
            i64::from(defaults::HASH_ITERATIONS),
        )?
        .set_default(
            "password_hash.parallelism",
            i64::from(defaults::HASH_PARALLELISM),
        )
}
