pub mod config;
pub mod email;
pub mod hashing;
pub mod persistence;
pub mod telemetry;
pub mod tokens;

pub use config::settings::{
    AccessTokenSetting, AccountsSetting, AuthSetting, EmailClientSetting, PasswordHashSetting,
    PostgresSetting, RefreshTokenSetting, SettingsError, VerificationTokenSetting,
};
pub use email::{
    mock_email_client::{MockEmailClient, SentEmail},
    postmark_email_client::PostmarkEmailClient,
};
pub use hashing::argon2_password_hasher::{Argon2PasswordHasher, HashParams};
pub use persistence::{
    hashmap_user_store::HashMapUserStore,
    postgres_user_store::{PostgresUserStore, configure_postgresql, get_postgres_pool},
};
pub use tokens::jwt_token_issuer::{JwtConfig, JwtConfigError, JwtTokenIssuer};
