use accounts_core::{
    AccessClaims, AccessToken, Clock, RefreshClaims, RefreshToken, SystemClock, TokenError,
    TokenIssuer, User,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub token_ttl_in_seconds: i64,
}

impl JwtConfig {
    pub fn as_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtConfigError {
    #[error("The {0} token secret must not be empty")]
    EmptySecret(&'static str),
    #[error("Access and refresh tokens must be signed with different secrets")]
    SharedSecret,
    #[error("The {0} token time to live must be positive")]
    InvalidTimeToLive(&'static str),
}

/// HS256 token issuer with one secret for access tokens and another for
/// refresh tokens.
///
/// Issue times and expiry checks both read `clock`, so a token expires exactly
/// when the clock passes its `exp`.
#[derive(Clone)]
pub struct JwtTokenIssuer<C = SystemClock> {
    access: JwtConfig,
    refresh: JwtConfig,
    clock: C,
}

impl JwtTokenIssuer {
    pub fn new(access: JwtConfig, refresh: JwtConfig) -> Result<Self, JwtConfigError> {
        for (kind, config) in [("access", &access), ("refresh", &refresh)] {
            if config.secret.expose_secret().is_empty() {
                return Err(JwtConfigError::EmptySecret(kind));
            }
            if config.token_ttl_in_seconds <= 0 {
                return Err(JwtConfigError::InvalidTimeToLive(kind));
            }
        }
        if access.secret.expose_secret() == refresh.secret.expose_secret() {
            return Err(JwtConfigError::SharedSecret);
        }

        Ok(Self {
            access,
            refresh,
            clock: SystemClock,
        })
    }
}

impl<C: Clock> JwtTokenIssuer<C> {
    pub fn with_clock<K: Clock>(self, clock: K) -> JwtTokenIssuer<K> {
        JwtTokenIssuer {
            access: self.access,
            refresh: self.refresh,
            clock,
        }
    }
}

impl<C: Clock> TokenIssuer for JwtTokenIssuer<C> {
    fn issue_access_token(&self, user: &User) -> Result<AccessToken, TokenError> {
        let (iat, exp) = validity(self.access.token_ttl_in_seconds, self.clock.now())?;
        let claims = AccessClaims {
            sub: user.id().to_string(),
            email: user.email().as_ref().expose_secret().clone(),
            role: user.role(),
            iat,
            exp,
        };
        create_token(&claims, self.access.as_bytes()).map(AccessToken::new)
    }

    fn issue_refresh_token(&self, user: &User) -> Result<RefreshToken, TokenError> {
        let (iat, exp) = validity(self.refresh.token_ttl_in_seconds, self.clock.now())?;
        let claims = RefreshClaims {
            sub: user.id().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat,
            exp,
        };
        create_token(&claims, self.refresh.as_bytes()).map(RefreshToken::new)
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        validate_token(token, self.access.as_bytes(), self.clock.now())
    }

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        validate_token(token, self.refresh.as_bytes(), self.clock.now())
    }
}

trait Expiring {
    fn exp(&self) -> i64;
}

impl Expiring for AccessClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

impl Expiring for RefreshClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

fn validity(token_ttl_in_seconds: i64, now: DateTime<Utc>) -> Result<(i64, i64), TokenError> {
    let delta = chrono::Duration::try_seconds(token_ttl_in_seconds)
        .ok_or_else(|| TokenError::Signing("Failed to create token duration".to_string()))?;

    let exp = now
        .checked_add_signed(delta)
        .ok_or_else(|| TokenError::Signing("Duration out of range".to_string()))?;

    Ok((now.timestamp(), exp.timestamp()))
}

fn create_token<C: Serialize>(claims: &C, secret: &[u8]) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

// Expiry is checked against the injected clock rather than by jsonwebtoken,
// which always reads the system time.
fn validate_token<C>(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<C, TokenError>
where
    C: DeserializeOwned + Expiring,
{
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

    if claims.exp() <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}
