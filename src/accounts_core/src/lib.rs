pub mod domain;
pub mod lifecycle;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    address::Address,
    email::Email,
    errors::{UserError, ValidationError},
    password::{Password, PasswordHash},
    phone::Phone,
    role::Role,
    tokens::{AccessClaims, AccessToken, RefreshClaims, RefreshToken, TokenError, TokenPair},
    user::{NewUser, RefreshTokenSet, User, UserProfile, UserRecord},
    user_id::UserId,
    user_name::UserName,
    verification_token::{IssuedVerificationToken, PendingToken, TokenDigest, VerificationToken},
};

pub use ports::{
    repositories::{UserStore, UserStoreError, Visibility},
    services::{Clock, EmailClient, PasswordHasher, PasswordHasherError, SystemClock, TokenIssuer},
};

pub use lifecycle::{
    refresh_token_registry::RefreshTokenRegistry,
    verification_token_issuer::VerificationTokenIssuer,
};
