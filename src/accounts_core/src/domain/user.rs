use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use super::{
    address::Address, email::Email, password::PasswordHash, phone::Phone, role::Role,
    user_id::UserId, user_name::UserName, verification_token::PendingToken,
};

pub const DEFAULT_PHOTO: &str = "default.jpg";

/// Validated profile fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub email: Email,
    pub phone: Phone,
    pub photo: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

/// The set of refresh tokens that are currently live for one user.
///
/// Only [`crate::RefreshTokenRegistry`] adds or removes entries.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RefreshTokenSet(BTreeSet<String>);

impl RefreshTokenSet {
    pub fn from_stored(tokens: impl IntoIterator<Item = String>) -> Self {
        Self(tokens.into_iter().collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, token: String) {
        self.0.insert(token);
    }

    pub(crate) fn remove(&mut self, token: &str) -> bool {
        self.0.remove(token)
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for RefreshTokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefreshTokenSet({} live)", self.0.len())
    }
}

/// The user aggregate root.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    name: UserName,
    email: Email,
    phone: Phone,
    photo: String,
    role: Role,
    password_hash: PasswordHash,
    password_changed_at: DateTime<Utc>,
    shipping_address: Option<Address>,
    billing_address: Option<Address>,
    email_verified: bool,
    email_verification: Option<PendingToken>,
    password_reset: Option<PendingToken>,
    refresh_tokens: RefreshTokenSet,
    mfa_enabled: bool,
    mfa_secret: Option<Secret<String>>,
    active: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(new_user: NewUser, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            photo: new_user
                .photo
                .filter(|photo| !photo.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PHOTO.to_string()),
            role: Role::default(),
            password_hash,
            password_changed_at: now,
            shipping_address: new_user.shipping_address,
            billing_address: new_user.billing_address,
            email_verified: false,
            email_verification: None,
            password_reset: None,
            refresh_tokens: RefreshTokenSet::default(),
            mfa_enabled: false,
            mfa_secret: None,
            active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &Phone {
        &self.phone
    }

    pub fn photo(&self) -> &str {
        &self.photo
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    pub fn password_changed_at(&self) -> DateTime<Utc> {
        self.password_changed_at
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn email_verification(&self) -> Option<&PendingToken> {
        self.email_verification.as_ref()
    }

    pub fn password_reset(&self) -> Option<&PendingToken> {
        self.password_reset.as_ref()
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenSet {
        &self.refresh_tokens
    }

    pub fn mfa_enabled(&self) -> bool {
        self.mfa_enabled
    }

    pub fn mfa_secret(&self) -> Option<&Secret<String>> {
        self.mfa_secret.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the credential. Callers must also revoke every refresh token.
    pub fn set_password_hash(&mut self, password_hash: PasswordHash, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.password_changed_at = now;
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn reactivate(&mut self) {
        self.active = true;
    }

    pub fn store_mfa_secret(&mut self, secret: Secret<String>) {
        self.mfa_secret = Some(secret);
        self.mfa_enabled = true;
    }

    pub fn disable_mfa(&mut self) {
        self.mfa_secret = None;
        self.mfa_enabled = false;
    }

    /// Drops pending verification and reset tokens whose expiry has passed.
    /// A token presented after this no longer exists and reads as a mismatch.
    pub fn discard_expired_tokens(&mut self, now: DateTime<Utc>) {
        if self
            .email_verification
            .as_ref()
            .is_some_and(|pending| pending.is_expired(now))
        {
            self.email_verification = None;
        }
        if self
            .password_reset
            .as_ref()
            .is_some_and(|pending| pending.is_expired(now))
        {
            self.password_reset = None;
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub(crate) fn refresh_tokens_mut(&mut self) -> &mut RefreshTokenSet {
        &mut self.refresh_tokens
    }

    pub(crate) fn email_verification_mut(&mut self) -> &mut Option<PendingToken> {
        &mut self.email_verification
    }

    pub(crate) fn password_reset_mut(&mut self) -> &mut Option<PendingToken> {
        &mut self.password_reset
    }

    pub(crate) fn mark_email_verified(&mut self) {
        self.email_verified = true;
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            photo: self.photo.clone(),
            role: self.role,
            password_hash: self.password_hash.clone(),
            password_changed_at: self.password_changed_at,
            shipping_address: self.shipping_address.clone(),
            billing_address: self.billing_address.clone(),
            email_verified: self.email_verified,
            email_verification: self.email_verification.clone(),
            password_reset: self.password_reset.clone(),
            refresh_tokens: self.refresh_tokens.clone(),
            mfa_enabled: self.mfa_enabled,
            mfa_secret: self.mfa_secret.clone(),
            active: self.active,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Flat, storage-facing view of a [`User`].
///
/// Stores convert rows into records and records into users; nothing else should
/// build a `User` this way.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub name: UserName,
    pub email: Email,
    pub phone: Phone,
    pub photo: String,
    pub role: Role,
    pub password_hash: PasswordHash,
    pub password_changed_at: DateTime<Utc>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub email_verified: bool,
    pub email_verification: Option<PendingToken>,
    pub password_reset: Option<PendingToken>,
    pub refresh_tokens: RefreshTokenSet,
    pub mfa_enabled: bool,
    pub mfa_secret: Option<Secret<String>>,
    pub active: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            photo: record.photo,
            role: record.role,
            password_hash: record.password_hash,
            password_changed_at: record.password_changed_at,
            shipping_address: record.shipping_address,
            billing_address: record.billing_address,
            email_verified: record.email_verified,
            email_verification: record.email_verification,
            password_reset: record.password_reset,
            refresh_tokens: record.refresh_tokens,
            mfa_enabled: record.mfa_enabled,
            mfa_secret: record.mfa_secret,
            active: record.active,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The outward representation of a user. Never carries the password hash,
/// refresh tokens, MFA secret or pending token digests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub photo: String,
    pub role: Role,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub email_verified: bool,
    pub mfa_enabled: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.to_string(),
            email: user.email.as_ref().expose_secret().clone(),
            phone: user.phone.to_string(),
            photo: user.photo.clone(),
            role: user.role,
            shipping_address: user.shipping_address.clone(),
            billing_address: user.billing_address.clone(),
            email_verified: user.email_verified,
            mfa_enabled: user.mfa_enabled,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
