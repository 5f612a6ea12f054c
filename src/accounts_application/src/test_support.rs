use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use accounts_core::{
    AccessClaims, AccessToken, Clock, Email, EmailClient, Password, PasswordHash, PasswordHasher,
    PasswordHasherError, Phone, RefreshClaims, RefreshToken, TokenDigest, TokenError, TokenIssuer,
    User, UserId, UserStore, UserStoreError, Visibility,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;

use crate::credential_store::{CredentialStore, Registration};

pub fn secret(value: &str) -> Secret<String> {
    Secret::new(value.to_string())
}

pub fn alice_registration() -> Registration {
    Registration {
        name: "Alice".to_string(),
        email: secret("a@x.com"),
        phone: "+1000".to_string(),
        photo: None,
        shipping_address: None,
        billing_address: None,
    }
}

#[derive(Default, Clone)]
pub struct MockUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    pending_conflicts: Arc<AtomicUsize>,
}

impl MockUserStore {
    /// The next `count` updates fail with a conflict after a simulated
    /// concurrent writer has bumped the stored version.
    pub fn inject_conflicts(&self, count: usize) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    async fn find_active(&self, predicate: impl Fn(&User) -> bool) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.is_active() && predicate(user))
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    fn with_version(user: &User, version: i64) -> User {
        let mut record = user.to_record();
        record.version = version;
        User::from(record)
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn add_user(&self, user: User) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email() == user.email())
        {
            return Err(UserStoreError::DuplicateEmail);
        }
        if users
            .values()
            .any(|existing| existing.phone() == user.phone())
        {
            return Err(UserStoreError::DuplicatePhone);
        }
        users.insert(*user.id(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &UserId, visibility: Visibility) -> Result<User, UserStoreError> {
        match self.users.read().await.get(id) {
            Some(user) if visibility == Visibility::All || user.is_active() => Ok(user.clone()),
            _ => Err(UserStoreError::UserNotFound),
        }
    }

    async fn find_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        self.find_active(|user| user.email() == email).await
    }

    async fn find_by_phone(&self, phone: &Phone) -> Result<User, UserStoreError> {
        self.find_active(|user| user.phone() == phone).await
    }

    async fn find_by_password_reset_token(
        &self,
        digest: &TokenDigest,
    ) -> Result<User, UserStoreError> {
        self.find_active(|user| {
            user.password_reset()
                .is_some_and(|pending| pending.digest == *digest)
        })
        .await
    }

    async fn update_user(&self, user: &User) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        let stored = users.get(user.id()).ok_or(UserStoreError::UserNotFound)?;

        if self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            let bumped = Self::with_version(stored, stored.version() + 1);
            users.insert(*user.id(), bumped);
            return Err(UserStoreError::Conflict);
        }

        if stored.version() != user.version() {
            return Err(UserStoreError::Conflict);
        }
        let saved = Self::with_version(user, user.version() + 1);
        users.insert(*user.id(), saved.clone());
        Ok(saved)
    }
}

/// Stores `fake$<plaintext>` so tests can assert on hashing without argon2.
pub struct FakePasswordHasher {
    hash_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    failing: AtomicBool,
    dummy_hash: PasswordHash,
}

impl Default for FakePasswordHasher {
    fn default() -> Self {
        Self {
            hash_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            dummy_hash: PasswordHash::new(Secret::new("dummy".to_string())),
        }
    }
}

impl FakePasswordHasher {
    pub fn hash_calls(&self) -> usize {
        self.hash_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check_backend(&self) -> Result<(), PasswordHasherError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PasswordHasherError::Backend("hasher offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PasswordHasher for FakePasswordHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError> {
        self.check_backend()?;
        self.hash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PasswordHash::new(Secret::new(format!(
            "fake${}",
            password.as_ref().expose_secret()
        ))))
    }

    async fn verify(
        &self,
        candidate: &Secret<String>,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        self.check_backend()?;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(hash
            .as_ref()
            .expose_secret()
            .strip_prefix("fake$")
            .is_some_and(|plain| plain == candidate.expose_secret()))
    }

    fn dummy_hash(&self) -> &PasswordHash {
        &self.dummy_hash
    }
}

/// Issues `<kind>.<user id>.<counter>` tokens that never expire.
#[derive(Default)]
pub struct FakeTokenIssuer {
    issued: AtomicU64,
    failing_access: AtomicBool,
}

impl FakeTokenIssuer {
    pub fn fail_access_tokens(&self) {
        self.failing_access.store(true, Ordering::SeqCst);
    }

    fn mint(&self, kind: &str, user: &User) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        format!("{kind}.{}.{n}", user.id())
    }

    fn parse<'t>(kind: &str, token: &'t str) -> Result<(&'t str, &'t str), TokenError> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(k), Some(sub), Some(n), None) if k == kind => Ok((sub, n)),
            _ => Err(TokenError::Malformed),
        }
    }
}

impl TokenIssuer for FakeTokenIssuer {
    fn issue_access_token(&self, user: &User) -> Result<AccessToken, TokenError> {
        if self.failing_access.load(Ordering::SeqCst) {
            return Err(TokenError::Signing("signing key unavailable".to_string()));
        }
        Ok(AccessToken::new(self.mint("access", user)))
    }

    fn issue_refresh_token(&self, user: &User) -> Result<RefreshToken, TokenError> {
        Ok(RefreshToken::new(self.mint("refresh", user)))
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let (sub, _) = Self::parse("access", token)?;
        Ok(AccessClaims {
            sub: sub.to_string(),
            email: String::new(),
            role: Default::default(),
            iat: 0,
            exp: i64::MAX,
        })
    }

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let (sub, n) = Self::parse("refresh", token)?;
        Ok(RefreshClaims {
            sub: sub.to_string(),
            jti: n.to_string(),
            iat: 0,
            exp: i64::MAX,
        })
    }
}

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl Default for ManualClock {
    fn default() -> Self {
        Self(Mutex::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub content: String,
}

#[derive(Default)]
pub struct RecordingEmailClient {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingEmailClient {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// The token is the only line of the body made of hex digits.
    pub fn last_token(&self) -> Secret<String> {
        let sent = self.sent();
        let email = sent.last().expect("no email was sent");
        let token = email
            .content
            .lines()
            .map(str::trim)
            .find(|line| line.len() == 64 && line.chars().all(|c| c.is_ascii_hexdigit()))
            .expect("email carries no token");
        secret(token)
    }
}

#[async_trait]
impl EmailClient for RecordingEmailClient {
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("smtp relay refused the message".to_string());
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.as_ref().expose_secret().clone(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct Harness {
    pub store: MockUserStore,
    pub hasher: FakePasswordHasher,
    pub issuer: FakeTokenIssuer,
    pub clock: ManualClock,
    pub email: RecordingEmailClient,
}

pub type TestCredentialStore<'a> =
    CredentialStore<'a, MockUserStore, FakePasswordHasher, FakeTokenIssuer, ManualClock>;

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credential_store(&self) -> TestCredentialStore<'_> {
        CredentialStore::new(
            &self.store,
            &self.hasher,
            &self.issuer,
            &self.clock,
            Duration::hours(24),
        )
    }

    pub async fn register_alice(&self) -> User {
        self.credential_store()
            .register(
                alice_registration(),
                secret("secret123"),
                secret("secret123"),
            )
            .await
            .unwrap()
    }

    pub async fn stored(&self, id: &UserId) -> User {
        self.store.get_user(id, Visibility::All).await.unwrap()
    }
}
