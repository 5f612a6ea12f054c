use chrono::{DateTime, Utc};
use rand::Rng;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Opaque single-use token proving control of an email address or
/// authorizing a password reset.
#[derive(Debug, Clone)]
pub struct VerificationToken(Secret<String>);

impl VerificationToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        Self(Secret::new(hex::encode(bytes)))
    }

    /// SHA-256 digest of the token. Only the digest is ever stored.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(self.0.expose_secret())
    }
}

impl From<Secret<String>> for VerificationToken {
    fn from(token: Secret<String>) -> Self {
        Self(Secret::new(token.expose_secret().trim().to_string()))
    }
}

impl AsRef<Secret<String>> for VerificationToken {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    fn of(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    /// Rebuilds a digest previously read from storage.
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A pending token for one purpose: the stored digest and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    pub digest: TokenDigest,
    pub expires_at: DateTime<Utc>,
}

impl PendingToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn matches(&self, token: &VerificationToken) -> bool {
        self.digest == token.digest()
    }
}

/// A freshly issued token, handed to the delivery channel exactly once.
#[derive(Debug, Clone)]
pub struct IssuedVerificationToken {
    pub token: VerificationToken,
    pub expires_at: DateTime<Utc>,
}
