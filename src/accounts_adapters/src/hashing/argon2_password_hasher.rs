use accounts_core::{Password, PasswordHash, PasswordHasher, PasswordHasherError};
use argon2::{
    Algorithm,
    Argon2,
    Params,
    PasswordVerifier,
    Version,
    password_hash::{self, PasswordHasher as _, SaltString, rand_core},
};
use secrecy::{ExposeSecret, Secret};

/// Argon2id cost parameters. Hashes carry their own parameters, so changing
/// these only affects newly computed hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_cost_kib: 15000,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashParams {
    fn to_argon2(self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost_kib,
            self.iterations,
            self.parallelism,
            None,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
    dummy_hash: PasswordHash,
}

impl Argon2PasswordHasher {
    /// Validates `params` and computes the dummy hash used for unknown
    /// accounts, which blocks for one hash.
    pub fn new(params: HashParams) -> Result<Self, PasswordHasherError> {
        let params = params
            .to_argon2()
            .map_err(|e| PasswordHasherError::Backend(e.to_string()))?;
        let dummy_hash = hash_with(&params, "no-account-has-this-password")?;
        Ok(Self { params, dummy_hash })
    }
}

fn hash_with(params: &Params, password: &str) -> Result<PasswordHash, PasswordHasherError> {
    let salt: SaltString = SaltString::generate(rand_core::OsRng);
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|h| PasswordHash::new(Secret::new(h.to_string())))
        .map_err(|e| PasswordHasherError::Backend(e.to_string()))
}

#[async_trait::async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    #[tracing::instrument(name = "Computing password hash", skip_all)]
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError> {
        let password = password.as_ref().clone();
        let params = self.params.clone();
        let current_span: tracing::Span = tracing::Span::current();

        let result = tokio::task::spawn_blocking(move || {
            current_span.in_scope(move || hash_with(&params, password.expose_secret()))
        })
        .await
        .map_err(|e| PasswordHasherError::Backend(e.to_string()))?;

        result
    }

    #[tracing::instrument(name = "Verify password hash", skip_all)]
    async fn verify(
        &self,
        candidate: &Secret<String>,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let candidate = candidate.clone();
        let expected = hash.as_ref().clone();
        let current_span: tracing::Span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(|| {
                let Ok(expected) = password_hash::PasswordHash::new(expected.expose_secret())
                else {
                    tracing::warn!("Stored password hash is not a valid PHC string");
                    return false;
                };

                // Parameters are read from the stored hash.
                Argon2::default()
                    .verify_password(candidate.expose_secret().as_bytes(), &expected)
                    .is_ok()
            })
        })
        .await
        .map_err(|e| PasswordHasherError::Backend(e.to_string()))
    }

    fn dummy_hash(&self) -> &PasswordHash {
        &self.dummy_hash
    }
}
