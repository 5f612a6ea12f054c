use secrecy::{ExposeSecret, Secret};

use super::errors::UserError;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

/// A plaintext password that satisfies the password policy.
///
/// Only new passwords are parsed into this type. Login candidates are verified
/// as raw secrets so that a too-short guess is just a wrong password.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl TryFrom<Secret<String>> for Password {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let length = value.expose_secret().chars().count();
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(UserError::InvalidPassword {
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self(value))
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// A one-way password hash in PHC string format.
#[derive(Debug, Clone)]
pub struct PasswordHash(Secret<String>);

impl PasswordHash {
    pub fn new(phc: Secret<String>) -> Self {
        Self(phc)
    }
}

impl AsRef<Secret<String>> for PasswordHash {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
