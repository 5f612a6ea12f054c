use thiserror::Error;

/// Field-level constraint violations raised while parsing user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Invalid phone number")]
    InvalidPhone,
    #[error("Name must be between {min} and {max} characters")]
    InvalidName { min: usize, max: usize },
    #[error("Password must be between {min} and {max} characters")]
    InvalidPassword { min: usize, max: usize },
    #[error("Unknown role: {0}")]
    InvalidRole(String),
    #[error("Invalid user id")]
    InvalidUserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords are not the same!")]
    PasswordMismatch,
    #[error("{0}")]
    FieldConstraint(#[from] UserError),
    #[error("Email address is already verified")]
    EmailAlreadyVerified,
}
