pub mod credential_store;
pub mod error;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use credential_store::{CredentialStore, Registration};
pub use error::{AccountError, DuplicateKey};
pub use use_cases::{
    account_status::AccountStatusUseCase,
    change_password::ChangePasswordUseCase,
    change_role::ChangeRoleUseCase,
    email_verification::{RequestEmailVerificationUseCase, VerifyEmailUseCase},
    login::{LoginResponse, LoginUseCase},
    logout::LogoutUseCase,
    password_reset::{RequestPasswordResetUseCase, ResetPasswordUseCase},
    refresh::RefreshUseCase,
    register::RegisterUseCase,
};
