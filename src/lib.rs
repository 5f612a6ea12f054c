//! # Accounts - User Credential and Token Lifecycle
//!
//! Facade crate re-exporting the public APIs of the account components.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! accounts = { path = "../accounts" }
//! ```
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, `UserProfile`, tokens
//! - **Lifecycle components**: `RefreshTokenRegistry`, `VerificationTokenIssuer`
//! - **Ports**: `UserStore`, `PasswordHasher`, `TokenIssuer`, `Clock`, `EmailClient`
//! - **Use cases**: `RegisterUseCase`, `LoginUseCase`, `RefreshUseCase`, etc.
//! - **Adapters**: `PostgresUserStore`, `Argon2PasswordHasher`, `JwtTokenIssuer`, etc.
//! - **Service**: `AccountService` - the main entry point

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use accounts_core::*;
}

pub use accounts_core::{
    AccessClaims, AccessToken, Address, Email, Password, PasswordHash, Phone, RefreshClaims,
    RefreshToken, Role, TokenError, TokenPair, User, UserError, UserId, UserName, UserProfile,
    ValidationError,
};

pub use accounts_core::{RefreshTokenRegistry, VerificationTokenIssuer};

// ============================================================================
// Ports
// ============================================================================

/// Repository trait definitions
pub mod repositories {
    pub use accounts_core::{UserStore, UserStoreError, Visibility};
}

pub use accounts_core::{
    Clock, EmailClient, PasswordHasher, PasswordHasherError, SystemClock, TokenIssuer, UserStore,
    UserStoreError, Visibility,
};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases
pub mod use_cases {
    pub use accounts_application::*;
}

pub use accounts_application::{
    AccountError, CredentialStore, DuplicateKey, LoginResponse, Registration,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Persistence implementations
    pub mod persistence {
        pub use accounts_adapters::persistence::*;
    }

    /// Email client implementations
    pub mod email {
        pub use accounts_adapters::email::*;
    }

    /// Password hashing
    pub mod hashing {
        pub use accounts_adapters::hashing::*;
    }

    /// Signed token issuing
    pub mod tokens {
        pub use accounts_adapters::tokens::*;
    }

    /// Configuration
    pub mod config {
        pub use accounts_adapters::config::*;
    }

    pub use accounts_adapters::telemetry;
}

pub use accounts_adapters::{
    AccountsSetting, Argon2PasswordHasher, HashMapUserStore, JwtTokenIssuer, MockEmailClient,
    PostgresUserStore, PostmarkEmailClient,
};

// ============================================================================
// Account Service (Main Entry Point)
// ============================================================================

pub use accounts_service::{
    AccountService, InMemoryAccountService, PostgresAccountService, ServiceError,
};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
