pub mod refresh_token_registry;
pub mod verification_token_issuer;
