use crate::{
    domain::{
        tokens::{RefreshToken, TokenError},
        user::User,
    },
    ports::services::TokenIssuer,
};

/// Maintains the per-user set of live refresh tokens.
///
/// Each device or session holds its own token, so revoking one never touches
/// the others. Mutations act on the in-memory aggregate; persisting them is the
/// caller's job.
pub struct RefreshTokenRegistry<'a, T> {
    token_issuer: &'a T,
}

impl<'a, T> RefreshTokenRegistry<'a, T>
where
    T: TokenIssuer,
{
    pub fn new(token_issuer: &'a T) -> Self {
        Self { token_issuer }
    }

    /// Mints a refresh token for `user` and records it as live.
    ///
    /// Tokens that no longer verify are dropped first, so the set only ever
    /// holds tokens that could still be exchanged.
    pub fn issue(&self, user: &mut User) -> Result<RefreshToken, TokenError> {
        let token = self.token_issuer.issue_refresh_token(user)?;
        self.discard_expired(user);
        user.refresh_tokens_mut().insert(token.as_str().to_string());
        Ok(token)
    }

    /// Swaps `presented` for a fresh token.
    ///
    /// A token that is not live (already rotated, revoked or never issued) is
    /// rejected, which is how replay of a stolen token is detected.
    pub fn rotate(&self, user: &mut User, presented: &str) -> Result<RefreshToken, TokenError> {
        if !user.refresh_tokens().contains(presented) {
            tracing::warn!(user_id = %user.id(), "Presented refresh token is not live");
            return Err(TokenError::NotRecognized);
        }

        let replacement = self.token_issuer.issue_refresh_token(user)?;
        user.refresh_tokens_mut().remove(presented);
        self.discard_expired(user);
        user.refresh_tokens_mut().insert(replacement.as_str().to_string());
        Ok(replacement)
    }

    /// Removes every token that fails verification, expired ones included.
    /// Returns how many were removed.
    pub fn discard_expired(&self, user: &mut User) -> usize {
        let stale: Vec<String> = user
            .refresh_tokens()
            .iter()
            .filter(|token| self.token_issuer.verify_refresh_token(token).is_err())
            .map(str::to_string)
            .collect();

        let tokens = user.refresh_tokens_mut();
        for token in &stale {
            tokens.remove(token);
        }
        if !stale.is_empty() {
            tracing::debug!(
                user_id = %user.id(),
                discarded = stale.len(),
                "Dropped stale refresh tokens"
            );
        }
        stale.len()
    }

    /// Removes one token; returns whether it was live.
    pub fn revoke(&self, user: &mut User, token: &str) -> bool {
        user.refresh_tokens_mut().remove(token)
    }

    pub fn revoke_all(&self, user: &mut User) {
        user.refresh_tokens_mut().clear();
    }
}
