use chrono::{DateTime, Duration, Utc};

use crate::{
    domain::{
        tokens::TokenError,
        user::User,
        verification_token::{IssuedVerificationToken, PendingToken, VerificationToken},
    },
    ports::services::Clock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    EmailVerification,
    PasswordReset,
}

impl Purpose {
    fn slot(self, user: &mut User) -> &mut Option<PendingToken> {
        match self {
            Purpose::EmailVerification => user.email_verification_mut(),
            Purpose::PasswordReset => user.password_reset_mut(),
        }
    }
}

/// Issues and consumes expiring single-use tokens.
///
/// Each purpose holds at most one pending token per user: issuing again
/// overwrites the previous one, and a successful consume clears it.
pub struct VerificationTokenIssuer<'a, C> {
    clock: &'a C,
    time_to_live: Duration,
}

impl<'a, C> VerificationTokenIssuer<'a, C>
where
    C: Clock,
{
    pub fn new(clock: &'a C, time_to_live: Duration) -> Self {
        Self {
            clock,
            time_to_live,
        }
    }

    pub fn issue_email_verification(&self, user: &mut User) -> IssuedVerificationToken {
        self.issue(user, Purpose::EmailVerification)
    }

    /// Marks the email as verified when `token` matches the pending one.
    pub fn consume_email_verification(
        &self,
        user: &mut User,
        token: &VerificationToken,
    ) -> Result<(), TokenError> {
        self.consume(user, token, Purpose::EmailVerification)?;
        user.mark_email_verified();
        Ok(())
    }

    pub fn issue_password_reset(&self, user: &mut User) -> IssuedVerificationToken {
        self.issue(user, Purpose::PasswordReset)
    }

    /// Clears the pending reset token when `token` matches it. Setting the new
    /// password and revoking sessions is left to the caller.
    pub fn consume_password_reset(
        &self,
        user: &mut User,
        token: &VerificationToken,
    ) -> Result<(), TokenError> {
        self.consume(user, token, Purpose::PasswordReset)
    }

    fn issue(&self, user: &mut User, purpose: Purpose) -> IssuedVerificationToken {
        let token = VerificationToken::generate();
        // A time to live past the end of representable time never expires.
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.time_to_live)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        *purpose.slot(user) = Some(PendingToken {
            digest: token.digest(),
            expires_at,
        });

        IssuedVerificationToken { token, expires_at }
    }

    fn consume(
        &self,
        user: &mut User,
        token: &VerificationToken,
        purpose: Purpose,
    ) -> Result<(), TokenError> {
        let now = self.clock.now();
        let slot = purpose.slot(user);

        let Some(pending) = slot.as_ref() else {
            return Err(TokenError::Mismatch);
        };
        if !pending.matches(token) {
            return Err(TokenError::Mismatch);
        }
        if pending.is_expired(now) {
            return Err(TokenError::Expired);
        }

        *slot = None;
        Ok(())
    }
}
