use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::errors::UserError;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{3,15}$").expect("phone pattern is a valid regex"));

/// A phone number with common separators stripped, e.g. `+1 (555) 010-0000`
/// becomes `+15550100000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str) -> Result<Self, UserError> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        if !PHONE_PATTERN.is_match(&normalized) {
            return Err(UserError::InvalidPhone);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
