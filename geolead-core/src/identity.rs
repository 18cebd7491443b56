//! Validated caller identities.

use std::fmt;

use serde::Serialize;

use crate::error::{CoreError, Result};

const MIN_LEN: usize = 8;
const MAX_LEN: usize = 128;

/// Opaque, stable identifier for a client, used as the quota partition key.
///
/// The value is whatever the client-side plumbing persisted (typically a
/// random token in a long-lived cookie). It is not trusted to be globally
/// unique; it only needs to be stable for the same client so that quota
/// accounting sticks. Shape is validated here so malformed identities are
/// rejected before any quota or policy work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CallerId(String);

impl CallerId {
    /// Parse and validate a raw identity string.
    ///
    /// Accepts 8..=128 characters from `[A-Za-z0-9._-]` after trimming
    /// surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() < MIN_LEN || trimmed.len() > MAX_LEN {
            return Err(CoreError::InvalidCallerId(format!(
                "length {} outside {}..={}",
                trimmed.len(),
                MIN_LEN,
                MAX_LEN
            )));
        }
        if !trimmed
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
        {
            return Err(CoreError::InvalidCallerId(
                "contains characters outside [A-Za-z0-9._-]".to_string(),
            ));
        }
        Ok(CallerId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_cookie_tokens() {
        assert!(CallerId::parse("3f2a9c815e0b4d67").is_ok());
        assert!(CallerId::parse("anon-3f2a.9c81_5e0b").is_ok());
        assert!(CallerId::parse("  padded-token-123  ").is_ok());
    }

    #[test]
    fn rejects_short_long_and_bad_chars() {
        assert!(CallerId::parse("short").is_err());
        assert!(CallerId::parse(&"x".repeat(129)).is_err());
        assert!(CallerId::parse("has spaces inside").is_err());
        assert!(CallerId::parse("emoji-\u{1F600}-token").is_err());
        assert!(CallerId::parse("semi;colon;token").is_err());
    }

    #[test]
    fn trims_before_storing() {
        let id = CallerId::parse(" token-abc-123 ").unwrap();
        assert_eq!(id.as_str(), "token-abc-123");
    }
}
