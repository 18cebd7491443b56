//! Admission decisions.

use serde::{Deserialize, Serialize};

/// The three-way admission verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// The search may run (quota is charged after it succeeds).
    Allow,
    /// The caller must complete human verification first. Not an error:
    /// quota is untouched and the request can be repeated with a token.
    ChallengeRequired,
    /// Daily quota exhausted; retry after the reset.
    Block,
}

/// Outcome of one policy evaluation. Produced fresh per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    /// Units left today (post-consumption when a search was served).
    pub quota_remaining: u32,
    /// Result-set cap for the caller's tier.
    pub max_results: u32,
    /// Seconds until the quota resets; present only on [`Verdict::Block`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }

    pub fn requires_challenge(&self) -> bool {
        self.verdict == Verdict::ChallengeRequired
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_wire_format_is_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Verdict::ChallengeRequired).unwrap(),
            "\"CHALLENGE_REQUIRED\""
        );
        assert_eq!(serde_json::to_string(&Verdict::Allow).unwrap(), "\"ALLOW\"");
        assert_eq!(serde_json::to_string(&Verdict::Block).unwrap(), "\"BLOCK\"");
    }

    #[test]
    fn retry_after_is_omitted_unless_present() {
        let decision = Decision {
            verdict: Verdict::Allow,
            quota_remaining: 2,
            max_results: 1,
            retry_after: None,
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert!(value.get("retry_after").is_none());
    }
}
