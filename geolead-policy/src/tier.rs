//! Subscription tiers and their limits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subscription class of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Free,
    Paid,
}

impl Tier {
    pub fn is_paid(&self) -> bool {
        matches!(self, Tier::Paid)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => f.write_str("FREE"),
            Tier::Paid => f.write_str("PAID"),
        }
    }
}

/// The two tier-scoped constants policy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Searches allowed per caller per UTC day.
    pub daily_limit: u32,
    /// Cap on the result set for one search.
    pub max_results: u32,
}

/// Limits for both tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLimits {
    pub free: TierLimits,
    pub paid: TierLimits,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        PolicyLimits {
            free: TierLimits {
                daily_limit: 2,
                max_results: 1,
            },
            paid: TierLimits {
                daily_limit: 50,
                max_results: 5,
            },
        }
    }
}

impl PolicyLimits {
    pub fn for_tier(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Free => self.free,
            Tier::Paid => self.paid,
        }
    }

    /// Startup sanity check: the paid tier must dominate the free tier.
    pub fn validate(&self) -> Result<(), String> {
        if self.paid.daily_limit <= self.free.daily_limit {
            return Err(format!(
                "paid daily limit ({}) must exceed free daily limit ({})",
                self.paid.daily_limit, self.free.daily_limit
            ));
        }
        if self.paid.max_results < self.free.max_results {
            return Err(format!(
                "paid max results ({}) must be at least free max results ({})",
                self.paid.max_results, self.free.max_results
            ));
        }
        Ok(())
    }
}
