//! Credential-to-tier resolution.

use std::collections::HashSet;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::tier::Tier;

/// Maps an opaque session credential to a subscription tier.
///
/// Resolution is a lookup with no side effects visible to the engine. A
/// missing or unknown credential resolves to [`Tier::Free`]; resolvers never
/// fail a request, they only downgrade it.
#[async_trait]
pub trait EntitlementResolver: Debug + Send + Sync {
    async fn resolve(&self, credential: Option<&str>) -> Tier;
}

/// Resolver backed by a configured set of paid credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlements {
    paid_credentials: HashSet<String>,
}

impl StaticEntitlements {
    pub fn new(paid_credentials: impl IntoIterator<Item = String>) -> Self {
        StaticEntitlements {
            paid_credentials: paid_credentials.into_iter().collect(),
        }
    }
}

#[async_trait]
impl EntitlementResolver for StaticEntitlements {
    async fn resolve(&self, credential: Option<&str>) -> Tier {
        match credential {
            Some(c) if self.paid_credentials.contains(c) => Tier::Paid,
            _ => Tier::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_credential_resolves_paid() {
        let resolver = StaticEntitlements::new(["sub-key-123".to_string()]);
        assert_eq!(resolver.resolve(Some("sub-key-123")).await, Tier::Paid);
    }

    #[tokio::test]
    async fn unknown_or_absent_credential_resolves_free() {
        let resolver = StaticEntitlements::new(["sub-key-123".to_string()]);
        assert_eq!(resolver.resolve(Some("other")).await, Tier::Free);
        assert_eq!(resolver.resolve(None).await, Tier::Free);
    }

    #[tokio::test]
    async fn empty_resolver_treats_everyone_as_free() {
        let resolver = StaticEntitlements::default();
        assert_eq!(resolver.resolve(Some("anything")).await, Tier::Free);
    }
}
