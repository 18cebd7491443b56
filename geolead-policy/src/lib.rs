//! Admission policy for the Geolead engine.
//!
//! A request is admitted, challenged, or blocked based on three inputs: the
//! caller's subscription tier, today's quota usage, and whether the caller
//! has passed human verification. [`PolicyEngine`] turns those inputs into a
//! [`Decision`]; the surrounding pipeline owns when to act on it and when to
//! charge the quota.
//!
//! # Decide, then consume
//!
//! Evaluation and consumption are two separate calls by contract:
//! [`PolicyEngine::evaluate`] only reads, and [`PolicyEngine::consume`] is
//! invoked by the pipeline strictly after the search has produced results.
//! Fusing them would charge callers for searches that fail downstream.

pub mod decision;
pub mod engine;
pub mod entitlement;
pub mod tier;
pub mod verify;

pub use decision::{Decision, Verdict};
pub use engine::{seconds_until_reset, PolicyConfig, PolicyEngine, RequestContext};
pub use entitlement::{EntitlementResolver, StaticEntitlements};
pub use tier::{PolicyLimits, Tier, TierLimits};
pub use verify::{AcceptAllVerifier, CachedVerifier, DenyAllVerifier, HumanVerifier};
