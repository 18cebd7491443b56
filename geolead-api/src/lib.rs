//! The Geolead admission pipeline.
//!
//! [`AdmissionEngine`] is the request-level composition of the whole system:
//!
//! ```text
//! validate input -> resolve tier -> resolve verification -> evaluate policy
//!       -> (on ALLOW) candidate lookup -> spacing selection -> consume quota
//!       -> results + decision metadata
//! ```
//!
//! Collaborators (quota store, candidate source, entitlement resolver,
//! human verifier) are injected through [`AdmissionEngineBuilder`]; the
//! engine owns no globals and no background tasks. Construct it once at
//! startup and share it behind your server state.

pub mod builder;
pub mod error;
pub mod pipeline;

pub use builder::AdmissionEngineBuilder;
pub use error::{EngineError, Result};
pub use pipeline::{AdmissionEngine, EngineConfig, SearchRequest, SearchOutcome, StatusReport};

// The domain vocabulary downstream consumers need alongside the engine.
pub use geolead_core::{
    BoundingBox, CallerId, Candidate, CandidateSource, GeoPoint, MemoryGeoIndex, Poi, PoiCatalog,
};
pub use geolead_policy::{Decision, PolicyConfig, PolicyLimits, Tier, Verdict};
pub use geolead_quota::{MemoryQuotaStore, QuotaStore, RedisQuotaStore};
