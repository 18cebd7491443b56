//! Domain core for the Geolead admission and proximity-selection engine.
//!
//! This crate owns the pieces of the system that are pure domain logic with
//! no I/O policy attached: coordinates and great-circle math, the immutable
//! point-of-interest catalog, validated caller identities, the candidate
//! source abstraction, and the spacing-constrained selection algorithm.
//!
//! # Architecture
//!
//! ```text
//! PoiCatalog (loaded once, read-only)
//!      |
//!      v
//! CandidateSource::within_radius(center, radius)   <- trait, async
//!      |
//!      v
//! Vec<Candidate>  --(SpacingSelector::select)-->  ordered, spaced results
//! ```
//!
//! Everything here is synchronous and allocation-light except the
//! [`CandidateSource`] trait, which is async because implementations may be
//! backed by a remote spatial store. The in-memory implementation
//! ([`MemoryGeoIndex`]) performs a linear haversine scan, which is the right
//! tool at catalog sizes of a few hundred points.

pub mod error;
pub mod geo;
pub mod identity;
pub mod poi;
pub mod select;
pub mod source;

pub use error::{CoreError, Result};
pub use geo::{haversine_distance, BoundingBox, GeoPoint, EARTH_RADIUS_METERS};
pub use identity::CallerId;
pub use poi::{Poi, PoiCatalog};
pub use select::SpacingSelector;
pub use source::{Candidate, CandidateSource, MemoryGeoIndex};
