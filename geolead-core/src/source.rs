//! Candidate lookup around a query point.
//!
//! The engine only ever asks one question of a spatial backend: which known
//! points sit within `radius` meters of `center`, and how far away is each?
//! [`CandidateSource`] captures that question; the answer order is
//! unspecified because selection re-sorts deterministically anyway.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::poi::{Poi, PoiCatalog};

/// A POI paired with its distance from the query point, in meters.
///
/// Ephemeral, produced per request. The distance is exact haversine output;
/// rounding happens only at presentation.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub poi: Poi,
    pub distance_m: f64,
}

/// Source of candidates within a radius of a center point.
///
/// Implementations must return only points whose haversine distance from
/// `center` is at most `radius_m`, with `distance_m` computed by the same
/// metric the selector uses. Backends may suspend (remote spatial stores);
/// failures surface as [`crate::CoreError::Source`].
#[async_trait]
pub trait CandidateSource: Debug + Send + Sync {
    async fn within_radius(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<Candidate>>;
}

/// In-memory candidate source backed by the startup catalog.
///
/// Linear scan over the full catalog per query. At the catalog sizes this
/// product runs (hundreds of points) that is faster in practice than
/// maintaining a spatial index, and it cannot desynchronize from the
/// catalog.
#[derive(Debug, Clone)]
pub struct MemoryGeoIndex {
    catalog: Arc<PoiCatalog>,
}

impl MemoryGeoIndex {
    pub fn new(catalog: PoiCatalog) -> Self {
        MemoryGeoIndex {
            catalog: Arc::new(catalog),
        }
    }

    pub fn shared(catalog: Arc<PoiCatalog>) -> Self {
        MemoryGeoIndex { catalog }
    }

    pub fn poi_count(&self) -> usize {
        self.catalog.len()
    }
}

#[async_trait]
impl CandidateSource for MemoryGeoIndex {
    async fn within_radius(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<Candidate>> {
        let candidates: Vec<Candidate> = self
            .catalog
            .points()
            .iter()
            .filter_map(|poi| {
                let distance_m = center.distance_to(&poi.location());
                (distance_m <= radius_m).then(|| Candidate {
                    poi: poi.clone(),
                    distance_m,
                })
            })
            .collect();
        tracing::trace!(
            total = self.catalog.len(),
            in_radius = candidates.len(),
            radius_m,
            "candidate scan"
        );
        Ok(candidates)
    }
}
