//! Coordinates and great-circle math.
//!
//! Every distance in the engine comes from the same haversine formula so
//! that radius filtering and spacing comparisons can never disagree about
//! how far apart two points are. Distances are meters and stay unrounded;
//! presentation layers round for display.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// A validated WGS84 coordinate pair.
///
/// Construction through [`GeoPoint::new`] guarantees both components are
/// finite and in range, so downstream math never sees NaN or a latitude of
/// 999. Fields stay public for literal construction in code that has already
/// validated its inputs (catalog loading does this once at startup).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Validate and construct a coordinate pair.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::InvalidCoordinate { lat, lon });
        }
        Ok(GeoPoint { lat, lon })
    }

    /// Haversine distance to another point, in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Fixed-precision area code for this coordinate, e.g. `"16.061,108.235"`
    /// at precision 3 (cells of roughly 110 m on a side).
    ///
    /// Buckets are observability handles: they group requests by locality in
    /// logs without storing raw coordinates, and give area-level throttling a
    /// stable key if it is ever needed.
    pub fn area_bucket(&self, precision: u32) -> String {
        let p = precision as usize;
        format!("{:.p$},{:.p$}", self.lat, self.lon, p = p)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Axis-aligned service-area boundary.
///
/// When configured, query coordinates outside the box are rejected before
/// any quota or policy work happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Validate and construct a bounding box from two corners.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        // Corner validity implies every contained point is valid.
        GeoPoint::new(min_lat, min_lon)?;
        GeoPoint::new(max_lat, max_lon)?;
        if min_lat > max_lat || min_lon > max_lon {
            return Err(CoreError::InvalidCoordinate {
                lat: min_lat,
                lon: min_lon,
            });
        }
        Ok(BoundingBox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Whether the point lies inside the box (boundary inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}
