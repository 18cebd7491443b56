//! The immutable point-of-interest catalog.
//!
//! Loaded once at process start from a JSON document and never mutated by
//! request handling, so it is safe for unsynchronized concurrent reads. A
//! `Poi` carries exactly the fields callers are allowed to see; anything
//! else about a site lives outside this system.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::geo::GeoPoint;

/// A single point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Optional thumbnail reference (URL or asset key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Poi {
    /// Location as a coordinate pair. Valid by catalog construction.
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// On-disk catalog document: `{"points": [...]}`.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    points: Vec<Poi>,
}

/// Validated, read-only POI collection.
#[derive(Debug, Clone, Default)]
pub struct PoiCatalog {
    points: Vec<Poi>,
}

impl PoiCatalog {
    /// Build a catalog from records, validating each one.
    ///
    /// Rejects out-of-range coordinates, empty identifiers or names, and
    /// duplicate identifiers. A catalog that fails validation fails startup;
    /// there is no partial load.
    pub fn from_points(points: Vec<Poi>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(points.len());
        for poi in &points {
            if poi.id.trim().is_empty() {
                return Err(CoreError::invalid_poi("empty identifier"));
            }
            if poi.name.trim().is_empty() {
                return Err(CoreError::invalid_poi(format!("{}: empty name", poi.id)));
            }
            GeoPoint::new(poi.lat, poi.lon)?;
            if !seen.insert(poi.id.as_str()) {
                return Err(CoreError::invalid_poi(format!(
                    "duplicate identifier {}",
                    poi.id
                )));
            }
        }
        Ok(PoiCatalog { points })
    }

    /// Parse and validate a catalog from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_slice(bytes)?;
        Self::from_points(doc.points)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    pub fn points(&self) -> &[Poi] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "points": [
                {"id": "site-001", "name": "Riverside Tower", "lat": 16.0612, "lon": 108.2272},
                {"id": "site-002", "name": "Harbor Bridge Works", "lat": 16.0878, "lon": 108.2252, "thumbnail": "site-002.jpg"}
            ]
        }"#
    }

    #[test]
    fn parses_catalog_with_optional_thumbnail() {
        let catalog = PoiCatalog::from_json_slice(sample_json().as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.points()[0].thumbnail, None);
        assert_eq!(
            catalog.points()[1].thumbnail.as_deref(),
            Some("site-002.jpg")
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let catalog = PoiCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let points = vec![
            Poi {
                id: "dup".into(),
                name: "A".into(),
                lat: 0.0,
                lon: 0.0,
                thumbnail: None,
            },
            Poi {
                id: "dup".into(),
                name: "B".into(),
                lat: 0.1,
                lon: 0.1,
                thumbnail: None,
            },
        ];
        let err = PoiCatalog::from_points(points).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_bad_coordinates() {
        let points = vec![Poi {
            id: "bad".into(),
            name: "Broken".into(),
            lat: 123.0,
            lon: 0.0,
            thumbnail: None,
        }];
        assert!(PoiCatalog::from_points(points).is_err());
    }

    #[test]
    fn rejects_blank_name() {
        let points = vec![Poi {
            id: "ok".into(),
            name: "   ".into(),
            lat: 0.0,
            lon: 0.0,
            thumbnail: None,
        }];
        assert!(PoiCatalog::from_points(points).is_err());
    }

    #[test]
    fn serialized_poi_exposes_only_public_fields() {
        let poi = Poi {
            id: "site-001".into(),
            name: "Riverside Tower".into(),
            lat: 16.0612,
            lon: 108.2272,
            thumbnail: None,
        };
        let value = serde_json::to_value(&poi).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "name", "lat", "lon"]);
    }
}
