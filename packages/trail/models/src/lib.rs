#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trail geometry and trail issue report types.
//!
//! Trails come from an external `GeoJSON` dataset and are read-only here.
//! Issue reports are `GeoJSON` point features created by the reporting
//! wizard and persisted by the issue API, which echoes them back.

pub mod issue;
pub mod trail;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use issue::{
    IssueCategory, IssueProperties, IssueReport, format_timestamp, parse_issue_collection,
};
pub use trail::{TrailFeature, TrailRef, parse_trail_collection};

/// A WGS84 coordinate.
///
/// Note the field order: `GeoJSON` positions are `[lng, lat]`, while map
/// APIs conventionally take `(lat, lng)`. Conversions to and from
/// [`geo::Point`] put longitude on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Converts to a [`geo::Point`] with `x = lng`, `y = lat`.
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }

    /// Returns the `GeoJSON` position `[lng, lat]`.
    #[must_use]
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }

    /// Parses a `GeoJSON` position (`[lng, lat, ...]`).
    #[must_use]
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    /// Whether both components are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<geo::Point<f64>> for LatLng {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Errors converting `GeoJSON` into domain types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The JSON was not the expected `GeoJSON` object.
    #[error("Invalid GeoJSON: {message}")]
    InvalidGeoJson {
        /// Description of the problem.
        message: String,
    },

    /// A feature had no geometry.
    #[error("Feature has no geometry")]
    MissingGeometry,

    /// A feature had a geometry type this system does not handle.
    #[error("Unsupported geometry type: {kind}")]
    UnsupportedGeometry {
        /// The `GeoJSON` geometry type name.
        kind: String,
    },

    /// A required property was missing or had the wrong type.
    #[error("Missing or invalid property: {name}")]
    MissingProperty {
        /// Property name.
        name: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a JSON value as a `GeoJSON` `FeatureCollection` and returns its
/// features.
///
/// # Errors
///
/// Returns [`ModelError::InvalidGeoJson`] if the value is not a
/// `FeatureCollection`.
pub fn feature_collection(value: serde_json::Value) -> Result<Vec<geojson::Feature>, ModelError> {
    match geojson::GeoJson::from_json_value(value) {
        Ok(geojson::GeoJson::FeatureCollection(fc)) => Ok(fc.features),
        Ok(other) => Err(ModelError::InvalidGeoJson {
            message: format!("expected a FeatureCollection, found {}", geojson_kind(&other)),
        }),
        Err(e) => Err(ModelError::InvalidGeoJson {
            message: e.to_string(),
        }),
    }
}

const fn geojson_kind(value: &geojson::GeoJson) -> &'static str {
    match value {
        geojson::GeoJson::Geometry(_) => "Geometry",
        geojson::GeoJson::Feature(_) => "Feature",
        geojson::GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_order_is_lng_lat() {
        let ll = LatLng::new(39.95, -75.16);
        assert_eq!(ll.to_position(), vec![-75.16, 39.95]);
        assert_eq!(LatLng::from_position(&[-75.16, 39.95, 12.0]), Some(ll));
        assert_eq!(LatLng::from_position(&[1.0]), None);
    }

    #[test]
    fn point_conversion_puts_lng_on_x() {
        let ll = LatLng::new(39.95, -75.16);
        let point = ll.to_point();
        assert!((point.x() - -75.16).abs() < f64::EPSILON);
        assert_eq!(LatLng::from(point), ll);
    }

    #[test]
    fn rejects_non_collection() {
        let err = feature_collection(serde_json::json!({
            "type": "Point",
            "coordinates": [0.0, 0.0]
        }))
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeoJson { .. }));
    }

    #[test]
    fn validity_bounds() {
        assert!(LatLng::new(39.95, -75.16).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }
}
