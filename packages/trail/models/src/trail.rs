//! Trail line features from the external trail dataset.

use geo::{LineString, MultiLineString};
use serde::{Deserialize, Serialize};

use crate::{ModelError, feature_collection};

/// Identifier and label of a trail, as attached to issue reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrailRef {
    /// Dataset identifier (`OBJECTID` in the default dataset).
    pub id: i64,
    /// Human-readable trail name.
    pub label: String,
}

impl std::fmt::Display for TrailRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "trail #{}", self.id)
        } else {
            write!(f, "{} (#{})", self.label, self.id)
        }
    }
}

/// A trail line geometry with its identity.
///
/// `LineString` features are normalized to a single-member
/// `MultiLineString` so every consumer handles one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailFeature {
    /// Identity of the trail.
    pub trail: TrailRef,
    /// Line geometry in lng/lat order.
    pub geometry: MultiLineString<f64>,
}

impl TrailFeature {
    /// Builds a trail from a `GeoJSON` feature, reading the identifier and
    /// label from the given property names.
    ///
    /// The identifier may be a JSON number or a numeric string. A missing
    /// label becomes an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the identifier is missing, the geometry is
    /// missing, or the geometry is not a (multi)line string.
    pub fn from_feature(
        feature: &geojson::Feature,
        id_property: &str,
        label_property: &str,
    ) -> Result<Self, ModelError> {
        let id = feature
            .property(id_property)
            .and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .ok_or_else(|| ModelError::MissingProperty {
                name: id_property.to_string(),
            })?;

        let label = feature
            .property(label_property)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(ModelError::MissingGeometry)?;

        let geometry = match geo::Geometry::<f64>::try_from(geometry.clone()) {
            Ok(geo::Geometry::LineString(line)) => MultiLineString::new(vec![line]),
            Ok(geo::Geometry::MultiLineString(lines)) => lines,
            Ok(_) | Err(_) => {
                return Err(ModelError::UnsupportedGeometry {
                    kind: geometry_type_name(&geometry.value).to_string(),
                });
            }
        };

        Ok(Self {
            trail: TrailRef { id, label },
            geometry,
        })
    }

    /// Iterates over the component line strings.
    pub fn lines(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.geometry.0.iter()
    }

    /// Whether the geometry has at least one coordinate.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.lines().any(|line| !line.0.is_empty())
    }
}

/// `GeoJSON` `type` member for a geometry value.
pub(crate) const fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Parses a trail `FeatureCollection`, skipping features that cannot be
/// converted.
///
/// # Errors
///
/// Returns [`ModelError`] only if the document itself is not a
/// `FeatureCollection`. Individual bad features are logged and dropped.
pub fn parse_trail_collection(
    value: serde_json::Value,
    id_property: &str,
    label_property: &str,
) -> Result<Vec<TrailFeature>, ModelError> {
    let features = feature_collection(value)?;
    let total = features.len();

    let trails: Vec<TrailFeature> = features
        .iter()
        .filter_map(
            |feature| match TrailFeature::from_feature(feature, id_property, label_property) {
                Ok(trail) if trail.has_coordinates() => Some(trail),
                Ok(trail) => {
                    log::warn!("Skipping {} with empty geometry", trail.trail);
                    None
                }
                Err(e) => {
                    log::warn!("Skipping trail feature: {e}");
                    None
                }
            },
        )
        .collect();

    if trails.len() < total {
        log::info!("Parsed {} of {total} trail features", trails.len());
    }

    Ok(trails)
}
