//! Trail issue reports.
//!
//! An issue report is a `GeoJSON` point feature:
//!
//! ```json
//! {
//!   "type": "Feature",
//!   "geometry": { "type": "Point", "coordinates": [lng, lat] },
//!   "properties": {
//!     "category": "obstruction",
//!     "encountered_at": "2022-03-10T14:30:00.000Z",
//!     "details": "Fallen tree across the path",
//!     "trail_id": 7,
//!     "trail_label": "Forbidden Drive"
//!   }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::trail::geometry_type_name;
use crate::{LatLng, ModelError, TrailRef, feature_collection};

/// Kind of problem reported on a trail.
///
/// Each category picks the marker icon used on the issue overlay.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueCategory {
    /// Something blocking the path (fallen tree, debris).
    Obstruction,
    /// Washouts, ruts, collapsing edges.
    Erosion,
    /// Standing or running water on the trail.
    Flooding,
    /// Trash and dumping.
    Litter,
    /// Damaged signs, benches, or structures.
    Vandalism,
    /// Conditions that put users at risk.
    Safety,
    /// Anything else, including categories this client does not know.
    #[serde(other)]
    Other,
}

impl IssueCategory {
    /// All categories in display order.
    pub const ALL: &[Self] = &[
        Self::Obstruction,
        Self::Erosion,
        Self::Flooding,
        Self::Litter,
        Self::Vandalism,
        Self::Safety,
        Self::Other,
    ];

    /// Human-readable label for form options.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Obstruction => "Obstruction",
            Self::Erosion => "Erosion",
            Self::Flooding => "Flooding",
            Self::Litter => "Litter",
            Self::Vandalism => "Vandalism",
            Self::Safety => "Safety hazard",
            Self::Other => "Other",
        }
    }

    /// Marker icon for this category.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Obstruction => "icons/obstruction.svg",
            Self::Erosion => "icons/erosion.svg",
            Self::Flooding => "icons/flooding.svg",
            Self::Litter => "icons/litter.svg",
            Self::Vandalism => "icons/vandalism.svg",
            Self::Safety => "icons/safety.svg",
            Self::Other => "icons/other.svg",
        }
    }
}

/// Property bag of an issue report feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueProperties {
    /// Kind of problem.
    pub category: IssueCategory,
    /// When the user encountered the problem.
    #[serde(with = "iso_millis")]
    pub encountered_at: DateTime<Utc>,
    /// Free-text description.
    #[serde(default)]
    pub details: String,
    /// Identifier of the trail the issue was reported against.
    pub trail_id: i64,
    /// Label of the trail the issue was reported against.
    #[serde(default)]
    pub trail_label: String,
}

/// An issue report: a located point with its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueReport {
    /// Server-assigned identifier, absent until persisted.
    pub id: Option<String>,
    /// Where the issue is.
    pub location: LatLng,
    /// Category, time, details and trail reference.
    pub properties: IssueProperties,
}

impl IssueReport {
    /// Creates an unsaved report against a trail.
    #[must_use]
    pub fn new(
        location: LatLng,
        trail: &TrailRef,
        category: IssueCategory,
        encountered_at: DateTime<Utc>,
        details: String,
    ) -> Self {
        Self {
            id: None,
            location,
            properties: IssueProperties {
                category,
                encountered_at,
                details,
                trail_id: trail.id,
                trail_label: trail.label.clone(),
            },
        }
    }

    /// The trail this report references.
    #[must_use]
    pub fn trail(&self) -> TrailRef {
        TrailRef {
            id: self.properties.trail_id,
            label: self.properties.trail_label.clone(),
        }
    }

    /// Converts to a `GeoJSON` point feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] if the properties fail to serialize.
    pub fn to_feature(&self) -> Result<geojson::Feature, ModelError> {
        let serde_json::Value::Object(properties) = serde_json::to_value(&self.properties)? else {
            return Err(ModelError::InvalidGeoJson {
                message: "issue properties did not serialize to an object".to_string(),
            });
        };

        Ok(geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(
                self.location.to_position(),
            ))),
            id: self.id.clone().map(geojson::feature::Id::String),
            properties: Some(properties),
            foreign_members: None,
        })
    }

    /// Converts to the JSON body sent to the issue API.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        Ok(serde_json::to_value(self.to_feature()?)?)
    }

    /// Builds a report from a `GeoJSON` point feature, as echoed by the API.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the geometry is not a point or the
    /// properties do not match [`IssueProperties`].
    pub fn from_feature(feature: geojson::Feature) -> Result<Self, ModelError> {
        let geometry = feature.geometry.ok_or(ModelError::MissingGeometry)?;
        let location = match &geometry.value {
            geojson::Value::Point(position) => {
                LatLng::from_position(position).ok_or_else(|| ModelError::InvalidGeoJson {
                    message: "point has fewer than two coordinates".to_string(),
                })?
            }
            other => {
                return Err(ModelError::UnsupportedGeometry {
                    kind: geometry_type_name(other).to_string(),
                });
            }
        };

        let properties = serde_json::from_value(serde_json::Value::Object(
            feature.properties.unwrap_or_default(),
        ))?;

        let id = feature.id.map(|id| match id {
            geojson::feature::Id::String(s) => s,
            geojson::feature::Id::Number(n) => n.to_string(),
        });

        Ok(Self {
            id,
            location,
            properties,
        })
    }

    /// Builds a report from a JSON value holding a `GeoJSON` feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the value is not a valid issue feature.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        let feature: geojson::Feature = serde_json::from_value(value)?;
        Self::from_feature(feature)
    }
}

/// Parses the issue `FeatureCollection` returned by the API, skipping
/// features that do not convert.
///
/// # Errors
///
/// Returns [`ModelError`] if the document is not a `FeatureCollection`.
pub fn parse_issue_collection(value: serde_json::Value) -> Result<Vec<IssueReport>, ModelError> {
    let features = feature_collection(value)?;

    Ok(features
        .into_iter()
        .filter_map(|feature| match IssueReport::from_feature(feature) {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("Skipping issue feature: {e}");
                None
            }
        })
        .collect())
}

/// Serializes timestamps the way browsers print `Date.toISOString()`
/// (`2022-03-10T14:30:00.000Z`) and accepts any RFC 3339 input.
mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Formats a timestamp as the API expects it.
#[must_use]
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
