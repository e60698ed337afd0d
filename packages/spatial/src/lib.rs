#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial helpers for trail geometry.
//!
//! Two operations back the reporting workflow:
//!
//! - [`snap_to_line`] finds the nearest point on a trail to a clicked
//!   location, so issue markers always sit on the trail itself.
//! - [`TrailIndex`] holds trail envelopes in an R-tree and answers "which
//!   trail did this click land on", with a tolerance in meters.
//!
//! Distances are computed in a local equirectangular projection centered on
//! the query point. Over the few hundred meters a click tolerance or a
//! snap covers, the error against a geodesic computation is negligible.

use geo::{BoundingRect, Closest, ClosestPoint, Coord, LineString, MultiLineString, Point};
use rstar::{AABB, RTree, RTreeObject};
use trail_map_trail_models::{LatLng, TrailFeature};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Result of snapping a location onto a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped {
    /// The nearest point on the line.
    pub point: LatLng,
    /// Distance in meters from the query location to [`Self::point`].
    pub distance_m: f64,
}

/// A tangent-plane projection around an origin, in meters.
#[derive(Debug, Clone, Copy)]
struct LocalProjection {
    origin: LatLng,
    lng_scale: f64,
}

impl LocalProjection {
    fn new(origin: LatLng) -> Self {
        Self {
            origin,
            lng_scale: origin.lat.to_radians().cos() * METERS_PER_DEGREE,
        }
    }

    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x - self.origin.lng) * self.lng_scale,
            y: (coord.y - self.origin.lat) * METERS_PER_DEGREE,
        }
    }

    fn unproject(&self, coord: Coord<f64>) -> LatLng {
        LatLng::new(
            coord.y / METERS_PER_DEGREE + self.origin.lat,
            coord.x / self.lng_scale + self.origin.lng,
        )
    }

    fn project_lines(&self, lines: &MultiLineString<f64>) -> MultiLineString<f64> {
        MultiLineString::new(
            lines
                .0
                .iter()
                .map(|line| LineString::new(line.0.iter().map(|c| self.project(*c)).collect()))
                .collect(),
        )
    }
}

/// Approximate ground distance between two coordinates in meters.
#[must_use]
pub fn distance_meters(a: LatLng, b: LatLng) -> f64 {
    let projection = LocalProjection::new(a);
    let p = projection.project(Coord { x: b.lng, y: b.lat });
    p.x.hypot(p.y)
}

/// Finds the nearest point on `lines` to `location`.
///
/// Returns `None` if the geometry has no coordinates.
#[must_use]
pub fn snap_to_line(lines: &MultiLineString<f64>, location: LatLng) -> Option<Snapped> {
    let projection = LocalProjection::new(location);
    let projected = projection.project_lines(lines);

    let nearest = match projected.closest_point(&Point::new(0.0, 0.0)) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => p,
        Closest::Indeterminate => return None,
    };

    Some(Snapped {
        point: projection.unproject(nearest.0),
        distance_m: nearest.x().hypot(nearest.y()),
    })
}

/// Snaps a location onto a trail's geometry.
#[must_use]
pub fn snap_to_trail(trail: &TrailFeature, location: LatLng) -> Option<Snapped> {
    snap_to_line(&trail.geometry, location)
}

/// A trail stored in the R-tree with its geometry.
struct TrailEntry {
    id: i64,
    envelope: AABB<[f64; 2]>,
    geometry: MultiLineString<f64>,
}

impl RTreeObject for TrailEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of trail geometries for click hit testing.
pub struct TrailIndex {
    trails: RTree<TrailEntry>,
}

impl TrailIndex {
    /// Builds an index over the given trails. Trails without coordinates
    /// are skipped.
    #[must_use]
    pub fn new<'a>(trails: impl IntoIterator<Item = &'a TrailFeature>) -> Self {
        let entries: Vec<TrailEntry> = trails
            .into_iter()
            .filter_map(|trail| {
                let rect = trail.geometry.bounding_rect()?;
                Some(TrailEntry {
                    id: trail.trail.id,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    geometry: trail.geometry.clone(),
                })
            })
            .collect();

        log::debug!("Indexed {} trails", entries.len());

        Self {
            trails: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed trails.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trails.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trails.size() == 0
    }

    /// Returns the id of the trail closest to `location`, if any trail lies
    /// within `tolerance_m` meters of it.
    ///
    /// Trails can cross or run alongside each other; the nearest wins.
    #[must_use]
    pub fn nearest_within(&self, location: LatLng, tolerance_m: f64) -> Option<i64> {
        let d_lat = tolerance_m / METERS_PER_DEGREE;
        let d_lng = tolerance_m / (METERS_PER_DEGREE * location.lat.to_radians().cos()).max(1.0);
        let query_env = AABB::from_corners(
            [location.lng - d_lng, location.lat - d_lat],
            [location.lng + d_lng, location.lat + d_lat],
        );

        let mut best: Option<(i64, f64)> = None;

        for entry in self.trails.locate_in_envelope_intersecting(&query_env) {
            let Some(snapped) = snap_to_line(&entry.geometry, location) else {
                continue;
            };
            if snapped.distance_m > tolerance_m {
                continue;
            }
            match best {
                Some((_, d)) if d <= snapped.distance_m => {}
                _ => best = Some((entry.id, snapped.distance_m)),
            }
        }

        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_map_trail_models::TrailRef;

    fn trail(id: i64, coords: &[(f64, f64)]) -> TrailFeature {
        TrailFeature {
            trail: TrailRef {
                id,
                label: format!("Trail {id}"),
            },
            geometry: MultiLineString::new(vec![LineString::from(coords.to_vec())]),
        }
    }

    #[test]
    fn snaps_perpendicular_onto_segment() {
        // east-west segment along lat 40.0
        let t = trail(1, &[(-75.20, 40.0), (-75.10, 40.0)]);
        let snapped = snap_to_trail(&t, LatLng::new(40.001, -75.15)).unwrap();

        assert!((snapped.point.lat - 40.0).abs() < 1e-9);
        assert!((snapped.point.lng - -75.15).abs() < 1e-9);
        // 0.001 degrees of latitude is roughly 111 m
        assert!((snapped.distance_m - 111.2).abs() < 1.0);
    }

    #[test]
    fn snaps_to_endpoint_beyond_segment() {
        let t = trail(1, &[(-75.20, 40.0), (-75.10, 40.0)]);
        let snapped = snap_to_trail(&t, LatLng::new(40.0, -75.0)).unwrap();
        assert!((snapped.point.lng - -75.10).abs() < 1e-9);
        assert!((snapped.point.lat - 40.0).abs() < 1e-9);
    }

    #[test]
    fn snap_picks_nearest_component_line() {
        let t = TrailFeature {
            trail: TrailRef {
                id: 1,
                label: String::new(),
            },
            geometry: MultiLineString::new(vec![
                LineString::from(vec![(-75.20, 40.0), (-75.10, 40.0)]),
                LineString::from(vec![(-75.20, 40.01), (-75.10, 40.01)]),
            ]),
        };
        let snapped = snap_to_trail(&t, LatLng::new(40.009, -75.15)).unwrap();
        assert!((snapped.point.lat - 40.01).abs() < 1e-9);
    }

    #[test]
    fn empty_geometry_does_not_snap() {
        let lines = MultiLineString::<f64>::new(vec![]);
        assert!(snap_to_line(&lines, LatLng::new(40.0, -75.0)).is_none());
    }

    #[test]
    fn distance_is_symmetric_enough() {
        let a = LatLng::new(39.95, -75.16);
        let b = LatLng::new(39.96, -75.15);
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() / ab < 1e-3);
        assert!(ab > 1000.0 && ab < 1500.0);
    }

    #[test]
    fn index_finds_nearest_trail_within_tolerance() {
        let trails = [
            trail(1, &[(-75.20, 40.0), (-75.10, 40.0)]),
            trail(2, &[(-75.20, 40.0002), (-75.10, 40.0002)]),
            trail(3, &[(-75.00, 41.0), (-74.90, 41.0)]),
        ];
        let index = TrailIndex::new(&trails);
        assert_eq!(index.len(), 3);

        // ~11 m north of trail 1, ~11 m south of trail 2: closer to 2
        assert_eq!(
            index.nearest_within(LatLng::new(40.00011, -75.15), 15.0),
            Some(2)
        );
        assert_eq!(
            index.nearest_within(LatLng::new(39.99995, -75.15), 15.0),
            Some(1)
        );
    }

    #[test]
    fn index_misses_outside_tolerance() {
        let trails = [trail(1, &[(-75.20, 40.0), (-75.10, 40.0)])];
        let index = TrailIndex::new(&trails);
        // ~111 m away
        assert_eq!(index.nearest_within(LatLng::new(40.001, -75.15), 15.0), None);
        assert_eq!(
            index.nearest_within(LatLng::new(40.001, -75.15), 150.0),
            Some(1)
        );
    }
}
