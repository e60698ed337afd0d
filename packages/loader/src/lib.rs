#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Startup loading of the trail and issue overlays.
//!
//! Both collections are fetched concurrently. Each overlay is populated
//! independently: a failed trail fetch still shows the issues and the
//! other way round. Nothing is cached or retried.

use std::fmt;

use trail_map_api::{ApiError, IssueStore, TrailSource};
use trail_map_map::MapView;

/// Result of loading one overlay.
#[derive(Debug)]
pub enum OverlayLoad {
    /// The overlay was populated with this many features.
    Loaded(usize),
    /// The fetch failed and the overlay was left untouched.
    Failed(ApiError),
}

impl OverlayLoad {
    /// Number of features added, zero on failure.
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            Self::Loaded(count) => *count,
            Self::Failed(_) => 0,
        }
    }

    /// Whether the fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for OverlayLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(count) => write!(f, "{count} loaded"),
            Self::Failed(e) => write!(f, "failed ({e})"),
        }
    }
}

/// Outcome of [`load_overlays`].
#[derive(Debug)]
pub struct LoadSummary {
    /// Trail overlay.
    pub trails: OverlayLoad,
    /// Issue overlay.
    pub issues: OverlayLoad,
}

/// Fetches trails and existing issues and adds them to `map`.
///
/// Trails get the overlay's default style. Issues become markers with
/// their category icon.
pub async fn load_overlays<S, I, M>(source: &S, store: &I, map: &mut M) -> LoadSummary
where
    S: TrailSource,
    I: IssueStore,
    M: MapView + ?Sized,
{
    let (trails, issues) = futures::join!(source.fetch_trails(), store.list_issues());

    let trails = match trails {
        Ok(trails) => {
            let count = trails.len();
            map.add_trails(trails);
            OverlayLoad::Loaded(count)
        }
        Err(e) => {
            log::error!("Failed to load trails: {e}");
            OverlayLoad::Failed(e)
        }
    };

    let issues = match issues {
        Ok(issues) => {
            let count = issues.len();
            for issue in issues {
                map.add_issue(issue);
            }
            OverlayLoad::Loaded(count)
        }
        Err(e) => {
            log::error!("Failed to load trail issues: {e}");
            OverlayLoad::Failed(e)
        }
    };

    log::info!("Overlays: trails {trails}, issues {issues}");

    LoadSummary { trails, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use trail_map_config::AppConfig;
    use trail_map_map::{HeadlessMap, TrailStyle};
    use trail_map_trail_models::{IssueCategory, IssueReport, LatLng, TrailFeature, TrailRef};

    struct FakeTrails(Option<Vec<TrailFeature>>);

    impl TrailSource for FakeTrails {
        async fn fetch_trails(&self) -> Result<Vec<TrailFeature>, ApiError> {
            self.0.clone().ok_or_else(|| ApiError::Status {
                url: "trails".to_string(),
                status: 500,
            })
        }
    }

    struct FakeIssues(Option<Vec<IssueReport>>);

    impl IssueStore for FakeIssues {
        async fn list_issues(&self) -> Result<Vec<IssueReport>, ApiError> {
            self.0.clone().ok_or_else(|| ApiError::Status {
                url: "issues".to_string(),
                status: 503,
            })
        }

        async fn create_issue(&self, report: &IssueReport) -> Result<IssueReport, ApiError> {
            Ok(report.clone())
        }
    }

    fn trail(id: i64) -> TrailFeature {
        TrailFeature {
            trail: TrailRef {
                id,
                label: format!("Trail {id}"),
            },
            geometry: geo::MultiLineString::new(vec![geo::LineString::from(vec![
                (-75.17, 39.95),
                (-75.16, 39.96),
            ])]),
        }
    }

    fn issue(category: IssueCategory) -> IssueReport {
        IssueReport::new(
            LatLng::new(39.955, -75.165),
            &TrailRef {
                id: 1,
                label: "Trail 1".to_string(),
            },
            category,
            chrono::Utc.with_ymd_and_hms(2022, 3, 10, 14, 30, 0).unwrap(),
            String::new(),
        )
    }

    fn map() -> HeadlessMap {
        HeadlessMap::from_config(&AppConfig::defaults().map)
    }

    #[tokio::test]
    async fn loads_both_overlays() {
        let mut map = map();
        let summary = load_overlays(
            &FakeTrails(Some(vec![trail(1), trail(2)])),
            &FakeIssues(Some(vec![issue(IssueCategory::Litter)])),
            &mut map,
        )
        .await;

        assert_eq!(summary.trails.count(), 2);
        assert_eq!(summary.issues.count(), 1);
        assert_eq!(map.trail_ids(), vec![1, 2]);
        assert_eq!(map.trail_style(1), Some(TrailStyle::Default));
        assert_eq!(map.issues()[0].icon, IssueCategory::Litter.icon());
    }

    #[tokio::test]
    async fn trail_failure_still_shows_issues() {
        let mut map = map();
        let summary = load_overlays(
            &FakeTrails(None),
            &FakeIssues(Some(vec![issue(IssueCategory::Erosion)])),
            &mut map,
        )
        .await;

        assert!(summary.trails.is_failed());
        assert!(map.trail_ids().is_empty());
        assert_eq!(map.issues().len(), 1);
    }

    #[tokio::test]
    async fn issue_failure_still_shows_trails() {
        let mut map = map();
        let summary = load_overlays(&FakeTrails(Some(vec![trail(3)])), &FakeIssues(None), &mut map)
            .await;

        assert!(summary.issues.is_failed());
        assert!(matches!(
            summary.issues,
            OverlayLoad::Failed(ApiError::Status { status: 503, .. })
        ));
        assert_eq!(map.trail_ids(), vec![3]);
        assert!(map.issues().is_empty());
    }
}
