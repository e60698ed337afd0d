#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map view abstraction for the trail map.
//!
//! [`MapView`] is the surface the reporting wizard, the data loader, and
//! the neighbor panel draw on: a tiled base map with a trail overlay, an
//! issue marker overlay, a single report marker, and a neighbor marker
//! group. [`HeadlessMap`] implements it in memory, which is what the
//! terminal front end and the tests drive.

pub mod headless;
pub mod listener;
pub mod prompt;
pub mod tiles;

use strum_macros::{AsRefStr, Display};
use trail_map_trail_models::{IssueReport, LatLng, TrailFeature};

pub use headless::HeadlessMap;
pub use listener::{ListenerGuard, ListenerKind, ListenerRegistry};
pub use prompt::Prompt;
pub use tiles::TileLayer;

/// Stroke parameters for a trail line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// CSS color.
    pub color: &'static str,
    /// Line opacity, 0-1.
    pub opacity: f64,
    /// Line width in pixels.
    pub weight: u32,
    /// Dash length in pixels, `None` for a solid line.
    pub dash: Option<u32>,
}

/// How a trail line is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TrailStyle {
    /// The overlay's static style.
    #[default]
    Default,
    /// Selectable but not chosen (report wizard).
    Unselected,
    /// The trail chosen in the report wizard.
    Selected,
}

impl TrailStyle {
    /// Stroke parameters for this style.
    #[must_use]
    pub const fn stroke(self) -> Stroke {
        match self {
            Self::Default => Stroke {
                color: "#3388ff",
                opacity: 1.0,
                weight: 6,
                dash: None,
            },
            Self::Unselected => Stroke {
                color: "gray",
                opacity: 0.5,
                weight: 6,
                dash: Some(6),
            },
            Self::Selected => Stroke {
                color: "yellow",
                opacity: 0.5,
                weight: 6,
                dash: None,
            },
        }
    }
}

/// An issue shown on the issue overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueMarker {
    /// The report.
    pub report: IssueReport,
    /// Icon chosen from the report category.
    pub icon: &'static str,
}

impl From<IssueReport> for IssueMarker {
    fn from(report: IssueReport) -> Self {
        let icon = report.properties.category.icon();
        Self { report, icon }
    }
}

/// A user interaction delivered to an attached listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// A trail feature was clicked.
    TrailClicked(i64),
    /// The map was clicked at a location.
    MapClicked(LatLng),
}

/// A map with a trail overlay, an issue overlay, and marker layers.
pub trait MapView {
    /// Current view center.
    fn center(&self) -> LatLng;

    /// Current zoom level.
    fn zoom(&self) -> u8;

    /// Pans to a new center keeping the zoom.
    fn pan_to(&mut self, center: LatLng);

    /// Re-reads the container size after a layout change. The view center
    /// can move as a result.
    fn invalidate_size(&mut self);

    /// Shows or hides the report panel next to the map, changing the
    /// container layout (takes effect on [`Self::invalidate_size`]).
    fn set_report_panel_open(&mut self, open: bool);

    /// Whether the report panel is shown.
    fn report_panel_open(&self) -> bool;

    /// Listener registry for click handlers.
    fn listeners(&self) -> &ListenerRegistry;

    /// Adds trails to the trail overlay with the default style.
    fn add_trails(&mut self, trails: Vec<TrailFeature>);

    /// Looks up a trail on the overlay.
    fn trail(&self, id: i64) -> Option<&TrailFeature>;

    /// Ids of all trails on the overlay.
    fn trail_ids(&self) -> Vec<i64>;

    /// Sets the style of one trail. Unknown ids are ignored.
    fn set_trail_style(&mut self, id: i64, style: TrailStyle);

    /// Current style of a trail.
    fn trail_style(&self, id: i64) -> Option<TrailStyle>;

    /// Sets the style of every trail.
    fn set_all_trail_styles(&mut self, style: TrailStyle) {
        for id in self.trail_ids() {
            self.set_trail_style(id, style);
        }
    }

    /// Restores the overlay's static style on every trail.
    fn reset_trail_styles(&mut self) {
        self.set_all_trail_styles(TrailStyle::Default);
    }

    /// Adds an issue marker to the issue overlay.
    fn add_issue(&mut self, report: IssueReport);

    /// Markers on the issue overlay.
    fn issues(&self) -> &[IssueMarker];

    /// Places (or with `None`, removes) the single report marker.
    fn set_report_marker(&mut self, location: Option<LatLng>);

    /// Location of the report marker, if placed.
    fn report_marker(&self) -> Option<LatLng>;

    /// Replaces the neighbor marker group's contents with one marker.
    fn show_neighbor_marker(&mut self, location: LatLng);

    /// Empties the neighbor marker group.
    fn clear_neighbor_markers(&mut self);

    /// Markers in the neighbor marker group.
    fn neighbor_markers(&self) -> &[LatLng];
}

/// Runs `f`, then re-validates the map size and pans back to the center
/// recorded before `f` ran.
///
/// Wrap anything that shows or hides UI next to the map: the container
/// resize would otherwise drift the view away from what the user was
/// looking at.
pub fn preserve_center<M, T>(map: &mut M, f: impl FnOnce(&mut M) -> T) -> T
where
    M: MapView + ?Sized,
{
    let center = map.center();
    let result = f(map);
    map.invalidate_size();
    map.pan_to(center);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_map_config::AppConfig;

    #[test]
    fn preserve_center_undoes_layout_drift() {
        let mut map = HeadlessMap::from_config(&AppConfig::defaults().map);
        let before = map.center();

        // without preservation, opening the panel drifts the center
        map.set_report_panel_open(true);
        map.invalidate_size();
        assert_ne!(map.center(), before);

        map.pan_to(before);
        preserve_center(&mut map, |m| m.set_report_panel_open(false));
        assert_eq!(map.center(), before);
    }

    #[test]
    fn styles_match_overlay_definitions() {
        assert_eq!(TrailStyle::Unselected.stroke().dash, Some(6));
        assert_eq!(TrailStyle::Selected.stroke().color, "yellow");
        assert!(
            [TrailStyle::Default, TrailStyle::Unselected, TrailStyle::Selected]
                .iter()
                .all(|s| s.stroke().weight == 6)
        );
    }
}
