//! In-memory [`MapView`] implementation.

use std::collections::BTreeMap;

use trail_map_config::MapConfig;
use trail_map_spatial::TrailIndex;
use trail_map_trail_models::{IssueReport, LatLng, TrailFeature};

use crate::tiles::degrees_per_pixel;
use crate::{
    IssueMarker, ListenerKind, ListenerRegistry, MapEvent, MapView, TileLayer, TrailStyle,
};

struct TrailOverlayEntry {
    feature: TrailFeature,
    style: TrailStyle,
}

/// A map that keeps its state in memory.
///
/// Layout is modeled the way a browser map container behaves: the viewport
/// narrows while the report panel is open, and the change only reaches the
/// map on [`MapView::invalidate_size`], which keeps the top-left corner
/// fixed and so shifts the center.
pub struct HeadlessMap {
    center: LatLng,
    zoom: u8,
    tile_layer: TileLayer,
    full_width: u32,
    height: u32,
    panel_width: u32,
    panel_open: bool,
    applied_width: u32,
    trail_click_tolerance_m: f64,
    listeners: ListenerRegistry,
    trails: BTreeMap<i64, TrailOverlayEntry>,
    trail_index: TrailIndex,
    issues: Vec<IssueMarker>,
    report_marker: Option<LatLng>,
    neighbor_markers: Vec<LatLng>,
}

impl HeadlessMap {
    /// Creates a map at the configured initial view.
    #[must_use]
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            center: LatLng::new(config.center_lat, config.center_lng),
            zoom: config.zoom,
            tile_layer: TileLayer::new(&config.tile_url, &config.attribution),
            full_width: config.viewport_width,
            height: config.viewport_height,
            panel_width: config.report_panel_width,
            panel_open: false,
            applied_width: config.viewport_width,
            trail_click_tolerance_m: config.trail_click_tolerance_m,
            listeners: ListenerRegistry::new(),
            trails: BTreeMap::new(),
            trail_index: TrailIndex::new(std::iter::empty::<&TrailFeature>()),
            issues: Vec::new(),
            report_marker: None,
            neighbor_markers: Vec::new(),
        }
    }

    /// The base tile layer.
    #[must_use]
    pub const fn tile_layer(&self) -> &TileLayer {
        &self.tile_layer
    }

    /// Viewport size in pixels as last applied by `invalidate_size`.
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        (self.applied_width, self.height)
    }

    /// Simulates a click at `location` and returns one event per attached
    /// listener, in attach order.
    ///
    /// Trail-click listeners only fire when a trail lies within the
    /// configured click tolerance.
    #[must_use]
    pub fn click(&self, location: LatLng) -> Vec<MapEvent> {
        let hit = self
            .trail_index
            .nearest_within(location, self.trail_click_tolerance_m);

        self.listeners
            .active()
            .into_iter()
            .filter_map(|kind| match kind {
                ListenerKind::TrailClick => hit.map(MapEvent::TrailClicked),
                ListenerKind::MapClick => Some(MapEvent::MapClicked(location)),
            })
            .collect()
    }

    /// All trails on the overlay, ordered by id.
    pub fn trails(&self) -> impl Iterator<Item = &TrailFeature> {
        self.trails.values().map(|entry| &entry.feature)
    }

    fn target_width(&self) -> u32 {
        if self.panel_open {
            self.full_width.saturating_sub(self.panel_width)
        } else {
            self.full_width
        }
    }
}

impl MapView for HeadlessMap {
    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn pan_to(&mut self, center: LatLng) {
        log::trace!("Panning to {center}");
        self.center = center;
    }

    fn invalidate_size(&mut self) {
        let target = self.target_width();
        if target == self.applied_width {
            return;
        }

        let delta_px = f64::from(target) - f64::from(self.applied_width);
        self.center.lng += delta_px / 2.0 * degrees_per_pixel(self.zoom);
        self.applied_width = target;
        log::trace!("Viewport resized to {target}px, center now {}", self.center);
    }

    fn set_report_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    fn report_panel_open(&self) -> bool {
        self.panel_open
    }

    fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    fn add_trails(&mut self, trails: Vec<TrailFeature>) {
        for feature in trails {
            self.trails.insert(
                feature.trail.id,
                TrailOverlayEntry {
                    feature,
                    style: TrailStyle::Default,
                },
            );
        }
        self.trail_index = TrailIndex::new(self.trails.values().map(|e| &e.feature));
    }

    fn trail(&self, id: i64) -> Option<&TrailFeature> {
        self.trails.get(&id).map(|entry| &entry.feature)
    }

    fn trail_ids(&self) -> Vec<i64> {
        self.trails.keys().copied().collect()
    }

    fn set_trail_style(&mut self, id: i64, style: TrailStyle) {
        if let Some(entry) = self.trails.get_mut(&id) {
            entry.style = style;
        }
    }

    fn trail_style(&self, id: i64) -> Option<TrailStyle> {
        self.trails.get(&id).map(|entry| entry.style)
    }

    fn add_issue(&mut self, report: IssueReport) {
        self.issues.push(IssueMarker::from(report));
    }

    fn issues(&self) -> &[IssueMarker] {
        &self.issues
    }

    fn set_report_marker(&mut self, location: Option<LatLng>) {
        self.report_marker = location;
    }

    fn report_marker(&self) -> Option<LatLng> {
        self.report_marker
    }

    fn show_neighbor_marker(&mut self, location: LatLng) {
        self.neighbor_markers.clear();
        self.neighbor_markers.push(location);
    }

    fn clear_neighbor_markers(&mut self) {
        self.neighbor_markers.clear();
    }

    fn neighbor_markers(&self) -> &[LatLng] {
        &self.neighbor_markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use trail_map_config::AppConfig;
    use trail_map_trail_models::{IssueCategory, TrailRef};

    fn map_with_trail() -> HeadlessMap {
        let mut map = HeadlessMap::from_config(&AppConfig::defaults().map);
        map.add_trails(vec![TrailFeature {
            trail: TrailRef {
                id: 7,
                label: "Forbidden Drive".to_string(),
            },
            geometry: geo::MultiLineString::new(vec![geo::LineString::from(vec![
                (-75.17, 39.95),
                (-75.15, 39.95),
            ])]),
        }]);
        map
    }

    #[test]
    fn click_routes_only_to_attached_listeners() {
        let map = map_with_trail();
        let on_trail = LatLng::new(39.95005, -75.16);
        assert!(map.click(on_trail).is_empty());

        let trail_guard = map.listeners().attach(ListenerKind::TrailClick);
        assert_eq!(map.click(on_trail), vec![MapEvent::TrailClicked(7)]);
        // off the trail, the trail listener stays silent
        assert!(map.click(LatLng::new(39.96, -75.16)).is_empty());

        drop(trail_guard);
        let _map_guard = map.listeners().attach(ListenerKind::MapClick);
        assert_eq!(map.click(on_trail), vec![MapEvent::MapClicked(on_trail)]);
    }

    #[test]
    fn trail_styles_reset_to_default() {
        let mut map = map_with_trail();
        map.set_all_trail_styles(TrailStyle::Unselected);
        map.set_trail_style(7, TrailStyle::Selected);
        assert_eq!(map.trail_style(7), Some(TrailStyle::Selected));

        map.reset_trail_styles();
        assert_eq!(map.trail_style(7), Some(TrailStyle::Default));
        assert_eq!(map.trail_style(99), None);
    }

    #[test]
    fn issue_markers_use_category_icon() {
        let mut map = map_with_trail();
        map.add_issue(IssueReport::new(
            LatLng::new(39.95, -75.16),
            &TrailRef {
                id: 7,
                label: String::new(),
            },
            IssueCategory::Flooding,
            chrono::Utc.with_ymd_and_hms(2022, 3, 10, 0, 0, 0).unwrap(),
            String::new(),
        ));
        assert_eq!(map.issues()[0].icon, IssueCategory::Flooding.icon());
    }

    #[test]
    fn neighbor_group_holds_one_marker() {
        let mut map = map_with_trail();
        map.show_neighbor_marker(LatLng::new(39.92, -75.16));
        map.show_neighbor_marker(LatLng::new(39.93, -75.17));
        assert_eq!(map.neighbor_markers(), &[LatLng::new(39.93, -75.17)]);
        map.clear_neighbor_markers();
        assert!(map.neighbor_markers().is_empty());
    }

    #[test]
    fn invalidate_size_shifts_center_only_on_change() {
        let mut map = map_with_trail();
        let start = map.center();
        map.invalidate_size();
        assert_eq!(map.center(), start);

        map.set_report_panel_open(true);
        assert_eq!(map.center(), start);
        map.invalidate_size();
        assert!(map.center().lng < start.lng);
        assert_eq!(map.viewport().0, 1280 - 360);
    }
}
