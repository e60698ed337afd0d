#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trail issue reporting wizard.
//!
//! ```text
//! Closed --open--> SelectTrail --continue--> SelectPoint --continue--> EnterDetails
//!   ^                                                                       |
//!   +------------------------- submit / cancel (any open step) -------------+
//! ```
//!
//! Each transition first tears the previous step down (listener detached,
//! trail styles reset, report marker removed) and only then sets the next
//! one up. Transitions run inside [`preserve_center`] because showing and
//! hiding the panel resizes the map.

pub mod details;
pub mod state;

use thiserror::Error;
use trail_map_api::{ApiError, IssueStore};
use trail_map_map::{ListenerKind, MapEvent, MapView, Prompt, TrailStyle, preserve_center};
use trail_map_spatial::snap_to_trail;
use trail_map_trail_models::IssueReport;

pub use details::{IssueDetails, parse_encountered_at};
pub use state::{Controls, WizardState, WizardStep};

/// Confirmation asked before abandoning a report.
pub const CANCEL_CONFIRMATION: &str = "You really want to cancel this issue?";

/// Errors from wizard operations.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// "Continue" was used before a trail was selected.
    #[error("Select a trail before continuing")]
    TrailNotSelected,

    /// "Continue" was used before a point was placed.
    #[error("Select a point on the trail before continuing")]
    PointNotSelected,

    /// The operation is not available at the current step.
    #[error("Cannot {action} at the {step} step")]
    WrongStep {
        /// What was attempted.
        action: &'static str,
        /// Where the wizard was.
        step: WizardStep,
    },

    /// An event referenced a trail that is not on the map.
    #[error("Trail #{id} is not on the map")]
    UnknownTrail {
        /// The trail id.
        id: i64,
    },

    /// The encounter time could not be parsed.
    #[error("Invalid encounter time \"{value}\"")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
    },

    /// The issue API rejected or failed the submission.
    #[error("Failed to submit issue: {0}")]
    Submit(#[from] ApiError),
}

/// Drives the report panel and its map interactions.
#[derive(Debug, Default)]
pub struct IssueReporter {
    state: WizardState,
}

impl IssueReporter {
    /// Creates a closed reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: WizardState::Closed,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WizardState {
        &self.state
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.state.step()
    }

    /// Whether the panel is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.state, WizardState::Closed)
    }

    /// Which controls are usable in the current state.
    #[must_use]
    pub fn controls(&self) -> Controls {
        Controls::from(&self.state)
    }

    /// Opens the panel at the trail step, discarding any report in
    /// progress.
    pub fn open<M: MapView + ?Sized>(&mut self, map: &mut M) {
        preserve_center(map, |map| {
            self.teardown(map);
            log::info!("Opening the issue reporter at the select-trail step");

            map.set_all_trail_styles(TrailStyle::Unselected);
            let listener = map.listeners().attach(ListenerKind::TrailClick);
            self.state = WizardState::SelectTrail {
                selected: None,
                listener,
            };
            map.set_report_panel_open(true);
        });
    }

    /// Applies a map interaction to the current step.
    ///
    /// Returns whether the event changed anything. Events the current step
    /// does not listen for are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::UnknownTrail`] if the event or the selected
    /// trail refers to a trail that is not on the map.
    pub fn handle_event<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        event: MapEvent,
    ) -> Result<bool, ReporterError> {
        match (&mut self.state, event) {
            (WizardState::SelectTrail { selected, .. }, MapEvent::TrailClicked(id)) => {
                let trail = map
                    .trail(id)
                    .ok_or(ReporterError::UnknownTrail { id })?
                    .trail
                    .clone();

                map.set_all_trail_styles(TrailStyle::Unselected);
                map.set_trail_style(id, TrailStyle::Selected);
                log::debug!("Selected {trail}");
                *selected = Some(trail);
                Ok(true)
            }
            (WizardState::SelectPoint { trail, point, .. }, MapEvent::MapClicked(click)) => {
                let feature = map
                    .trail(trail.id)
                    .ok_or(ReporterError::UnknownTrail { id: trail.id })?;

                let Some(snapped) = snap_to_trail(feature, click) else {
                    log::warn!("{trail} has no geometry to place a point on");
                    return Ok(false);
                };

                map.set_report_marker(Some(snapped.point));
                log::debug!(
                    "Placed report marker at {} ({:.1} m from click)",
                    snapped.point,
                    snapped.distance_m
                );
                *point = Some(snapped.point);
                Ok(true)
            }
            (state, event) => {
                log::trace!("Ignoring {event:?} at the {} step", state.step());
                Ok(false)
            }
        }
    }

    /// Moves from the trail step to the point step.
    ///
    /// # Errors
    ///
    /// * [`ReporterError::TrailNotSelected`] if no trail was clicked
    /// * [`ReporterError::WrongStep`] outside the trail step
    pub fn continue_to_point<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
    ) -> Result<(), ReporterError> {
        let trail = match &self.state {
            WizardState::SelectTrail {
                selected: Some(trail),
                ..
            } => trail.clone(),
            WizardState::SelectTrail { selected: None, .. } => {
                return Err(ReporterError::TrailNotSelected);
            }
            other => {
                return Err(ReporterError::WrongStep {
                    action: "continue to point selection",
                    step: other.step(),
                });
            }
        };

        preserve_center(map, |map| {
            self.teardown(map);
            log::info!("Showing the select-point step for {trail}");

            map.set_trail_style(trail.id, TrailStyle::Selected);
            let listener = map.listeners().attach(ListenerKind::MapClick);
            self.state = WizardState::SelectPoint {
                trail,
                point: None,
                listener,
            };
        });

        Ok(())
    }

    /// Moves from the point step to the details step.
    ///
    /// # Errors
    ///
    /// * [`ReporterError::PointNotSelected`] if no point was placed
    /// * [`ReporterError::WrongStep`] outside the point step
    pub fn continue_to_details<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
    ) -> Result<(), ReporterError> {
        let (trail, point) = match &self.state {
            WizardState::SelectPoint {
                trail,
                point: Some(point),
                ..
            } => (trail.clone(), *point),
            WizardState::SelectPoint { point: None, .. } => {
                return Err(ReporterError::PointNotSelected);
            }
            other => {
                return Err(ReporterError::WrongStep {
                    action: "continue to details",
                    step: other.step(),
                });
            }
        };

        preserve_center(map, |map| {
            self.teardown(map);
            log::info!("Showing the details step for {trail} at {point}");

            map.set_trail_style(trail.id, TrailStyle::Selected);
            map.set_report_marker(Some(point));
            self.state = WizardState::EnterDetails { trail, point };
        });

        Ok(())
    }

    /// Submits the report and closes the panel.
    ///
    /// The panel closes before the request completes and stays closed if it
    /// fails; the report is not retried. On success the stored record is
    /// added to the issue overlay and returned.
    ///
    /// # Errors
    ///
    /// * [`ReporterError::WrongStep`] outside the details step
    /// * [`ReporterError::Submit`] if the issue API call fails
    pub async fn submit<M, S>(
        &mut self,
        map: &mut M,
        store: &S,
        details: IssueDetails,
    ) -> Result<IssueReport, ReporterError>
    where
        M: MapView + ?Sized,
        S: IssueStore + ?Sized,
    {
        let WizardState::EnterDetails { trail, point } = &self.state else {
            return Err(ReporterError::WrongStep {
                action: "submit",
                step: self.step(),
            });
        };

        let location = map.report_marker().unwrap_or(*point);
        let report = IssueReport::new(
            location,
            trail,
            details.category,
            details.encountered_at,
            details.details,
        );

        preserve_center(map, |map| self.close(map));

        match store.create_issue(&report).await {
            Ok(stored) => {
                log::info!(
                    "Stored {} issue {:?} on {}",
                    stored.properties.category,
                    stored.id,
                    stored.trail()
                );
                map.add_issue(stored.clone());
                Ok(stored)
            }
            Err(e) => {
                log::error!("Issue submission failed, report discarded: {e}");
                Err(ReporterError::Submit(e))
            }
        }
    }

    /// Asks for confirmation and, if given, abandons the report and closes
    /// the panel. Returns whether the report was abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::WrongStep`] if the panel is already closed.
    pub fn cancel<M, P>(&mut self, map: &mut M, prompt: &P) -> Result<bool, ReporterError>
    where
        M: MapView + ?Sized,
        P: Prompt + ?Sized,
    {
        if !self.is_open() {
            return Err(ReporterError::WrongStep {
                action: "cancel",
                step: WizardStep::Closed,
            });
        }

        Ok(preserve_center(map, |map| {
            if prompt.confirm(CANCEL_CONFIRMATION) {
                log::info!("Issue report cancelled at the {} step", self.step());
                self.close(map);
                true
            } else {
                false
            }
        }))
    }

    fn close<M: MapView + ?Sized>(&mut self, map: &mut M) {
        log::info!("Closing the issue reporter");
        self.teardown(map);
        map.set_report_panel_open(false);
    }

    /// Leaves the current step: its listener is dropped, trail styles go
    /// back to the overlay default, and the report marker is removed.
    fn teardown<M: MapView + ?Sized>(&mut self, map: &mut M) {
        drop(std::mem::take(&mut self.state));
        map.reset_trail_styles();
        map.set_report_marker(None);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Mutex;

    use chrono::TimeZone as _;
    use trail_map_config::AppConfig;
    use trail_map_map::HeadlessMap;
    use trail_map_trail_models::{IssueCategory, LatLng, TrailFeature, TrailRef};

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        fail: bool,
        submitted: Mutex<Vec<IssueReport>>,
    }

    impl FakeStore {
        fn submitted(&self) -> Vec<IssueReport> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl IssueStore for FakeStore {
        async fn list_issues(&self) -> Result<Vec<IssueReport>, ApiError> {
            Ok(Vec::new())
        }

        async fn create_issue(&self, report: &IssueReport) -> Result<IssueReport, ApiError> {
            self.submitted.lock().unwrap().push(report.clone());
            if self.fail {
                return Err(ApiError::Status {
                    url: "trail_issues".to_string(),
                    status: 500,
                });
            }
            let mut stored = report.clone();
            stored.id = Some("17".to_string());
            Ok(stored)
        }
    }

    struct ScriptedPrompt {
        answer: bool,
        asked: RefCell<Vec<String>>,
    }

    impl ScriptedPrompt {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn alert(&self, message: &str) {
            self.asked.borrow_mut().push(message.to_string());
        }

        fn confirm(&self, message: &str) -> bool {
            self.asked.borrow_mut().push(message.to_string());
            self.answer
        }
    }

    fn horizontal_trail(id: i64, label: &str, lat: f64) -> TrailFeature {
        TrailFeature {
            trail: TrailRef {
                id,
                label: label.to_string(),
            },
            geometry: geo::MultiLineString::new(vec![geo::LineString::from(vec![
                (-75.17, lat),
                (-75.15, lat),
            ])]),
        }
    }

    fn map() -> HeadlessMap {
        let mut map = HeadlessMap::from_config(&AppConfig::defaults().map);
        map.add_trails(vec![
            horizontal_trail(1, "Wissahickon", 39.95),
            horizontal_trail(2, "Schuylkill River Trail", 39.96),
        ]);
        map
    }

    fn click(reporter: &mut IssueReporter, map: &mut HeadlessMap, at: LatLng) {
        for event in map.click(at) {
            reporter.handle_event(map, event).unwrap();
        }
    }

    fn details() -> IssueDetails {
        IssueDetails {
            category: IssueCategory::Obstruction,
            encountered_at: chrono::Utc.with_ymd_and_hms(2022, 3, 10, 14, 30, 0).unwrap(),
            details: "Fallen tree".to_string(),
        }
    }

    const ON_TRAIL_1: LatLng = LatLng::new(39.950_05, -75.16);

    /// Walks a fresh reporter to `step` on trail 1, with the trail selected
    /// and the point placed wherever the step allows it.
    fn at_step(map: &mut HeadlessMap, step: WizardStep) -> IssueReporter {
        let mut reporter = IssueReporter::new();
        reporter.open(map);
        click(&mut reporter, map, ON_TRAIL_1);
        if step == WizardStep::SelectTrail {
            return reporter;
        }
        reporter.continue_to_point(map).unwrap();
        click(&mut reporter, map, ON_TRAIL_1);
        if step == WizardStep::SelectPoint {
            return reporter;
        }
        reporter.continue_to_details(map).unwrap();
        reporter
    }

    fn at_details(map: &mut HeadlessMap) -> IssueReporter {
        at_step(map, WizardStep::EnterDetails)
    }

    fn assert_closed(reporter: &IssueReporter, map: &HeadlessMap) {
        assert_eq!(reporter.step(), WizardStep::Closed);
        assert_eq!(
            reporter.controls(),
            Controls {
                report_issue: true,
                ..Controls::default()
            }
        );
        assert!(reporter.state().trail().is_none());
        assert!(map.report_marker().is_none());
        assert!(map.listeners().is_empty());
        assert!(!map.report_panel_open());
        assert!(
            map.trail_ids()
                .into_iter()
                .all(|id| map.trail_style(id) == Some(TrailStyle::Default))
        );
    }

    #[test]
    fn open_styles_trails_and_listens_for_trail_clicks() {
        let mut map = map();
        let center = map.center();
        let mut reporter = IssueReporter::new();
        assert!(reporter.controls().report_issue);

        reporter.open(&mut map);

        assert_eq!(reporter.step(), WizardStep::SelectTrail);
        assert_eq!(map.trail_style(1), Some(TrailStyle::Unselected));
        assert_eq!(map.trail_style(2), Some(TrailStyle::Unselected));
        assert_eq!(map.listeners().active(), vec![ListenerKind::TrailClick]);
        assert!(map.report_panel_open());
        assert!(!reporter.controls().select_trail_continue);
        assert_eq!(map.center(), center);
    }

    #[test]
    fn trail_click_selects_exactly_one_trail() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);

        click(&mut reporter, &mut map, LatLng::new(39.96, -75.16));
        click(&mut reporter, &mut map, ON_TRAIL_1);

        assert_eq!(map.trail_style(1), Some(TrailStyle::Selected));
        assert_eq!(map.trail_style(2), Some(TrailStyle::Unselected));
        assert_eq!(reporter.state().trail().map(|t| t.id), Some(1));
        assert!(reporter.controls().select_trail_continue);
    }

    #[test]
    fn continue_requires_a_selected_trail() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);

        assert!(matches!(
            reporter.continue_to_point(&mut map),
            Err(ReporterError::TrailNotSelected)
        ));
        assert_eq!(reporter.step(), WizardStep::SelectTrail);
        assert_eq!(map.listeners().count(ListenerKind::TrailClick), 1);
    }

    #[test]
    fn point_step_swaps_listeners_and_highlights_trail() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);
        click(&mut reporter, &mut map, ON_TRAIL_1);

        reporter.continue_to_point(&mut map).unwrap();

        assert_eq!(reporter.step(), WizardStep::SelectPoint);
        assert_eq!(map.listeners().active(), vec![ListenerKind::MapClick]);
        assert_eq!(map.trail_style(1), Some(TrailStyle::Selected));
        assert_eq!(map.trail_style(2), Some(TrailStyle::Default));
        assert!(!reporter.controls().select_point_continue);
    }

    #[test]
    fn map_clicks_snap_to_the_selected_trail() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);
        click(&mut reporter, &mut map, ON_TRAIL_1);
        reporter.continue_to_point(&mut map).unwrap();

        // closer to trail 2, but only trail 1 is selectable now
        click(&mut reporter, &mut map, LatLng::new(39.958, -75.155));
        let first = map.report_marker().unwrap();
        assert!((first.lat - 39.95).abs() < 1e-7);
        assert!((first.lng - -75.155).abs() < 1e-7);

        click(&mut reporter, &mut map, LatLng::new(39.949, -75.165));
        let second = map.report_marker().unwrap();
        assert!((second.lng - -75.165).abs() < 1e-7);
        assert_eq!(reporter.state().point(), Some(second));
        assert!(reporter.controls().select_point_continue);
    }

    #[test]
    fn details_step_requires_a_point() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);
        click(&mut reporter, &mut map, ON_TRAIL_1);
        reporter.continue_to_point(&mut map).unwrap();

        assert!(matches!(
            reporter.continue_to_details(&mut map),
            Err(ReporterError::PointNotSelected)
        ));
    }

    #[test]
    fn details_step_detaches_every_listener() {
        let mut map = map();
        let reporter = at_details(&mut map);

        assert_eq!(reporter.step(), WizardStep::EnterDetails);
        assert!(map.listeners().is_empty());
        assert!(map.report_marker().is_some());
        assert_eq!(map.trail_style(1), Some(TrailStyle::Selected));
        assert!(map.click(ON_TRAIL_1).is_empty());
    }

    #[test]
    fn events_outside_their_step_are_ignored() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);

        let handled = reporter
            .handle_event(&mut map, MapEvent::MapClicked(ON_TRAIL_1))
            .unwrap();
        assert!(!handled);
        assert!(map.report_marker().is_none());

        assert!(matches!(
            reporter.handle_event(&mut map, MapEvent::TrailClicked(99)),
            Err(ReporterError::UnknownTrail { id: 99 })
        ));
    }

    #[tokio::test]
    async fn submit_posts_report_and_resets() {
        let mut map = map();
        let center = map.center();
        let mut reporter = at_details(&mut map);
        let marker = map.report_marker().unwrap();
        let store = FakeStore::default();

        let stored = reporter.submit(&mut map, &store, details()).await.unwrap();

        let sent = store.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].location, marker);
        assert_eq!(sent[0].properties.trail_id, 1);
        assert_eq!(sent[0].properties.trail_label, "Wissahickon");
        assert_eq!(sent[0].properties.details, "Fallen tree");
        assert_eq!(stored.id.as_deref(), Some("17"));

        assert_eq!(map.issues().len(), 1);
        assert_closed(&reporter, &map);
        assert_eq!(map.center(), center);
    }

    #[tokio::test]
    async fn failed_submit_still_closes() {
        let mut map = map();
        let mut reporter = at_details(&mut map);
        let store = FakeStore {
            fail: true,
            ..FakeStore::default()
        };

        let result = reporter.submit(&mut map, &store, details()).await;

        assert!(matches!(result, Err(ReporterError::Submit(_))));
        assert_eq!(store.submitted().len(), 1);
        assert!(map.issues().is_empty());
        assert_closed(&reporter, &map);
    }

    #[tokio::test]
    async fn submit_only_from_details_step() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        reporter.open(&mut map);
        let store = FakeStore::default();

        let result = reporter.submit(&mut map, &store, details()).await;

        assert!(matches!(
            result,
            Err(ReporterError::WrongStep {
                step: WizardStep::SelectTrail,
                ..
            })
        ));
        assert!(store.submitted().is_empty());
    }

    #[test]
    fn declined_cancel_keeps_the_report() {
        let mut map = map();
        let mut reporter = at_details(&mut map);
        let prompt = ScriptedPrompt::answering(false);

        assert!(!reporter.cancel(&mut map, &prompt).unwrap());

        assert_eq!(prompt.asked.borrow().as_slice(), &[CANCEL_CONFIRMATION]);
        assert_eq!(reporter.step(), WizardStep::EnterDetails);
        assert!(map.report_marker().is_some());
    }

    #[test]
    fn confirmed_cancel_resets_from_any_step() {
        for step in [
            WizardStep::SelectTrail,
            WizardStep::SelectPoint,
            WizardStep::EnterDetails,
        ] {
            let mut map = map();
            let mut reporter = at_step(&mut map, step);
            assert_eq!(reporter.step(), step);
            assert!(reporter.state().trail().is_some(), "{step}");
            let center = map.center();

            assert!(
                reporter
                    .cancel(&mut map, &ScriptedPrompt::answering(true))
                    .unwrap(),
                "{step}"
            );

            assert_closed(&reporter, &map);
            assert_eq!(map.center(), center, "{step}");
        }
    }

    #[test]
    fn cancel_needs_an_open_report() {
        let mut map = map();
        let mut reporter = IssueReporter::new();
        let prompt = ScriptedPrompt::answering(true);

        assert!(matches!(
            reporter.cancel(&mut map, &prompt),
            Err(ReporterError::WrongStep { .. })
        ));
        assert!(prompt.asked.borrow().is_empty());
        assert_closed(&reporter, &map);
    }

    #[test]
    fn reopening_starts_a_fresh_report() {
        let mut map = map();
        let mut reporter = at_details(&mut map);

        reporter.open(&mut map);

        assert_eq!(reporter.step(), WizardStep::SelectTrail);
        assert!(reporter.state().trail().is_none());
        assert!(map.report_marker().is_none());
        assert_eq!(map.listeners().active(), vec![ListenerKind::TrailClick]);
    }
}
