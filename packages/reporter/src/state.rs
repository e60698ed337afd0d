//! Wizard states.

use strum_macros::{AsRefStr, Display};
use trail_map_map::ListenerGuard;
use trail_map_trail_models::{LatLng, TrailRef};

/// The wizard's current step together with the data that step has
/// collected so far.
///
/// Listener guards live inside the step that needs them, so leaving a step
/// detaches its click handler.
#[derive(Debug, Default)]
pub enum WizardState {
    /// The report panel is hidden.
    #[default]
    Closed,
    /// Choosing a trail by clicking it.
    SelectTrail {
        /// The trail clicked last, if any.
        selected: Option<TrailRef>,
        /// Trail-click listener.
        listener: ListenerGuard,
    },
    /// Choosing the issue location by clicking near the trail.
    SelectPoint {
        /// The chosen trail.
        trail: TrailRef,
        /// The click snapped onto the trail, if any.
        point: Option<LatLng>,
        /// Map-click listener.
        listener: ListenerGuard,
    },
    /// Entering category, time and description.
    EnterDetails {
        /// The chosen trail.
        trail: TrailRef,
        /// The issue location on the trail.
        point: LatLng,
    },
}

impl WizardState {
    /// The step without its data.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::Closed => WizardStep::Closed,
            Self::SelectTrail { .. } => WizardStep::SelectTrail,
            Self::SelectPoint { .. } => WizardStep::SelectPoint,
            Self::EnterDetails { .. } => WizardStep::EnterDetails,
        }
    }

    /// The trail chosen so far.
    #[must_use]
    pub const fn trail(&self) -> Option<&TrailRef> {
        match self {
            Self::Closed | Self::SelectTrail { selected: None, .. } => None,
            Self::SelectTrail {
                selected: Some(trail),
                ..
            }
            | Self::SelectPoint { trail, .. }
            | Self::EnterDetails { trail, .. } => Some(trail),
        }
    }

    /// The issue location chosen so far.
    #[must_use]
    pub const fn point(&self) -> Option<LatLng> {
        match self {
            Self::SelectPoint { point, .. } => *point,
            Self::EnterDetails { point, .. } => Some(*point),
            Self::Closed | Self::SelectTrail { .. } => None,
        }
    }
}

/// Wizard step names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum WizardStep {
    /// Panel hidden.
    Closed,
    /// Trail selection.
    SelectTrail,
    /// Point selection.
    SelectPoint,
    /// Details entry.
    EnterDetails,
}

/// Which panel controls are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    /// The "report an issue" button, shown while the panel is closed.
    pub report_issue: bool,
    /// "Continue" on the trail step, enabled once a trail is selected.
    pub select_trail_continue: bool,
    /// "Continue" on the point step, enabled once a point is placed.
    pub select_point_continue: bool,
    /// "Submit" on the details step.
    pub submit: bool,
}

impl From<&WizardState> for Controls {
    fn from(state: &WizardState) -> Self {
        match state {
            WizardState::Closed => Self {
                report_issue: true,
                ..Self::default()
            },
            WizardState::SelectTrail { selected, .. } => Self {
                select_trail_continue: selected.is_some(),
                ..Self::default()
            },
            WizardState::SelectPoint { point, .. } => Self {
                select_point_continue: point.is_some(),
                ..Self::default()
            },
            WizardState::EnterDetails { .. } => Self {
                submit: true,
                ..Self::default()
            },
        }
    }
}
