//! Telemetry and feedback signals derived from each cycle's estimates.
//!
//! Everything here is a pure function of the estimator output and the task
//! state, except the destination cue's bobbing phase, which advances once
//! per cycle.

use std::f64::consts::TAU;
use std::time::Duration;

use fixture_types::{Point3, Rgb, TaskConfig, TaskState, TaskTelemetryRecord, ToolRole, Vector3};

use crate::estimator::ToolEstimate;
use crate::state_machine::TaskStateMachine;

/// Cycles per full bob of the destination marker.
pub const CUE_PERIOD_CYCLES: u32 = 90;

/// Resting height of the destination marker above its waypoint.
pub const CUE_BASE_HEIGHT: f64 = 0.005;

/// Bob amplitude of the destination marker.
pub const CUE_AMPLITUDE: f64 = 0.003;

/// Error severity in `[0, 1]`: `min(1, error / max_error)`.
#[must_use]
pub fn severity_ratio(position_error: f64, max_error: f64) -> f64 {
    (position_error / max_error).clamp(0.0, 1.0)
}

/// Inter-ring distance error in `[0, 1]`:
/// `min(1, 3·|actual − ideal| / ideal)`.
#[must_use]
pub fn distance_error_ratio(actual: f64, ideal: f64) -> f64 {
    (3.0 * (actual - ideal).abs() / ideal).min(1.0)
}

/// Green at zero severity, red at full severity.
#[must_use]
pub fn error_color(ratio: f64) -> Rgb {
    Rgb::new(ratio, 1.0 - ratio, 0.1)
}

/// Light grey at zero distance error, red at full error.
#[must_use]
pub fn connector_color(ratio: f64) -> Rgb {
    let gb = 0.9 - 0.7 * ratio;
    Rgb::new(0.9, gb, gb)
}

/// Marker showing the operator where to go next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationCue {
    /// Waypoint the current state is heading for.
    pub waypoint: Point3<f64>,
    /// Waypoint raised by the bobbing offset.
    pub marker_position: Point3<f64>,
    /// Green while waiting, deep pink during timed legs.
    pub color: Rgb,
}

/// Per-tool error feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolFeedback {
    /// Which tool.
    pub role: ToolRole,
    /// Severity in `[0, 1]`.
    pub severity: f64,
    /// Color for the ring.
    pub color: Rgb,
}

/// Coordination feedback between the two rings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSpacing {
    /// Distance between the two ring centers.
    pub distance: f64,
    /// Distance error ratio in `[0, 1]`.
    pub ratio: f64,
    /// Color for the line joining the rings.
    pub color: Rgb,
}

/// Every feedback signal of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSignals {
    /// One entry per estimated tool, primary first.
    pub tools: Vec<ToolFeedback>,
    /// Present only when both tools were estimated.
    pub spacing: Option<RingSpacing>,
    /// Destination marker.
    pub cue: DestinationCue,
}

impl FeedbackSignals {
    /// Feedback for one tool, if it was estimated this cycle.
    #[must_use]
    pub fn tool(&self, role: ToolRole) -> Option<&ToolFeedback> {
        self.tools.iter().find(|t| t.role == role)
    }
}

/// Builds the telemetry record and feedback signals once per cycle.
#[derive(Debug, Clone)]
pub struct TelemetryAggregator {
    task_name: String,
    max_error: f64,
    ideal_ring_distance: f64,
    cue_phase: u32,
}

impl TelemetryAggregator {
    /// Create an aggregator from a (validated) configuration.
    #[must_use]
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            task_name: config.task_name.clone(),
            max_error: config.max_error,
            ideal_ring_distance: config.ideal_ring_distance,
            cue_phase: 0,
        }
    }

    /// Destination cue for `state`, advancing the bob phase by one cycle.
    pub fn next_cue(&mut self, machine: &TaskStateMachine) -> DestinationCue {
        let waypoints = machine.waypoints();
        let (waypoint, color) = match machine.state() {
            TaskState::Idle => (waypoints.start, Rgb::GREEN),
            TaskState::ToEndPoint => (waypoints.end, Rgb::DEEP_PINK),
            TaskState::ToStartPoint => (waypoints.start, Rgb::DEEP_PINK),
            TaskState::RepetitionComplete => (waypoints.idle, Rgb::GREEN),
        };

        let phase = TAU * f64::from(self.cue_phase) / f64::from(CUE_PERIOD_CYCLES);
        let dz = CUE_BASE_HEIGHT + CUE_AMPLITUDE * phase.sin();
        self.cue_phase = (self.cue_phase + 1) % CUE_PERIOD_CYCLES;

        DestinationCue {
            waypoint,
            marker_position: waypoint + Vector3::new(0.0, 0.0, dz),
            color,
        }
    }

    /// Produce this cycle's outward record and feedback signals.
    ///
    /// Must run after the state machine update of the same cycle.
    pub fn aggregate(
        &mut self,
        machine: &TaskStateMachine,
        estimates: &[ToolEstimate],
        now: Duration,
    ) -> (TaskTelemetryRecord, FeedbackSignals) {
        let state = machine.state();
        let timed = state.is_timed();
        let error_of = |role: ToolRole| {
            estimates
                .iter()
                .find(|e| e.role == role)
                .filter(|_| timed)
                .map_or(0.0, |e| e.position_error)
        };

        let record = TaskTelemetryRecord {
            task_name: self.task_name.clone(),
            task_state: state,
            repetition_count: machine.repetition_count(),
            elapsed_seconds: machine.elapsed_seconds(now),
            error_field_1: error_of(ToolRole::Primary),
            error_field_2: error_of(ToolRole::Secondary),
        };

        let tools = estimates
            .iter()
            .map(|e| {
                let severity = severity_ratio(e.position_error, self.max_error);
                ToolFeedback {
                    role: e.role,
                    severity,
                    color: error_color(severity),
                }
            })
            .collect();

        let centers = |role: ToolRole| estimates.iter().find(|e| e.role == role).map(|e| e.ring_center);
        let spacing = centers(ToolRole::Primary)
            .zip(centers(ToolRole::Secondary))
            .map(|(a, b)| {
                let distance = (a - b).norm();
                let ratio = distance_error_ratio(distance, self.ideal_ring_distance);
                RingSpacing {
                    distance,
                    ratio,
                    color: connector_color(ratio),
                }
            });

        let feedback = FeedbackSignals {
            tools,
            spacing,
            cue: self.next_cue(machine),
        };

        (record, feedback)
    }
}
