//! One guidance session: estimator, state machine and telemetry stepped in
//! lockstep over a static guide.

use std::time::Duration;

use fixture_types::{
    ActiveConstraintParameters, FixtureError, Pose, Result, TaskCommand, TaskConfig,
    TaskTelemetryRecord, ToolRole,
};
use guide_query::NearestPointQuery;
use tracing::info;

use crate::estimator::{DesiredPoseEstimator, ToolEstimate};
use crate::feedback::{FeedbackSignals, TelemetryAggregator};
use crate::state_machine::{TaskEvent, TaskSnapshot, TaskStateMachine};

/// Live tool poses for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolPoses {
    /// Primary tool; drives the task state.
    pub primary: Pose,
    /// Secondary tool, required when the task is bimanual.
    pub secondary: Option<Pose>,
}

impl ToolPoses {
    /// Poses for a single-handed task.
    #[must_use]
    pub fn single(primary: Pose) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Poses for a bimanual task.
    #[must_use]
    pub fn bimanual(primary: Pose, secondary: Pose) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }
}

/// Everything produced by one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Per-tool estimates, primary first.
    pub estimates: Vec<ToolEstimate>,
    /// Outward telemetry record.
    pub telemetry: TaskTelemetryRecord,
    /// Rendering feedback.
    pub feedback: FeedbackSignals,
    /// New constraint parameters, when they changed this cycle.
    pub constraint_update: Option<ActiveConstraintParameters>,
    /// State machine event, if a rule fired.
    pub event: Option<TaskEvent>,
}

impl CycleReport {
    /// Estimate for one tool.
    #[must_use]
    pub fn estimate(&self, role: ToolRole) -> Option<&ToolEstimate> {
        self.estimates.iter().find(|e| e.role == role)
    }

    /// Desired pose for one tool.
    #[must_use]
    pub fn desired_pose(&self, role: ToolRole) -> Option<Pose> {
        self.estimate(role).map(|e| e.desired)
    }
}

/// A buzz-wire task session over guide `G`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fixture_core::{BuzzWireSession, ToolPoses};
/// use fixture_types::{Pose, TaskConfig, TaskState};
/// use guide_query::PolylineGuide;
/// use nalgebra::Point3;
///
/// let config = TaskConfig::default();
/// let wire = PolylineGuide::try_new(vec![
///     config.waypoints.start,
///     config.waypoints.end,
/// ])
/// .unwrap();
/// let mut session = BuzzWireSession::new(config, wire).unwrap();
///
/// let poses = ToolPoses::single(Pose::from_position(Point3::new(0.0, 0.0, 0.1)));
/// let report = session.step(&poses, Duration::ZERO).unwrap();
/// assert_eq!(report.telemetry.task_state, TaskState::Idle);
/// ```
#[derive(Debug)]
pub struct BuzzWireSession<G> {
    config: TaskConfig,
    guide: G,
    estimator: DesiredPoseEstimator,
    machine: TaskStateMachine,
    telemetry: TelemetryAggregator,
}

impl<G: NearestPointQuery> BuzzWireSession<G> {
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn new(config: TaskConfig, guide: G) -> Result<Self> {
        config.validate()?;
        let estimator = DesiredPoseEstimator::from_config(&config)?;
        let machine = TaskStateMachine::from_config(&config)?;
        let telemetry = TelemetryAggregator::new(&config);
        info!(
            task = %config.task_name,
            ring_radius = config.ring_radius,
            bimanual = config.bimanual,
            "guidance session created"
        );
        Ok(Self {
            config,
            guide,
            estimator,
            machine,
            telemetry,
        })
    }

    /// Run one cycle: estimation, state transition, then telemetry.
    ///
    /// `now` is the time since the session started. A secondary pose is
    /// ignored in single-handed tasks.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::MissingTool`] if the task is bimanual and no
    /// secondary pose was supplied.
    pub fn step(&mut self, poses: &ToolPoses, now: Duration) -> Result<CycleReport> {
        let secondary = match (self.config.bimanual, poses.secondary) {
            (true, None) => return Err(FixtureError::MissingTool { role: ToolRole::Secondary }),
            (true, Some(pose)) => Some(pose),
            (false, _) => None,
        };

        let primary = self
            .estimator
            .estimate(&self.guide, &poses.primary, ToolRole::Primary);
        let mut estimates = vec![primary];
        if let Some(pose) = secondary {
            estimates.push(
                self.estimator
                    .estimate(&self.guide, &pose, ToolRole::Secondary),
            );
        }

        let event = self
            .machine
            .update(&primary.ring_center, primary.position_error, now);
        let constraint_update = self.machine.take_constraint_update();
        let (telemetry, feedback) = self.telemetry.aggregate(&self.machine, &estimates, now);

        Ok(CycleReport {
            estimates,
            telemetry,
            feedback,
            constraint_update,
            event,
        })
    }

    /// Apply an operator command to the task.
    pub fn apply(&mut self, command: TaskCommand) {
        self.machine.apply(command);
    }

    /// Copy of the task state.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        self.machine.snapshot()
    }

    /// The guide being followed.
    #[must_use]
    pub fn guide(&self) -> &G {
        &self.guide
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fixture_types::{Point3, TaskState};
    use guide_query::PolylineGuide;

    fn wire(config: &TaskConfig) -> PolylineGuide {
        PolylineGuide::try_new(vec![config.waypoints.start, config.waypoints.end]).unwrap()
    }

    fn far_pose() -> Pose {
        Pose::from_position(Point3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TaskConfig::with_ring_radius(-0.001);
        let err = BuzzWireSession::new(config.clone(), wire(&TaskConfig::default())).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_first_cycle_publishes_constraint() {
        let config = TaskConfig::default();
        let mut session = BuzzWireSession::new(config.clone(), wire(&config)).unwrap();

        let report = session.step(&ToolPoses::single(far_pose()), Duration::ZERO).unwrap();
        assert!(!report.constraint_update.unwrap().active);
        assert!(report.event.is_none());
        assert_eq!(report.estimates.len(), 1);

        let report = session.step(&ToolPoses::single(far_pose()), Duration::ZERO).unwrap();
        assert!(report.constraint_update.is_none());
    }

    #[test]
    fn test_bimanual_requires_secondary() {
        let config = TaskConfig::default().bimanual();
        let mut session = BuzzWireSession::new(config.clone(), wire(&config)).unwrap();

        let err = session
            .step(&ToolPoses::single(far_pose()), Duration::ZERO)
            .unwrap_err();
        assert!(err.is_missing_tool());

        let report = session
            .step(&ToolPoses::bimanual(far_pose(), far_pose()), Duration::ZERO)
            .unwrap();
        assert_eq!(report.estimates.len(), 2);
        assert!(report.desired_pose(ToolRole::Secondary).is_some());
        assert!(report.feedback.spacing.is_some());
    }

    #[test]
    fn test_single_handed_ignores_secondary() {
        let config = TaskConfig::default();
        let mut session = BuzzWireSession::new(config.clone(), wire(&config)).unwrap();

        let report = session
            .step(&ToolPoses::bimanual(far_pose(), far_pose()), Duration::ZERO)
            .unwrap();
        assert_eq!(report.estimates.len(), 1);
        assert!(report.desired_pose(ToolRole::Secondary).is_none());
    }

    #[test]
    fn test_commands_reach_state_machine() {
        let config = TaskConfig::default();
        let mut session = BuzzWireSession::new(config.clone(), wire(&config)).unwrap();

        session.apply(TaskCommand::Reset);
        let snap = session.snapshot();
        assert_eq!(snap.state, TaskState::RepetitionComplete);
        assert_eq!(snap.repetition_count, 0);
        assert_eq!(session.config().task_name, "BuzzWire");
        assert_eq!(session.guide().num_segments(), 1);
    }
}
