//! Task progression for the buzz-wire exercise.
//!
//! ```text
//!            near start & guidance off
//!           ┌──────────────┐ (guidance on)
//!           ▼              │
//!         Idle ────────────┘
//!           │ error < settle & guidance on      (+1 repetition)
//!           ▼
//!      ToEndPoint ── near end ──► ToStartPoint   (+1 repetition)
//!                                     │ near start (guidance off)
//!                                     ▼
//!         Idle ◄── near idle ── RepetitionComplete
//! ```
//!
//! Guidance is switched on before the timed leg starts, and the leg only
//! starts once the tool has settled under the guidance force, so recorded
//! errors do not begin with the transient of the force engaging.
//!
//! At most one rule fires per cycle, checked in the order of the table
//! above.

use std::time::Duration;

use fixture_types::{
    ActiveConstraintParameters, FixtureError, Result, TaskCommand, TaskConfig, TaskState,
    Waypoints,
};
use nalgebra::Point3;
use tracing::{debug, info};

/// What happened during one state-machine update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// Guidance was switched on while idling at the start point.
    GuidanceEngaged,
    /// The task moved to a new state.
    Transitioned {
        /// Previous state.
        from: TaskState,
        /// New state.
        to: TaskState,
    },
}

/// Read-only copy of the state machine, safe to hand to other threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSnapshot {
    /// Current state.
    pub state: TaskState,
    /// Repetition counter.
    pub repetition_count: u32,
    /// Whether guidance is asserted.
    pub guidance_active: bool,
    /// When the current timed leg began.
    pub state_entered_at: Option<Duration>,
}

/// Finite-state machine driving the task from the primary ring position.
#[derive(Debug, Clone)]
pub struct TaskStateMachine {
    waypoints: Waypoints,
    tolerance: f64,
    settle_error: f64,
    state: TaskState,
    repetition_count: u32,
    state_entered_at: Option<Duration>,
    constraint: ActiveConstraintParameters,
    constraint_changed: bool,
}

impl TaskStateMachine {
    /// Create a state machine in [`TaskState::Idle`].
    ///
    /// The initial (inactive) constraint parameters are pending so the
    /// haptic controller receives them on the first cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfiguration`] for non-positive
    /// tolerances.
    pub fn new(
        waypoints: Waypoints,
        tolerance: f64,
        settle_error: f64,
        constraint: ActiveConstraintParameters,
    ) -> Result<Self> {
        for (name, value) in [("tolerance", tolerance), ("settle error", settle_error)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FixtureError::invalid_config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        Ok(Self {
            waypoints,
            tolerance,
            settle_error,
            state: TaskState::Idle,
            repetition_count: 0,
            state_entered_at: None,
            constraint: ActiveConstraintParameters {
                active: false,
                ..constraint
            },
            constraint_changed: true,
        })
    }

    /// Create a state machine from a task configuration.
    pub fn from_config(config: &TaskConfig) -> Result<Self> {
        Self::new(
            config.waypoints,
            config.positioning_tolerance,
            config.settle_error,
            config.constraint,
        )
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Repetition counter.
    #[must_use]
    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    /// Whether guidance is asserted.
    #[must_use]
    pub fn guidance_active(&self) -> bool {
        self.constraint.active
    }

    /// Task waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }

    /// Seconds since the current timed leg began, or 0 outside timed legs.
    #[must_use]
    pub fn elapsed_seconds(&self, now: Duration) -> f64 {
        match self.state_entered_at {
            Some(entered) if self.state.is_timed() => now.saturating_sub(entered).as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Copy of the observable state.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            state: self.state,
            repetition_count: self.repetition_count,
            guidance_active: self.constraint.active,
            state_entered_at: self.state_entered_at,
        }
    }

    /// Whether constraint parameters changed since they were last taken.
    #[must_use]
    pub fn constraint_changed(&self) -> bool {
        self.constraint_changed
    }

    /// Hand out the constraint parameters if they changed; at most once per
    /// change.
    pub fn take_constraint_update(&mut self) -> Option<ActiveConstraintParameters> {
        if self.constraint_changed {
            self.constraint_changed = false;
            Some(self.constraint)
        } else {
            None
        }
    }

    fn near(&self, ring_center: &Point3<f64>, waypoint: &Point3<f64>) -> bool {
        (ring_center - waypoint).norm() < self.tolerance
    }

    fn set_guidance(&mut self, active: bool) {
        if self.constraint.active != active {
            self.constraint.active = active;
            self.constraint_changed = true;
            debug!(active, "guidance constraint toggled");
        }
    }

    fn enter(&mut self, to: TaskState, now: Duration) -> TaskEvent {
        let from = self.state;
        self.state = to;
        if to.is_timed() {
            self.repetition_count += 1;
            self.state_entered_at = Some(now);
        }
        debug!(%from, %to, repetitions = self.repetition_count, "task transition");
        TaskEvent::Transitioned { from, to }
    }

    /// Advance the task by one cycle.
    ///
    /// `ring_center` and `position_error` come from the primary tool's
    /// estimate this cycle; `now` is the time since the session started.
    pub fn update(
        &mut self,
        ring_center: &Point3<f64>,
        position_error: f64,
        now: Duration,
    ) -> Option<TaskEvent> {
        let Waypoints { idle, start, end } = self.waypoints;

        match self.state {
            TaskState::Idle if self.near(ring_center, &start) && !self.constraint.active => {
                self.set_guidance(true);
                Some(TaskEvent::GuidanceEngaged)
            }
            TaskState::Idle if position_error < self.settle_error && self.constraint.active => {
                Some(self.enter(TaskState::ToEndPoint, now))
            }
            TaskState::ToEndPoint if self.near(ring_center, &end) => {
                Some(self.enter(TaskState::ToStartPoint, now))
            }
            TaskState::ToStartPoint if self.near(ring_center, &start) => {
                self.set_guidance(false);
                Some(self.enter(TaskState::RepetitionComplete, now))
            }
            TaskState::RepetitionComplete if self.near(ring_center, &idle) => {
                Some(self.enter(TaskState::Idle, now))
            }
            _ => None,
        }
    }

    /// Discard every repetition and wait for the idle point.
    pub fn reset(&mut self) {
        self.repetition_count = 0;
        self.state = TaskState::RepetitionComplete;
        info!("task reset");
    }

    /// Discard the last repetition only.
    pub fn repeat_last_acquisition(&mut self) {
        self.repetition_count = self.repetition_count.saturating_sub(1);
        self.state = TaskState::RepetitionComplete;
        info!(repetitions = self.repetition_count, "repeating last acquisition");
    }

    /// Apply an operator command.
    pub fn apply(&mut self, command: TaskCommand) {
        match command {
            TaskCommand::Reset => self.reset(),
            TaskCommand::RepeatLastAcquisition => self.repeat_last_acquisition(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn machine() -> TaskStateMachine {
        TaskStateMachine::from_config(&TaskConfig::default()).unwrap()
    }

    fn far_away() -> Point3<f64> {
        Point3::new(1.0, 1.0, 1.0)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_initial_state() {
        let mut sm = machine();
        assert_eq!(sm.state(), TaskState::Idle);
        assert_eq!(sm.repetition_count(), 0);
        assert!(!sm.guidance_active());

        // Initial parameters are published once
        let first = sm.take_constraint_update().unwrap();
        assert!(!first.active);
        assert!(sm.take_constraint_update().is_none());
    }

    #[test]
    fn test_activation_then_start() {
        let mut sm = machine();
        let start = sm.waypoints().start;

        // Large error: only guidance is engaged, state stays Idle
        let event = sm.update(&start, 0.01, secs(0.0));
        assert_eq!(event, Some(TaskEvent::GuidanceEngaged));
        assert_eq!(sm.state(), TaskState::Idle);
        assert!(sm.guidance_active());

        // Settled
        let event = sm.update(&start, 0.001, secs(0.5));
        assert_eq!(
            event,
            Some(TaskEvent::Transitioned {
                from: TaskState::Idle,
                to: TaskState::ToEndPoint
            })
        );
        assert_eq!(sm.repetition_count(), 1);
    }

    #[test]
    fn test_only_one_rule_per_cycle() {
        let mut sm = machine();
        let start = sm.waypoints().start;

        // Settled and at the start: activation wins, start waits a cycle
        assert_eq!(sm.update(&start, 0.0, secs(0.0)), Some(TaskEvent::GuidanceEngaged));
        assert_eq!(sm.state(), TaskState::Idle);
    }

    #[test]
    fn test_settle_threshold_is_strict() {
        let mut sm = machine();
        let start = sm.waypoints().start;
        sm.update(&start, 0.01, secs(0.0));

        assert!(sm.update(&start, 0.002, secs(0.1)).is_none());
        assert_eq!(sm.state(), TaskState::Idle);
    }

    #[test]
    fn test_no_start_without_guidance() {
        let mut sm = machine();
        assert!(sm.update(&far_away(), 0.0, secs(0.0)).is_none());
        assert_eq!(sm.state(), TaskState::Idle);
    }

    #[test]
    fn test_full_cycle_counts_two() {
        let mut sm = machine();
        let Waypoints { idle, start, end } = *sm.waypoints();

        sm.update(&start, 0.01, secs(0.0));
        sm.update(&start, 0.001, secs(1.0));
        assert_eq!(sm.state(), TaskState::ToEndPoint);

        // Travelling: nothing fires
        assert!(sm.update(&far_away(), 0.001, secs(2.0)).is_none());

        sm.update(&end, 0.001, secs(5.0));
        assert_eq!(sm.state(), TaskState::ToStartPoint);

        sm.update(&start, 0.001, secs(9.0));
        assert_eq!(sm.state(), TaskState::RepetitionComplete);
        assert!(!sm.guidance_active());

        sm.update(&idle, 0.001, secs(10.0));
        assert_eq!(sm.state(), TaskState::Idle);
        assert_eq!(sm.repetition_count(), 2);
    }

    #[test]
    fn test_idle_point_transition_fires_once() {
        let mut sm = machine();
        sm.reset();
        let idle = sm.waypoints().idle;

        let mut transitions = 0;
        for i in 0..20 {
            if let Some(TaskEvent::Transitioned { .. }) = sm.update(&idle, 0.0, secs(f64::from(i))) {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert_eq!(sm.state(), TaskState::Idle);
        assert_eq!(sm.repetition_count(), 0);
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut sm = machine();
        sm.reset();
        let idle = sm.waypoints().idle;

        // Exactly at tolerance is not "near"
        let on_boundary = idle + Vector3::new(0.005, 0.0, 0.0);
        assert!(sm.update(&on_boundary, 0.0, secs(0.0)).is_none());

        let inside = idle + Vector3::new(0.0049, 0.0, 0.0);
        assert!(sm.update(&inside, 0.0, secs(0.0)).is_some());
    }

    #[test]
    fn test_elapsed_time_per_leg() {
        let mut sm = machine();
        let Waypoints { start, end, .. } = *sm.waypoints();

        assert_eq!(sm.elapsed_seconds(secs(3.0)), 0.0);

        sm.update(&start, 0.01, secs(0.0));
        sm.update(&start, 0.001, secs(1.0));
        assert!((sm.elapsed_seconds(secs(3.5)) - 2.5).abs() < 1e-9);

        // Timer restarts on the return leg
        sm.update(&end, 0.001, secs(4.0));
        assert!((sm.elapsed_seconds(secs(4.25)) - 0.25).abs() < 1e-9);

        // And reads zero once the repetition is complete
        sm.update(&start, 0.001, secs(6.0));
        assert_eq!(sm.elapsed_seconds(secs(7.0)), 0.0);
    }

    #[test]
    fn test_constraint_update_handed_out_once_per_change() {
        let mut sm = machine();
        let Waypoints { start, end, .. } = *sm.waypoints();
        sm.take_constraint_update();

        sm.update(&start, 0.01, secs(0.0));
        assert!(sm.constraint_changed());
        assert!(sm.take_constraint_update().unwrap().active);
        assert!(sm.take_constraint_update().is_none());

        sm.update(&start, 0.001, secs(0.1));
        sm.update(&end, 0.001, secs(1.0));
        assert!(sm.take_constraint_update().is_none());

        sm.update(&start, 0.001, secs(2.0));
        assert!(!sm.take_constraint_update().unwrap().active);
    }

    #[test]
    fn test_reset_then_idle_point() {
        let mut sm = machine();
        let Waypoints { idle, start, .. } = *sm.waypoints();
        sm.update(&start, 0.01, secs(0.0));
        sm.update(&start, 0.001, secs(0.1));
        assert_eq!(sm.repetition_count(), 1);

        sm.apply(TaskCommand::Reset);
        assert_eq!(sm.state(), TaskState::RepetitionComplete);

        sm.update(&idle, 0.0, secs(1.0));
        assert_eq!(sm.state(), TaskState::Idle);
        assert_eq!(sm.repetition_count(), 0);
    }

    #[test]
    fn test_repeat_last_acquisition() {
        let mut sm = machine();
        let Waypoints { start, end, .. } = *sm.waypoints();
        sm.update(&start, 0.01, secs(0.0));
        sm.update(&start, 0.001, secs(0.1));
        sm.update(&end, 0.001, secs(1.0));
        assert_eq!(sm.repetition_count(), 2);

        sm.apply(TaskCommand::RepeatLastAcquisition);
        assert_eq!(sm.state(), TaskState::RepetitionComplete);
        assert_eq!(sm.repetition_count(), 1);

        // Never goes below zero
        sm.repeat_last_acquisition();
        sm.repeat_last_acquisition();
        assert_eq!(sm.repetition_count(), 0);
    }

    #[test]
    fn test_snapshot() {
        let mut sm = machine();
        let start = sm.waypoints().start;
        sm.update(&start, 0.01, secs(0.0));
        sm.update(&start, 0.001, secs(2.0));

        let snap = sm.snapshot();
        assert_eq!(snap.state, TaskState::ToEndPoint);
        assert_eq!(snap.repetition_count, 1);
        assert!(snap.guidance_active);
        assert_eq!(snap.state_entered_at, Some(secs(2.0)));
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let err = TaskStateMachine::new(
            Waypoints::default(),
            0.0,
            0.002,
            ActiveConstraintParameters::default(),
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }
}
