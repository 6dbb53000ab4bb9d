//! Fixed-rate driver for a [`BuzzWireSession`].
//!
//! The haptic side expects desired poses at a steady rate (200 Hz on the
//! training rig). The loop sleeps until each cycle's deadline; a cycle that
//! finishes late counts as an overrun and the schedule re-anchors instead of
//! bursting to catch up.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use fixture_types::{FixtureError, Result, TaskCommand};
use guide_query::NearestPointQuery;
use tracing::{debug, info};

use crate::session::{BuzzWireSession, CycleReport, ToolPoses};

/// Default cycle rate of the training rig.
pub const DEFAULT_RATE_HZ: f64 = 200.0;

/// Supplies live tool poses.
pub trait PoseSource {
    /// Poses for the cycle at `now`, or `None` when the source is exhausted.
    fn next_poses(&mut self, now: Duration) -> Option<ToolPoses>;
}

impl<F> PoseSource for F
where
    F: FnMut(Duration) -> Option<ToolPoses>,
{
    fn next_poses(&mut self, now: Duration) -> Option<ToolPoses> {
        self(now)
    }
}

/// Receives every cycle report (publishers, recorders, renderers).
pub trait CycleSink {
    /// Handle one report.
    fn consume(&mut self, report: &CycleReport);
}

impl<F> CycleSink for F
where
    F: FnMut(&CycleReport),
{
    fn consume(&mut self, report: &CycleReport) {
        self(report);
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Cycles executed.
    pub cycles: u64,
    /// Cycles that finished after their deadline.
    pub overruns: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Paces a session at a fixed rate.
#[derive(Debug)]
pub struct FixedRateLoop {
    period: Duration,
    max_cycles: Option<u64>,
    commands: Option<Receiver<TaskCommand>>,
}

impl Default for FixedRateLoop {
    fn default() -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / DEFAULT_RATE_HZ),
            max_cycles: None,
            commands: None,
        }
    }
}

impl FixedRateLoop {
    /// Create a loop running at `rate_hz`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfiguration`] if the rate is not
    /// positive and finite.
    pub fn new(rate_hz: f64) -> Result<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(FixtureError::invalid_config(format!(
                "loop rate must be positive and finite, got {rate_hz}"
            )));
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / rate_hz),
            ..Default::default()
        })
    }

    /// Stop after at most `max_cycles` cycles.
    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Apply operator commands received on `commands` before each cycle.
    #[must_use]
    pub fn with_commands(mut self, commands: Receiver<TaskCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Cycle period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    fn drain_commands<G: NearestPointQuery>(&mut self, session: &mut BuzzWireSession<G>) {
        let Some(rx) = &self.commands else {
            return;
        };
        let disconnected = loop {
            match rx.try_recv() {
                Ok(command) => session.apply(command),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if disconnected {
            debug!("command channel closed");
            self.commands = None;
        }
    }

    /// Run until the source is exhausted or the cycle limit is reached.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`BuzzWireSession::step`].
    pub fn run<G, S, K>(
        &mut self,
        session: &mut BuzzWireSession<G>,
        source: &mut S,
        sink: &mut K,
    ) -> Result<LoopStats>
    where
        G: NearestPointQuery,
        S: PoseSource + ?Sized,
        K: CycleSink + ?Sized,
    {
        info!(period_us = self.period.as_micros(), "guidance loop started");
        let started = Instant::now();
        let mut deadline = started;
        let mut stats = LoopStats::default();

        while self.max_cycles.is_none_or(|max| stats.cycles < max) {
            let now = started.elapsed();
            let Some(poses) = source.next_poses(now) else {
                break;
            };

            self.drain_commands(session);
            let report = session.step(&poses, now)?;
            sink.consume(&report);
            stats.cycles += 1;

            deadline += self.period;
            let finished = Instant::now();
            if finished > deadline {
                stats.overruns += 1;
                deadline = finished;
            } else {
                std::thread::sleep(deadline - finished);
            }
        }

        stats.elapsed = started.elapsed();
        info!(
            cycles = stats.cycles,
            overruns = stats.overruns,
            elapsed_ms = stats.elapsed.as_millis(),
            "guidance loop stopped"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fixture_types::{Point3, Pose, TaskConfig, TaskState};
    use guide_query::PolylineGuide;
    use std::sync::mpsc;

    fn session(config: TaskConfig) -> BuzzWireSession<PolylineGuide> {
        let wire =
            PolylineGuide::try_new(vec![config.waypoints.start, config.waypoints.end]).unwrap();
        BuzzWireSession::new(config, wire).unwrap()
    }

    fn still(_: Duration) -> Option<ToolPoses> {
        Some(ToolPoses::single(Pose::from_position(Point3::new(
            0.5, 0.5, 0.5,
        ))))
    }

    #[test]
    fn test_rejects_bad_rate() {
        assert!(FixedRateLoop::new(0.0).is_err());
        assert!(FixedRateLoop::new(f64::NAN).is_err());
        assert_eq!(
            FixedRateLoop::new(100.0).unwrap().period(),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn test_stops_at_cycle_limit() {
        let mut session = session(TaskConfig::default());
        let mut reports = 0;
        let mut sink = |_: &CycleReport| reports += 1;

        let stats = FixedRateLoop::new(1000.0)
            .unwrap()
            .with_max_cycles(5)
            .run(&mut session, &mut still, &mut sink)
            .unwrap();
        assert_eq!(stats.cycles, 5);
        assert_eq!(reports, 5);
        assert!(stats.elapsed >= Duration::from_millis(4));
    }

    #[test]
    fn test_stops_when_source_exhausted() {
        let mut session = session(TaskConfig::default());
        let mut remaining = 3;
        let mut source = |now: Duration| {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            still(now)
        };

        let stats = FixedRateLoop::new(1000.0)
            .unwrap()
            .run(&mut session, &mut source, &mut |_: &CycleReport| {})
            .unwrap();
        assert_eq!(stats.cycles, 3);
    }

    #[test]
    fn test_propagates_step_errors() {
        let mut session = session(TaskConfig::default().bimanual());
        let err = FixedRateLoop::new(1000.0)
            .unwrap()
            .with_max_cycles(3)
            .run(&mut session, &mut still, &mut |_: &CycleReport| {})
            .unwrap_err();
        assert!(err.is_missing_tool());
    }

    #[test]
    fn test_applies_queued_commands() {
        let mut session = session(TaskConfig::default());
        let (tx, rx) = mpsc::channel();
        tx.send(TaskCommand::Reset).unwrap();
        drop(tx);

        let mut states = Vec::new();
        let mut sink = |report: &CycleReport| states.push(report.telemetry.task_state);
        FixedRateLoop::new(1000.0)
            .unwrap()
            .with_max_cycles(2)
            .with_commands(rx)
            .run(&mut session, &mut still, &mut sink)
            .unwrap();

        assert_eq!(states, vec![TaskState::RepetitionComplete; 2]);
    }
}
