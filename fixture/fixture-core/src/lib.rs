//! Active-constraint guidance for the buzz-wire training task.
//!
//! A trainee steers a ring mounted on a teleoperated tool along a wire
//! without touching it. Every cycle this crate works out where the tool
//! *should* be, so a haptic controller can pull it there, and tracks the
//! progress of the task.
//!
//! # Pipeline
//!
//! ```text
//! tool pose ─► DesiredPoseEstimator ─► TaskStateMachine ─► TelemetryAggregator
//!                   │  (guide queries)       │                   │
//!                   ▼                        ▼                   ▼
//!             desired pose           constraint on/off     record + colors
//! ```
//!
//! - [`DesiredPoseEstimator`]: Projects the ring onto the guide and rebuilds
//!   an orthonormal desired orientation ([`OrientationFrame`])
//! - [`TaskStateMachine`]: Idle → to end → back to start → complete, with
//!   repetition counting and guidance toggling
//! - [`TelemetryAggregator`]: Outward [`TaskTelemetryRecord`] plus severity
//!   colors, ring spacing and the destination cue
//! - [`BuzzWireSession`]: Runs the three stages in order for one cycle
//! - [`FixedRateLoop`]: Paces a session from a [`PoseSource`] into a
//!   [`CycleSink`]
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fixture_core::{BuzzWireSession, ToolPoses};
//! use fixture_types::{Pose, TaskConfig, ToolRole};
//! use guide_query::PolylineGuide;
//! use nalgebra::Vector3;
//!
//! let config = TaskConfig::default();
//! let start = config.waypoints.start;
//! let wire = PolylineGuide::try_new(vec![start, config.waypoints.end]).unwrap();
//! let mut session = BuzzWireSession::new(config, wire).unwrap();
//!
//! // Ring center a millimetre off the wire start
//! let radius = session.config().ring_radius;
//! let grip = start - Vector3::new(0.0, 0.0, radius) + Vector3::new(0.0, 0.0, 0.001);
//! let poses = ToolPoses::single(Pose::from_position(grip));
//!
//! let report = session.step(&poses, Duration::ZERO).unwrap();
//! let estimate = report.estimate(ToolRole::Primary).unwrap();
//! assert!(estimate.status.is_engaged());
//! assert!(estimate.position_error > 0.0);
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Teleoperation control loops
//! - Offline replay of recorded trajectories
//! - Headless scoring tools

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod estimator;
mod feedback;
mod frame;
mod runner;
mod session;
mod state_machine;

pub use estimator::{
    ClosestPointSet, ConnectorPoints, DesiredPoseEstimator, FixtureStatus, ToolEstimate,
};
pub use feedback::{
    CUE_AMPLITUDE, CUE_BASE_HEIGHT, CUE_PERIOD_CYCLES, DestinationCue, FeedbackSignals,
    RingSpacing, TelemetryAggregator, ToolFeedback, connector_color, distance_error_ratio,
    error_color, severity_ratio,
};
pub use frame::{DEGENERATE_EPSILON, OrientationFrame, try_normalize};
pub use runner::{CycleSink, DEFAULT_RATE_HZ, FixedRateLoop, LoopStats, PoseSource};
pub use session::{BuzzWireSession, CycleReport, ToolPoses};
pub use state_machine::{TaskEvent, TaskSnapshot, TaskStateMachine};

// Re-export types needed to drive a session
pub use fixture_types::{
    ActiveConstraintParameters, FixtureError, Pose, Result, TaskCommand, TaskConfig, TaskState,
    TaskTelemetryRecord, ToolRole,
};
