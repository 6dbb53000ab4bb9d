//! Core types for virtual-fixture guidance.
//!
//! This crate provides the data model shared by the guidance engine and the
//! layers around it (teleoperation input, haptic controller, recorders):
//!
//! - [`Pose`] - Position and orientation of a teleoperated tool
//! - [`RingGeometry`], [`ToolRole`], [`SamplingConvention`] - Where the ring
//!   sits on each tool and which points are sampled against the guide
//! - [`TaskState`], [`TaskCommand`] - Task phase and operator triggers
//! - [`TaskTelemetryRecord`] - Outward per-cycle record
//! - [`ActiveConstraintParameters`] - Guidance force gains and on/off flag
//! - [`TaskConfig`] - Waypoints, tolerances and thresholds
//!
//! # Design Philosophy
//!
//! These types are **pure data**. Nearest-point queries live in
//! `guide-query`; pose estimation and the task state machine live in
//! `fixture-core`.
//!
//! # Example
//!
//! ```
//! use fixture_types::{Pose, RingGeometry, ToolRole};
//! use nalgebra::Point3;
//!
//! let ring = RingGeometry::new(0.004).unwrap();
//! let pose = Pose::from_position(Point3::new(0.01, 0.0, 0.0));
//!
//! // The primary ring is centered one radius along local Z
//! let center = ring.ring_center(&pose, ToolRole::Primary);
//! assert!((center.z - 0.004).abs() < 1e-12);
//! ```
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc
)]

mod config;
mod constraint;
mod error;
mod pose;
mod ring;
mod task;

pub use config::{TaskConfig, Waypoints};
pub use constraint::{ActiveConstraintParameters, ConstraintMethod};
pub use error::FixtureError;
pub use pose::Pose;
pub use ring::{Axis, RingGeometry, SAMPLING_CONVENTIONS, SamplingConvention, ToolRole};
pub use task::{Rgb, TaskCommand, TaskState, TaskTelemetryRecord};

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Result type for guidance operations.
pub type Result<T> = std::result::Result<T, FixtureError>;
