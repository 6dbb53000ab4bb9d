//! Configuration for a buzz-wire guidance task.
//!
//! Defaults reproduce the training rig: a 3.5 mm ring, waypoints in the
//! task-space frame of the wire board, and 5 mm positioning tolerance.

use nalgebra::Point3;

use crate::{ActiveConstraintParameters, FixtureError, Result, RingGeometry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed task waypoints in task-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoints {
    /// Visited after a repetition to re-arm the task.
    pub idle: Point3<f64>,
    /// Start of the wire; the timed legs begin and end here.
    pub start: Point3<f64>,
    /// End of the wire.
    pub end: Point3<f64>,
}

impl Default for Waypoints {
    fn default() -> Self {
        Self {
            idle: Point3::new(0.010, 0.011, 0.033),
            start: Point3::new(0.017, 0.015, 0.033),
            end: Point3::new(0.049, 0.028, 0.056),
        }
    }
}

/// Main configuration for a guidance task.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TaskConfig {
    /// Name published in every telemetry record.
    pub task_name: String,
    /// Ring radius (same for both tools).
    pub ring_radius: f64,
    /// Whether a second tool takes part.
    pub bimanual: bool,
    /// Task waypoints.
    pub waypoints: Waypoints,
    /// Distance under which a waypoint counts as reached.
    pub positioning_tolerance: f64,
    /// Position error under which the tool counts as settled on the wire.
    pub settle_error: f64,
    /// The fixture is dropped when the ring center is at least this many
    /// radii from the guide.
    pub far_factor: f64,
    /// Position error mapped to full red in the error color.
    pub max_error: f64,
    /// Target distance between the two ring centers.
    pub ideal_ring_distance: f64,
    /// Guidance force parameters.
    pub constraint: ActiveConstraintParameters,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            task_name: "BuzzWire".to_string(),
            ring_radius: 0.0035,
            bimanual: false,
            waypoints: Waypoints::default(),
            positioning_tolerance: 0.005,
            settle_error: 0.002,
            far_factor: 3.0,
            max_error: 0.004,
            ideal_ring_distance: 0.007,
            constraint: ActiveConstraintParameters::default(),
        }
    }
}

impl TaskConfig {
    /// Create a configuration with the given ring radius.
    #[must_use]
    pub fn with_ring_radius(ring_radius: f64) -> Self {
        Self {
            ring_radius,
            ..Default::default()
        }
    }

    /// Enable the second tool.
    #[must_use]
    pub fn bimanual(mut self) -> Self {
        self.bimanual = true;
        self
    }

    /// Set the waypoints.
    #[must_use]
    pub fn waypoints(mut self, waypoints: Waypoints) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Set the positioning tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.positioning_tolerance = tolerance;
        self
    }

    /// Set the guidance force parameters.
    #[must_use]
    pub fn constraint(mut self, constraint: ActiveConstraintParameters) -> Self {
        self.constraint = constraint;
        self
    }

    /// Ring geometry derived from [`Self::ring_radius`].
    pub fn ring(&self) -> Result<RingGeometry> {
        RingGeometry::new(self.ring_radius)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.ring()?;

        let positive = [
            ("positioning tolerance", self.positioning_tolerance),
            ("settle error", self.settle_error),
            ("far factor", self.far_factor),
            ("max error", self.max_error),
            ("ideal ring distance", self.ideal_ring_distance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FixtureError::invalid_config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        let Waypoints { idle, start, end } = self.waypoints;
        if ![idle, start, end]
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(FixtureError::invalid_config("waypoints must be finite"));
        }

        if !self.constraint.is_valid() {
            return Err(FixtureError::invalid_config(
                "constraint gains must be finite and non-negative",
            ));
        }

        Ok(())
    }
}
