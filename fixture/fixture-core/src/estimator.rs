//! Desired-pose estimation against the guide.
//!
//! Every cycle, for every tool:
//!
//! 1. Query the guide for the points nearest to the grip point, the ring
//!    center and the radial sample point.
//! 2. If the ring center is at least `far_factor · r` from the guide (or
//!    the guide cannot answer), the desired pose collapses to the current
//!    pose and the last position error is kept.
//! 3. Otherwise the desired position translates the tool so the ring center
//!    lands on the guide, and the desired orientation is rebuilt from the
//!    grip-to-guide and guide-to-radial directions.
//!
//! Using the grip point rather than the ring center for the orientation
//! estimate keeps the direction well conditioned: the ring-center vector
//! shrinks to zero exactly when the tool is on target.

use fixture_types::{FixtureError, Pose, Result, RingGeometry, TaskConfig, ToolRole};
use guide_query::NearestPointQuery;
use nalgebra::{Point3, UnitQuaternion};
use tracing::warn;

use crate::frame::OrientationFrame;

/// Guide points nearest to the three sample points of one tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPointSet {
    /// Nearest guide point to the grip point.
    pub grip: Point3<f64>,
    /// Nearest guide point to the ring center.
    pub ring_center: Point3<f64>,
    /// Nearest guide point to the radial sample point.
    pub radial: Point3<f64>,
}

/// End points of the connector drawn for each tool.
///
/// A pure function of the tool pose and ring radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPoints {
    /// The grip point.
    pub grip: Point3<f64>,
    /// The distal sample point on the far side of the ring.
    pub distal: Point3<f64>,
}

/// Whether the fixture is asserted for a tool this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureStatus {
    /// Ring is near the guide; desired pose pulls it onto the centerline.
    Engaged,
    /// Ring is too far from the guide; desired pose is the current pose.
    OutOfRange,
    /// Guide had no answer (or input was not finite); desired pose is the
    /// current pose.
    GuideUnavailable,
}

impl FixtureStatus {
    /// Whether a fixture is asserted.
    #[must_use]
    pub fn is_engaged(self) -> bool {
        self == Self::Engaged
    }
}

/// Per-tool result of one estimation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolEstimate {
    /// Which tool.
    pub role: ToolRole,
    /// Pose the guidance force should pull toward.
    pub desired: Pose,
    /// Distance between the ring center and the guide (last known value when
    /// not engaged).
    pub position_error: f64,
    /// Fixture status this cycle.
    pub status: FixtureStatus,
    /// `true` when orientation reconstruction hit a zero-length vector and
    /// the previous desired orientation was reused.
    pub degenerate_orientation: bool,
    /// Ring center in task space.
    pub ring_center: Point3<f64>,
    /// Nearest guide points, when the guide answered.
    pub closest: Option<ClosestPointSet>,
    /// Connector end points for visualization.
    pub connector: ConnectorPoints,
}

#[derive(Debug, Clone, Copy, Default)]
struct ToolTracker {
    last_error: f64,
    last_rotation: Option<UnitQuaternion<f64>>,
}

/// Computes desired tool poses from the live tool pose and the guide.
#[derive(Debug, Clone)]
pub struct DesiredPoseEstimator {
    ring: RingGeometry,
    far_factor: f64,
    trackers: [ToolTracker; 2],
}

impl DesiredPoseEstimator {
    /// Create an estimator.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfiguration`] if `far_factor` is not
    /// a positive finite number.
    pub fn new(ring: RingGeometry, far_factor: f64) -> Result<Self> {
        if !far_factor.is_finite() || far_factor <= 0.0 {
            return Err(FixtureError::invalid_config(format!(
                "far factor must be positive and finite, got {far_factor}"
            )));
        }
        Ok(Self {
            ring,
            far_factor,
            trackers: [ToolTracker::default(); 2],
        })
    }

    /// Create an estimator from a task configuration.
    pub fn from_config(config: &TaskConfig) -> Result<Self> {
        Self::new(config.ring()?, config.far_factor)
    }

    /// Ring geometry used for sampling.
    #[must_use]
    pub fn ring(&self) -> RingGeometry {
        self.ring
    }

    /// Distance from the guide beyond which no fixture is asserted.
    #[must_use]
    pub fn engage_distance(&self) -> f64 {
        self.far_factor * self.ring.radius()
    }

    /// Last position error computed for `role`.
    #[must_use]
    pub fn position_error(&self, role: ToolRole) -> f64 {
        self.trackers[role.index()].last_error
    }

    /// Forget all cross-cycle memory (errors and fallback orientations).
    pub fn reset(&mut self) {
        self.trackers = [ToolTracker::default(); 2];
    }

    /// Run one estimation cycle for one tool.
    pub fn estimate<G>(&mut self, guide: &G, pose: &Pose, role: ToolRole) -> ToolEstimate
    where
        G: NearestPointQuery + ?Sized,
    {
        let ring_center = self.ring.ring_center(pose, role);
        let connector = ConnectorPoints {
            grip: self.ring.grip_point(pose),
            distal: self.ring.distal_point(pose, role),
        };

        if !pose.is_finite() {
            warn!(?role, "non-finite tool pose, fixture not asserted");
            return self.hold(
                pose,
                role,
                FixtureStatus::GuideUnavailable,
                ring_center,
                None,
                connector,
            );
        }

        let grip_point = self.ring.grip_point(pose);
        let radial_point = self.ring.radial_point(pose, role);

        let closest = match (
            guide.nearest_point(grip_point),
            guide.nearest_point(ring_center),
            guide.nearest_point(radial_point),
        ) {
            (Some(grip), Some(center), Some(radial))
                if grip.is_finite() && center.is_finite() && radial.is_finite() =>
            {
                ClosestPointSet {
                    grip: grip.point,
                    ring_center: center.point,
                    radial: radial.point,
                }
            }
            _ => {
                warn!(?role, "guide returned no finite nearest point, fixture not asserted");
                return self.hold(
                    pose,
                    role,
                    FixtureStatus::GuideUnavailable,
                    ring_center,
                    None,
                    connector,
                );
            }
        };

        let ring_center_to_closest = closest.ring_center - ring_center;
        let distance = ring_center_to_closest.norm();
        if !distance.is_finite() {
            warn!(?role, "non-finite distance to guide, fixture not asserted");
            return self.hold(
                pose,
                role,
                FixtureStatus::GuideUnavailable,
                ring_center,
                None,
                connector,
            );
        }
        if distance >= self.engage_distance() {
            return self.hold(
                pose,
                role,
                FixtureStatus::OutOfRange,
                ring_center,
                Some(closest),
                connector,
            );
        }

        let wire_center = ring_center + ring_center_to_closest;
        let position_error = (wire_center - ring_center).norm();
        let desired_position = pose.position + (wire_center - ring_center);

        let grip_to_closest = closest.grip - grip_point;
        let closest_to_radial = -(closest.radial - radial_point);

        let tracker = &mut self.trackers[role.index()];
        let reconstructed =
            OrientationFrame::reconstruct(&grip_to_closest, &closest_to_radial, role.convention());
        let (rotation, degenerate_orientation) = match reconstructed {
            Some(frame) => (frame.to_rotation(), false),
            None => {
                warn!(?role, "degenerate orientation estimate, reusing previous desired orientation");
                (tracker.last_rotation.unwrap_or(pose.rotation), true)
            }
        };

        tracker.last_error = position_error;
        tracker.last_rotation = Some(rotation);

        ToolEstimate {
            role,
            desired: Pose::from_position_rotation(desired_position, rotation),
            position_error,
            status: FixtureStatus::Engaged,
            degenerate_orientation,
            ring_center,
            closest: Some(closest),
            connector,
        }
    }

    /// Desired pose collapses to the current pose; error is left as it was.
    fn hold(
        &mut self,
        pose: &Pose,
        role: ToolRole,
        status: FixtureStatus,
        ring_center: Point3<f64>,
        closest: Option<ClosestPointSet>,
        connector: ConnectorPoints,
    ) -> ToolEstimate {
        let tracker = &mut self.trackers[role.index()];
        if pose.is_finite() {
            tracker.last_rotation = Some(pose.rotation);
        }

        ToolEstimate {
            role,
            desired: *pose,
            position_error: tracker.last_error,
            status,
            degenerate_orientation: false,
            ring_center,
            closest,
            connector,
        }
    }
}
