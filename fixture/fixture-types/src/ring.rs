//! Ring geometry and per-tool sampling conventions.
//!
//! Each tool carries a ring whose center sits one radius along the tool's
//! *grip axis*. The two rings of a bimanual setup are mounted 90° apart, so
//! the primary tool's grip axis is local Z and the secondary tool's is local
//! Y. Both use local X as the *radial axis*. Every sample point the
//! guidance engine needs is derived from these two axes:
//!
//! ```text
//! ring center  = r · e_grip
//! radial point = r · (e_radial + e_grip)
//! distal point = 2r · e_grip
//! ```

use nalgebra::{Point3, Vector3};

use crate::{FixtureError, Pose, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the tool's local coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Local X.
    X,
    /// Local Y.
    Y,
    /// Local Z.
    Z,
}

impl Axis {
    /// Column index of this axis in a rotation matrix.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Axis for a column index (taken modulo 3).
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }

    /// Unit vector along this axis.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

/// Which tool of the (possibly bimanual) setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ToolRole {
    /// The first (or only) tool. Its error drives the task state machine.
    Primary,
    /// The second tool of a bimanual setup.
    Secondary,
}

impl ToolRole {
    /// Both roles, in index order.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// Index of this role (0 for primary, 1 for secondary).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }

    /// Sampling convention for this role's ring mount.
    #[must_use]
    pub const fn convention(self) -> SamplingConvention {
        SAMPLING_CONVENTIONS[self.index()]
    }
}

/// How a ring is mounted on its tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplingConvention {
    /// Axis from the grip point through the ring center.
    pub grip_axis: Axis,
    /// Axis toward the radial sample point, perpendicular to the grip axis.
    pub radial_axis: Axis,
}

/// Strategy table indexed by [`ToolRole::index`].
pub const SAMPLING_CONVENTIONS: [SamplingConvention; 2] = [
    SamplingConvention {
        grip_axis: Axis::Z,
        radial_axis: Axis::X,
    },
    SamplingConvention {
        grip_axis: Axis::Y,
        radial_axis: Axis::X,
    },
];

impl SamplingConvention {
    /// The axis that is neither grip nor radial.
    #[must_use]
    pub const fn derived_axis(&self) -> Axis {
        Axis::from_index(3 - self.grip_axis.index() - self.radial_axis.index())
    }

    /// Order in which frame axes are rebuilt during re-orthonormalization:
    /// derived axis first, then radial, then grip.
    #[must_use]
    pub const fn reconstruction_order(&self) -> [Axis; 3] {
        [self.derived_axis(), self.radial_axis, self.grip_axis]
    }

    /// Local offset of the ring center for a ring of `radius`.
    #[must_use]
    pub fn ring_center_offset(&self, radius: f64) -> Vector3<f64> {
        self.grip_axis.unit() * radius
    }

    /// Local offset of the radial sample point.
    #[must_use]
    pub fn radial_offset(&self, radius: f64) -> Vector3<f64> {
        (self.radial_axis.unit() + self.grip_axis.unit()) * radius
    }

    /// Local offset of the distal sample point (far side of the ring).
    #[must_use]
    pub fn distal_offset(&self, radius: f64) -> Vector3<f64> {
        self.grip_axis.unit() * (2.0 * radius)
    }
}

/// Ring dimensions shared by every tool of a task instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingGeometry {
    radius: f64,
}

impl RingGeometry {
    /// Create ring geometry.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfiguration`] if `radius` is not a
    /// positive finite number.
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(FixtureError::invalid_config(format!(
                "ring radius must be positive and finite, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    /// Ring radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Grip point (tool origin) in task space.
    #[must_use]
    pub fn grip_point(&self, pose: &Pose) -> Point3<f64> {
        pose.position
    }

    /// Ring center in task space.
    #[must_use]
    pub fn ring_center(&self, pose: &Pose, role: ToolRole) -> Point3<f64> {
        let offset = role.convention().ring_center_offset(self.radius);
        pose.transform_point(&Point3::from(offset))
    }

    /// Radial sample point in task space.
    #[must_use]
    pub fn radial_point(&self, pose: &Pose, role: ToolRole) -> Point3<f64> {
        let offset = role.convention().radial_offset(self.radius);
        pose.transform_point(&Point3::from(offset))
    }

    /// Distal sample point in task space.
    #[must_use]
    pub fn distal_point(&self, pose: &Pose, role: ToolRole) -> Point3<f64> {
        let offset = role.convention().distal_offset(self.radius);
        pose.transform_point(&Point3::from(offset))
    }
}
