//! Orientation frames rebuilt from guide-relative direction estimates.
//!
//! The desired tool orientation is estimated from two noisy directions (grip
//! point toward the wire, radial point away from the wire). They are rarely
//! exactly perpendicular because nearest-point queries snap to mesh
//! discretization, so the frame is rebuilt by sequential cross products
//! until all three axes are unit length and mutually orthogonal.

use fixture_types::{Axis, SamplingConvention};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// Vectors shorter than this cannot be normalized.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

/// Normalize `v`, or return `None` if it is too short or not finite.
#[must_use]
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if norm.is_finite() && norm > DEGENERATE_EPSILON {
        Some(v / norm)
    } else {
        None
    }
}

/// A right-handed orthonormal frame, stored as its X, Y and Z axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationFrame {
    axes: [Vector3<f64>; 3],
}

impl OrientationFrame {
    /// Rebuild a frame from a grip direction and a radial direction.
    ///
    /// `grip` and `radial` are assigned to the convention's grip and radial
    /// axes (after normalization). Then each axis in
    /// [`SamplingConvention::reconstruction_order`] is recomputed as the
    /// cross product of the other two, cyclically (`X = Y × Z`,
    /// `Y = Z × X`, `Z = X × Y`), and renormalized.
    ///
    /// Returns `None` if any intermediate vector is degenerate (zero length,
    /// or `grip` parallel to `radial`).
    #[must_use]
    pub fn reconstruct(
        grip: &Vector3<f64>,
        radial: &Vector3<f64>,
        convention: SamplingConvention,
    ) -> Option<Self> {
        let mut axes = [Vector3::zeros(); 3];
        axes[convention.grip_axis.index()] = try_normalize(grip)?;
        axes[convention.radial_axis.index()] = try_normalize(radial)?;

        for axis in convention.reconstruction_order() {
            let i = axis.index();
            let rebuilt = axes[(i + 1) % 3].cross(&axes[(i + 2) % 3]);
            axes[i] = try_normalize(&rebuilt)?;
        }

        Some(Self { axes })
    }

    /// Frame of an existing rotation.
    #[must_use]
    pub fn from_rotation(rotation: &UnitQuaternion<f64>) -> Self {
        let m = rotation.to_rotation_matrix();
        Self {
            axes: [
                m.matrix().column(0).into(),
                m.matrix().column(1).into(),
                m.matrix().column(2).into(),
            ],
        }
    }

    /// The X, Y and Z axes.
    #[must_use]
    pub fn axes(&self) -> [Vector3<f64>; 3] {
        self.axes
    }

    /// A single axis.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> Vector3<f64> {
        self.axes[axis.index()]
    }

    /// Convert the frame to a rotation quaternion.
    #[must_use]
    pub fn to_rotation(&self) -> UnitQuaternion<f64> {
        let matrix = Matrix3::from_columns(&self.axes);
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix))
    }

    /// Check if the frame is orthonormal within tolerance.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let [x, y, z] = self.axes;
        let lengths_ok = self.axes.iter().all(|a| (a.norm() - 1.0).abs() < tolerance);
        let dots_ok = [x.dot(&y), x.dot(&z), y.dot(&z)]
            .iter()
            .all(|d| d.abs() < tolerance);
        lengths_ok && dots_ok
    }

    /// Check that `X × Y = Z` within tolerance.
    #[must_use]
    pub fn is_right_handed(&self, tolerance: f64) -> bool {
        let [x, y, z] = self.axes;
        (x.cross(&y) - z).norm() < tolerance
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fixture_types::ToolRole;

    #[test]
    fn test_primary_aligned_inputs_give_identity() {
        let frame = OrientationFrame::reconstruct(
            &Vector3::z(),
            &Vector3::x(),
            ToolRole::Primary.convention(),
        )
        .unwrap();
        assert_relative_eq!(frame.axis(Axis::X), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.axis(Axis::Y), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.axis(Axis::Z), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_secondary_aligned_inputs_give_identity() {
        let frame = OrientationFrame::reconstruct(
            &Vector3::y(),
            &Vector3::x(),
            ToolRole::Secondary.convention(),
        )
        .unwrap();
        assert_relative_eq!(frame.to_rotation().angle(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_skewed_inputs_become_orthonormal() {
        let grip = Vector3::new(0.1, 0.05, 1.0);
        let radial = Vector3::new(1.0, 0.2, 0.3);
        for role in ToolRole::ALL {
            let frame = OrientationFrame::reconstruct(&grip, &radial, role.convention()).unwrap();
            assert!(frame.is_orthonormal(1e-12));
            assert!(frame.is_right_handed(1e-12));
        }
    }

    #[test]
    fn test_grip_axis_kept_close_to_input() {
        // Re-orthonormalization only rotates the grip axis within the plane
        // spanned by grip and radial
        let grip = Vector3::new(0.0, 0.0, 1.0);
        let radial = Vector3::new(1.0, 0.0, 0.2);
        let frame =
            OrientationFrame::reconstruct(&grip, &radial, ToolRole::Primary.convention()).unwrap();
        assert_relative_eq!(frame.axis(Axis::Y), Vector3::y(), epsilon = 1e-12);
        assert!(frame.axis(Axis::Z).dot(&grip) > 0.98);
    }

    #[test]
    fn test_degenerate_inputs() {
        let conv = ToolRole::Primary.convention();
        assert!(OrientationFrame::reconstruct(&Vector3::zeros(), &Vector3::x(), conv).is_none());
        assert!(OrientationFrame::reconstruct(&Vector3::z(), &Vector3::zeros(), conv).is_none());
        // Parallel inputs have no cross product
        assert!(OrientationFrame::reconstruct(&Vector3::z(), &Vector3::z(), conv).is_none());
        assert!(
            OrientationFrame::reconstruct(&Vector3::new(f64::NAN, 0.0, 1.0), &Vector3::x(), conv)
                .is_none()
        );
    }

    #[test]
    fn test_rotation_roundtrip() {
        let q = UnitQuaternion::from_euler_angles(0.4, -0.3, 2.0);
        let frame = OrientationFrame::from_rotation(&q);
        assert!(frame.is_orthonormal(1e-12));
        assert_relative_eq!(frame.to_rotation().angle_to(&q), 0.0, epsilon = 1e-6);
    }
}
