//! Polyline (piecewise linear) wire centerlines.
//!
//! A buzz-wire guide is usually a bent wire; its centerline is well
//! represented by a sequence of connected segments.

use crate::{GuideError, NearestPoint, NearestPointQuery, Result};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A wire centerline defined by a sequence of vertices.
///
/// Nearest-point queries project onto every segment and keep the closest
/// projection, so the answer is exact (up to floating point) regardless of
/// how coarse the polyline is.
///
/// # Example
///
/// ```
/// use guide_query::{NearestPointQuery, PolylineGuide};
/// use nalgebra::Point3;
///
/// let wire = PolylineGuide::try_new(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
/// ])
/// .unwrap();
///
/// let hit = wire.nearest_point(Point3::new(0.5, 0.2, 0.0)).unwrap();
/// assert!((hit.point.x - 0.5).abs() < 1e-12);
/// assert!(hit.point.y.abs() < 1e-12);
/// ```
///
/// Only the vertices are serialized; deserialization goes through
/// [`Self::try_new`] and recomputes the arc length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PolylineData", into = "PolylineData"))]
pub struct PolylineGuide {
    /// The vertices of the centerline.
    vertices: Vec<Point3<f64>>,
    /// Total arc length (cached).
    total_length: f64,
}

/// Unvalidated serialized form of [`PolylineGuide`].
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct PolylineData {
    vertices: Vec<Point3<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<PolylineData> for PolylineGuide {
    type Error = GuideError;

    fn try_from(data: PolylineData) -> Result<Self> {
        Self::try_new(data.vertices)
    }
}

#[cfg(feature = "serde")]
impl From<PolylineGuide> for PolylineData {
    fn from(wire: PolylineGuide) -> Self {
        Self {
            vertices: wire.vertices,
        }
    }
}

impl PolylineGuide {
    /// Create a new centerline, rejecting fewer than 2 or non-finite vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::InsufficientPoints`] if fewer than 2 vertices,
    /// or [`GuideError::NonFiniteVertex`] if any coordinate is `NaN`/`Inf`.
    pub fn try_new(vertices: Vec<Point3<f64>>) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(GuideError::insufficient_points(2, vertices.len()));
        }
        if let Some(index) = vertices
            .iter()
            .position(|v| !v.coords.iter().all(|c| c.is_finite()))
        {
            return Err(GuideError::NonFiniteVertex { index });
        }

        let total_length = vertices.windows(2).map(|w| (w[1] - w[0]).norm()).sum();

        Ok(Self {
            vertices,
            total_length,
        })
    }

    /// Sample a parametric curve `f(t)`, `t ∈ [0, 1]`, into a centerline.
    ///
    /// # Errors
    ///
    /// Same as [`Self::try_new`]; `samples` is raised to at least 2.
    pub fn from_fn(samples: usize, f: impl Fn(f64) -> Point3<f64>) -> Result<Self> {
        let n = samples.max(2);
        let vertices = (0..n).map(|i| f(i as f64 / (n - 1) as f64)).collect();
        Self::try_new(vertices)
    }

    /// Get the vertices of the centerline.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Get the number of segments.
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Total arc length of the centerline.
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.total_length
    }

    /// Axis-aligned bounding box as `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let first = self.vertices[0];
        self.vertices
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.inf(v), hi.sup(v)))
    }
}

/// Closest point on segment `[a, b]` to `p`.
#[must_use]
pub fn closest_point_on_segment(p: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> Point3<f64> {
    let ab: Vector3<f64> = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-20 {
        return a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

impl NearestPointQuery for PolylineGuide {
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint> {
        self.vertices
            .windows(2)
            .map(|w| NearestPoint::between(point, closest_point_on_segment(point, w[0], w[1])))
            .filter(NearestPoint::is_finite)
            .min_by(|a, b| a.distance_squared.total_cmp(&b.distance_squared))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> PolylineGuide {
        PolylineGuide::try_new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_short_input() {
        let err = PolylineGuide::try_new(vec![Point3::origin()]).unwrap_err();
        assert!(err.is_insufficient_points());
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = PolylineGuide::try_new(vec![Point3::origin(), Point3::new(f64::NAN, 0.0, 0.0)])
            .unwrap_err();
        assert_eq!(err, GuideError::NonFiniteVertex { index: 1 });
    }

    #[test]
    fn test_arc_length_and_bounds() {
        let wire = l_shape();
        assert_relative_eq!(wire.arc_length(), 2.0, epsilon = 1e-12);
        assert_eq!(wire.num_segments(), 2);

        let (lo, hi) = wire.bounds();
        assert_relative_eq!(lo, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(hi, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_interior_projection() {
        let wire = l_shape();
        let hit = wire.nearest_point(Point3::new(1.3, 0.6, 0.2)).unwrap();
        assert_relative_eq!(hit.point, Point3::new(1.0, 0.6, 0.0), epsilon = 1e-12);
        assert_relative_eq!(hit.distance_squared, 0.09 + 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_clamps_to_endpoint() {
        let wire = l_shape();
        let hit = wire.nearest_point(Point3::new(-2.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(hit.point, Point3::origin(), epsilon = 1e-12);
        assert_relative_eq!(hit.distance(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_on_wire_has_zero_distance() {
        let wire = l_shape();
        let hit = wire.nearest_point(Point3::new(1.0, 0.25, 0.0)).unwrap();
        assert_relative_eq!(hit.distance_squared, 0.0, epsilon = 1e-20);
    }

    #[test]
    fn test_from_fn_samples_endpoints() {
        let wire = PolylineGuide::from_fn(11, |t| Point3::new(t, 2.0 * t, 0.0)).unwrap();
        assert_eq!(wire.vertices().len(), 11);
        assert_relative_eq!(wire.vertices()[10], Point3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(wire.arc_length(), 5.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_segment() {
        let p = closest_point_on_segment(
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.5, 0.5, 0.5),
        );
        assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates_and_recomputes_length() {
        let short = r#"{"vertices": []}"#;
        assert!(serde_json::from_str::<PolylineGuide>(short).is_err());

        let one = r#"{"vertices": [[1.0, 2.0, 3.0]]}"#;
        let err = serde_json::from_str::<PolylineGuide>(one).unwrap_err();
        assert!(err.to_string().contains("insufficient points"));

        // A stale cached length in the input is ignored
        let stale = r#"{"vertices": [[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]], "total_length": 42.0}"#;
        let wire: PolylineGuide = serde_json::from_str(stale).unwrap();
        assert_relative_eq!(wire.arc_length(), 5.0, epsilon = 1e-12);

        let json = serde_json::to_string(&l_shape()).unwrap();
        assert!(!json.contains("total_length"));
        let back: PolylineGuide = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l_shape());
    }
}
