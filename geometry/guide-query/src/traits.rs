//! The nearest-point query seam.
//!
//! Guidance code never looks at guide geometry directly; it only asks a
//! [`NearestPointQuery`] where the guide is closest to a sample point.

use std::sync::Arc;

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NearestPoint {
    /// The closest point on the guide.
    pub point: Point3<f64>,
    /// Squared distance from the query point to [`Self::point`].
    pub distance_squared: f64,
}

impl NearestPoint {
    /// Build a result from the query point and the closest guide point.
    #[must_use]
    pub fn between(query: Point3<f64>, point: Point3<f64>) -> Self {
        Self {
            point,
            distance_squared: (point - query).norm_squared(),
        }
    }

    /// Distance from the query point to the guide.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }

    /// Check that neither the point nor the distance is `NaN`/`Inf`.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.distance_squared.is_finite() && self.point.coords.iter().all(|c| c.is_finite())
    }
}

/// A static guide that can answer nearest-point queries.
///
/// Implementations must be pure: the same query against the same guide
/// always yields the same answer, and queries never mutate the guide.
///
/// # Implementors
///
/// - [`PolylineGuide`](crate::PolylineGuide) - Wire centerline
/// - [`TriangleMeshGuide`](crate::TriangleMeshGuide) - Wire surface mesh
pub trait NearestPointQuery {
    /// Find the closest point on the guide to `point`.
    ///
    /// Returns `None` when the guide cannot answer, e.g. it has no geometry.
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint>;
}

impl<T: NearestPointQuery + ?Sized> NearestPointQuery for &T {
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint> {
        (**self).nearest_point(point)
    }
}

impl<T: NearestPointQuery + ?Sized> NearestPointQuery for Box<T> {
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint> {
        (**self).nearest_point(point)
    }
}

impl<T: NearestPointQuery + ?Sized> NearestPointQuery for Arc<T> {
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint> {
        (**self).nearest_point(point)
    }
}
