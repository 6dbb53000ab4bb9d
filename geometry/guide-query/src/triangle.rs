//! Triangle-mesh guide surfaces.
//!
//! The wire the trainee follows is usually authored as a tube mesh. Queries
//! against it return points on the tube surface, not on its centerline.

use crate::{GuideError, NearestPoint, NearestPointQuery, Result, closest_point_on_segment};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compute the closest point on a triangle to a query point.
///
/// Classifies the query against the triangle's vertex, edge and face
/// Voronoi regions (Ericson, "Real-Time Collision Detection", 5.1.5). The
/// region determinants use fused multiply-add.
///
/// Degenerate triangles (repeated or collinear vertices) have no face
/// region; the closest point on their three edges is returned instead, so
/// the result is always finite for finite input.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn closest_point_on_triangle(
    p: Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;

    let area_sq = ab.cross(&ac).norm_squared();
    if area_sq <= f64::EPSILON * ab.norm_squared() * ac.norm_squared() {
        return closest_point_on_edges(p, [a, b, c]);
    }

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1.mul_add(d4, -(d3 * d2));
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5.mul_add(d2, -(d1 * d6));
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3.mul_add(d6, -(d5 * d4));
    let (e4, e5) = (d4 - d3, d5 - d6);
    if va <= 0.0 && e4 >= 0.0 && e5 >= 0.0 {
        return b + (c - b) * (e4 / (e4 + e5));
    }

    let inv = 1.0 / (va + vb + vc);
    a + ab * (vb * inv) + ac * (vc * inv)
}

/// Closest point to `p` on the three edges of a (degenerate) triangle.
fn closest_point_on_edges(p: Point3<f64>, [a, b, c]: [Point3<f64>; 3]) -> Point3<f64> {
    [(a, b), (b, c), (c, a)]
        .into_iter()
        .map(|(s, e)| closest_point_on_segment(p, s, e))
        .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
        .unwrap_or(a)
}

/// A static indexed triangle mesh used as a guide surface.
///
/// Queries are brute force over all faces; guide meshes for this task are a
/// few thousand triangles, well within a 5 ms cycle.
///
/// Deserialization goes through [`Self::try_new`], so a loaded mesh never
/// holds out-of-range face indices.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MeshData", into = "MeshData"))]
pub struct TriangleMeshGuide {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
}

/// Unvalidated serialized form of [`TriangleMeshGuide`].
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct MeshData {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
}

#[cfg(feature = "serde")]
impl TryFrom<MeshData> for TriangleMeshGuide {
    type Error = GuideError;

    fn try_from(data: MeshData) -> Result<Self> {
        Self::try_new(data.vertices, data.faces)
    }
}

#[cfg(feature = "serde")]
impl From<TriangleMeshGuide> for MeshData {
    fn from(mesh: TriangleMeshGuide) -> Self {
        Self {
            vertices: mesh.vertices,
            faces: mesh.faces,
        }
    }
}

impl TriangleMeshGuide {
    /// Create a mesh guide, validating every face index.
    ///
    /// An empty mesh is accepted; it answers every query with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::InvalidFaceIndex`] if a face references a
    /// missing vertex, or [`GuideError::NonFiniteVertex`] for `NaN`/`Inf`.
    pub fn try_new(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Result<Self> {
        if let Some(index) = vertices
            .iter()
            .position(|v| !v.coords.iter().all(|c| c.is_finite()))
        {
            return Err(GuideError::NonFiniteVertex { index });
        }

        let vertex_count = vertices.len();
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(GuideError::InvalidFaceIndex {
                    face,
                    vertex,
                    vertex_count,
                });
            }
        }

        Ok(Self { vertices, faces })
    }

    /// Get the mesh vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Get the mesh faces.
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Check whether the mesh has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn triangle(&self, [i, j, k]: [u32; 3]) -> [Point3<f64>; 3] {
        [
            self.vertices[i as usize],
            self.vertices[j as usize],
            self.vertices[k as usize],
        ]
    }
}

impl NearestPointQuery for TriangleMeshGuide {
    fn nearest_point(&self, point: Point3<f64>) -> Option<NearestPoint> {
        self.faces
            .iter()
            .map(|&face| {
                let [a, b, c] = self.triangle(face);
                NearestPoint::between(point, closest_point_on_triangle(point, a, b, c))
            })
            .filter(NearestPoint::is_finite)
            .min_by(|x, y| x.distance_squared.total_cmp(&y.distance_squared))
    }
}
