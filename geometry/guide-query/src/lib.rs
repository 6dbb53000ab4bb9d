//! Nearest-point queries against static guide geometry.
//!
//! Guidance engines that pull a tool onto a path need exactly one thing from
//! the path's geometry: "where is the guide closest to this point?". This
//! crate defines that seam and ships two in-memory providers:
//!
//! - [`PolylineGuide`] - A wire centerline as connected segments
//! - [`TriangleMeshGuide`] - A wire surface as an indexed triangle mesh
//!
//! # Core Trait
//!
//! Every provider implements [`NearestPointQuery`], which returns a
//! [`NearestPoint`] (closest point plus squared distance), or `None` when the
//! guide has nothing to answer with. The guide is never mutated by a query.
//!
//! # Example
//!
//! ```
//! use guide_query::{NearestPointQuery, PolylineGuide};
//! use nalgebra::Point3;
//!
//! let wire = PolylineGuide::try_new(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.05, 0.0, 0.0),
//! ])
//! .unwrap();
//!
//! let hit = wire.nearest_point(Point3::new(0.02, 0.003, 0.0)).unwrap();
//! assert!((hit.distance() - 0.003).abs() < 1e-12);
//! ```
//!
//! # Coordinate System
//!
//! Units are whatever the caller's poses use (meters for the surgical
//! training rig). Coordinates are right-handed.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for all types

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]

mod error;
mod polyline;
mod traits;
mod triangle;

pub use error::GuideError;
pub use polyline::{PolylineGuide, closest_point_on_segment};
pub use traits::{NearestPoint, NearestPointQuery};
pub use triangle::{TriangleMeshGuide, closest_point_on_triangle};

// Re-export nalgebra types for convenience
pub use nalgebra::Point3;

/// Result type for guide construction.
pub type Result<T> = std::result::Result<T, GuideError>;
