//! Pathway geometry
//!
//! Paths a vehicle can follow: polyline "tubes", triangle-mesh
//! corridors, and gateway-defined corridors derived from them. All
//! variants support projecting an arbitrary point onto the path,
//! mapping points to a scalar distance along the path, and mapping a
//! path distance back to a point.

mod gateway;
mod polyline;
mod triangle;

use glam::Vec3;

pub use gateway::{Gateway, GatewayPathway};
pub use polyline::PolylinePathway;
pub use triangle::{Triangle, TrianglePathway, TrianglePoint, closest_point_on_triangle};

/// Result of projecting a point onto a path
#[derive(Debug, Clone, Copy)]
pub struct PathRelation {
    /// Nearest point on the path
    pub on_path: Vec3,
    /// Path tangent direction at that point
    pub tangent: Vec3,
    /// Signed distance outside the path volume; negative means inside
    pub outside: f32,
}

/// A path through space that vehicles can follow
pub trait Pathway {
    /// Project a point onto the path
    fn map_point_to_path(&self, point: Vec3) -> PathRelation;

    /// Distance along the path of the point's projection
    fn map_point_to_path_distance(&self, point: Vec3) -> f32;

    /// Point at a given distance along the path
    ///
    /// Cyclic paths wrap the distance modulo the total path length;
    /// non-cyclic paths clamp to the endpoints.
    fn map_path_distance_to_point(&self, path_distance: f32) -> Vec3;

    /// Signed distance of `point` outside the path volume
    fn how_far_outside_path(&self, point: Vec3) -> f32 {
        self.map_point_to_path(point).outside
    }

    /// True when `point` lies inside the path volume
    fn is_inside_path(&self, point: Vec3) -> bool {
        self.how_far_outside_path(point) < 0.0
    }
}

/// Errors constructing a pathway from malformed geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathwayError {
    /// The path contains no usable geometry
    Empty,
}

impl std::fmt::Display for PathwayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "path contains no geometry"),
        }
    }
}

impl std::error::Error for PathwayError {}
