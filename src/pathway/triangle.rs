//! Triangle-mesh pathway: a corridor of triangular segments

use glam::Vec3;

use super::{PathRelation, Pathway, PathwayError, PolylinePathway};

/// One triangular segment of a mesh pathway
///
/// Stored as a vertex and two edge vectors, with the barycentric
/// determinant precomputed for closest-point queries.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub a: Vec3,
    /// Edge from A to B
    pub edge0: Vec3,
    /// Edge from A to C
    pub edge1: Vec3,

    determinant: f32,
    // filled in by TrianglePathway construction
    point_on_path: Vec3,
    tangent: Vec3,
}

impl Triangle {
    /// Build a triangle from its three vertices
    #[must_use]
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let edge0 = b - a;
        let edge1 = c - a;

        let edge0_length_squared = edge0.length_squared();
        let edge0_dot_edge1 = edge0.dot(edge1);
        let edge1_length_squared = edge1.dot(edge1);

        Self {
            a,
            edge0,
            edge1,
            determinant: (edge0_length_squared * edge1_length_squared)
                - (edge0_dot_edge1 * edge0_dot_edge1),
            point_on_path: Vec3::ZERO,
            tangent: Vec3::ZERO,
        }
    }
}

/// Closest point on a triangle and where it landed
#[derive(Debug, Clone, Copy)]
pub struct TrianglePoint {
    /// The closest point itself
    pub point: Vec3,
    /// Barycentric parameter along edge0
    pub s: f32,
    /// Barycentric parameter along edge1
    pub t: f32,
    /// True when the query point projects strictly inside the face
    pub inside: bool,
}

/// Closest point on a triangle to `source`, by case analysis of the
/// seven barycentric regions (face, three edges, three vertices)
#[must_use]
pub fn closest_point_on_triangle(triangle: &Triangle, source: Vec3) -> TrianglePoint {
    let v0 = triangle.a - source;

    let a = triangle.edge0.length_squared();
    let b = triangle.edge0.dot(triangle.edge1);
    let c = triangle.edge1.length_squared();
    let d = triangle.edge0.dot(v0);
    let e = triangle.edge1.dot(v0);

    let det = triangle.determinant;
    let mut s = (b * e) - (c * d);
    let mut t = (b * d) - (a * e);

    let mut inside = false;
    if s + t < det {
        if s < 0.0 {
            if t < 0.0 {
                if d < 0.0 {
                    s = (-d / a).clamp(0.0, 1.0);
                    t = 0.0;
                } else {
                    s = 0.0;
                    t = (-e / c).clamp(0.0, 1.0);
                }
            } else {
                s = 0.0;
                t = (-e / c).clamp(0.0, 1.0);
            }
        } else if t < 0.0 {
            s = (-d / a).clamp(0.0, 1.0);
            t = 0.0;
        } else {
            let inv_det = 1.0 / det;
            s *= inv_det;
            t *= inv_det;
            inside = true;
        }
    } else if s < 0.0 {
        let tmp0 = b + d;
        let tmp1 = c + e;
        if tmp1 > tmp0 {
            let numer = tmp1 - tmp0;
            let denom = a - (2.0 * b) + c;
            s = (numer / denom).clamp(0.0, 1.0);
            t = 1.0 - s;
        } else {
            t = (-e / c).clamp(0.0, 1.0);
            s = 0.0;
        }
    } else if t < 0.0 {
        if a + d > b + e {
            let numer = c + e - b - d;
            let denom = a - (2.0 * b) + c;
            s = (numer / denom).clamp(0.0, 1.0);
            t = 1.0 - s;
        } else {
            s = (-e / c).clamp(0.0, 1.0);
            t = 0.0;
        }
    } else {
        let numer = c + e - b - d;
        let denom = a - (2.0 * b) + c;
        s = (numer / denom).clamp(0.0, 1.0);
        t = 1.0 - s;
    }

    TrianglePoint {
        point: triangle.a + (s * triangle.edge0) + (t * triangle.edge1),
        s,
        t,
        inside,
    }
}

/// A pathway made of a sequence of triangles, navmesh style
///
/// There is no tube radius: the outside distance of a point is its
/// literal distance to the nearest triangle (negative when the point
/// projects inside a face). A centerline polyline through each
/// triangle's reference point provides distance parameterization.
#[derive(Debug, Clone)]
pub struct TrianglePathway {
    path: Vec<Triangle>,
    centerline: PolylinePathway,
}

impl TrianglePathway {
    /// Construct from a non-empty triangle sequence
    pub fn new(triangles: &[Triangle], cyclic: bool) -> Result<Self, PathwayError> {
        if triangles.is_empty() {
            return Err(PathwayError::Empty);
        }
        let mut path = triangles.to_vec();

        // reference point of each triangle: midpoint of edge0
        for triangle in &mut path {
            triangle.point_on_path = ((2.0 * triangle.a) + triangle.edge0) / 2.0;
        }

        // tangent of each triangle points at the next reference point
        for i in 0..path.len() {
            let next = if cyclic {
                (i + 1) % path.len()
            } else {
                (i + 1).min(path.len() - 1)
            };

            let to_next = path[next].point_on_path - path[i].point_on_path;
            let length = to_next.length();
            path[i].tangent = if length.abs() < f32::EPSILON {
                Vec3::ZERO
            } else {
                to_next / length
            };
        }

        let centers: Vec<Vec3> = path.iter().map(|t| t.point_on_path).collect();
        let centerline = PolylinePathway::new(&centers, 0.1, cyclic);

        Ok(Self { path, centerline })
    }

    /// The triangles of the path
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.path
    }

    /// Polyline through the triangle reference points
    #[must_use]
    pub fn centerline(&self) -> &PolylinePathway {
        &self.centerline
    }

    fn map_point_to_path_inner(&self, point: Vec3) -> (PathRelation, usize) {
        let mut distance_squared = f32::INFINITY;
        let mut closest_point = Vec3::ZERO;
        let mut inside = false;
        let mut segment_index = None;

        for (i, triangle) in self.path.iter().enumerate() {
            let candidate = closest_point_on_triangle(triangle, point);
            let d_squared = (point - candidate.point).length_squared();

            if d_squared < distance_squared {
                distance_squared = d_squared;
                closest_point = candidate.point;
                inside = candidate.inside;
                segment_index = Some(i);
            }

            if candidate.inside {
                break;
            }
        }

        // construction rejects empty meshes, so this only fires for
        // NaN-degenerate geometry, which is a caller bug
        let Some(index) = segment_index else {
            panic!("closest path segment not found (degenerate path mesh)");
        };

        let outside = distance_squared.sqrt() * if inside { -1.0 } else { 1.0 };
        (
            PathRelation {
                on_path: closest_point,
                tangent: self.path[index].tangent,
                outside,
            },
            index,
        )
    }
}

impl Pathway for TrianglePathway {
    fn map_point_to_path(&self, point: Vec3) -> PathRelation {
        self.map_point_to_path_inner(point).0
    }

    fn map_point_to_path_distance(&self, point: Vec3) -> f32 {
        self.centerline.map_point_to_path_distance(point)
    }

    fn map_path_distance_to_point(&self, path_distance: f32) -> Vec3 {
        self.centerline.map_path_distance_to_point(path_distance)
    }
}
