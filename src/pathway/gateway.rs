//! Gateway pathway: a corridor defined by gates to pass through

use glam::Vec3;

use super::{PathRelation, Pathway, PathwayError, PolylinePathway, Triangle, TrianglePathway};

/// One gate of a gateway pathway, a segment the path passes through
#[derive(Debug, Clone, Copy)]
pub struct Gateway {
    /// Left post
    pub a: Vec3,
    /// Right post
    pub b: Vec3,
}

impl Gateway {
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }
}

/// A path consisting of a series of gates which must be passed through
///
/// Consecutive gates are stitched into pairs of triangles, so queries
/// are answered by an underlying [`TrianglePathway`]. Gate winding is
/// corrected per pair: when a gate's A-to-B direction reverses against
/// the previous gate's, the triangulation flips to keep the corridor
/// from folding over itself.
#[derive(Debug, Clone)]
pub struct GatewayPathway {
    triangle_pathway: TrianglePathway,
}

impl GatewayPathway {
    /// Construct from at least two gates
    pub fn new(gateways: &[Gateway], cyclic: bool) -> Result<Self, PathwayError> {
        let mut triangles = Vec::with_capacity(gateways.len().saturating_sub(1) * 2);

        let mut previous: Option<(Gateway, Vec3)> = None;
        for gateway in gateways {
            let n = (gateway.b - gateway.a).normalize_or_zero();

            if let Some((prev, prev_n)) = previous {
                if n.dot(prev_n) < 0.0 {
                    triangles.push(Triangle::new(prev.a, prev.b, gateway.a));
                    triangles.push(Triangle::new(prev.a, gateway.a, gateway.b));
                } else {
                    triangles.push(Triangle::new(prev.a, prev.b, gateway.a));
                    triangles.push(Triangle::new(prev.b, gateway.a, gateway.b));
                }
            }

            previous = Some((*gateway, n));
        }

        Ok(Self {
            triangle_pathway: TrianglePathway::new(&triangles, cyclic)?,
        })
    }

    /// The stitched triangle corridor
    #[must_use]
    pub fn triangle_pathway(&self) -> &TrianglePathway {
        &self.triangle_pathway
    }

    /// Polyline through the corridor's triangle reference points
    #[must_use]
    pub fn centerline(&self) -> &PolylinePathway {
        self.triangle_pathway.centerline()
    }
}

impl Pathway for GatewayPathway {
    fn map_point_to_path(&self, point: Vec3) -> PathRelation {
        self.triangle_pathway.map_point_to_path(point)
    }

    fn map_point_to_path_distance(&self, point: Vec3) -> f32 {
        self.triangle_pathway.map_point_to_path_distance(point)
    }

    fn map_path_distance_to_point(&self, path_distance: f32) -> Vec3 {
        self.triangle_pathway.map_path_distance_to_point(path_distance)
    }
}
