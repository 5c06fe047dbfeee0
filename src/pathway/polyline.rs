//! Polyline pathway: a tube around a series of line segments

use glam::Vec3;

use super::{PathRelation, Pathway};

/// A path made of line segments between specified points
///
/// A radius defines a volume for the path: the union of a sphere at
/// each point and a cylinder along each segment.
#[derive(Debug, Clone)]
pub struct PolylinePathway {
    points: Vec<Vec3>,
    // per-segment unit tangents and lengths; index i describes the
    // segment ending at points[i], index 0 is unused
    tangents: Vec<Vec3>,
    lengths: Vec<f32>,
    radius: f32,
    cyclic: bool,
    total_path_length: f32,
}

impl PolylinePathway {
    /// Construct from a list of at least two points, a tube radius and
    /// a cyclic flag
    ///
    /// Cyclic paths get an implicit closing segment back to the first
    /// point.
    #[must_use]
    pub fn new(points: &[Vec3], radius: f32, cyclic: bool) -> Self {
        let point_count = if cyclic { points.len() + 1 } else { points.len() };

        let mut path = Self {
            points: Vec::with_capacity(point_count),
            tangents: vec![Vec3::ZERO; point_count],
            lengths: vec![0.0; point_count],
            radius,
            cyclic,
            total_path_length: 0.0,
        };

        for i in 0..point_count {
            // copy in point locations, closing the cycle when appropriate
            let close_cycle = cyclic && i == point_count - 1;
            let j = if close_cycle { 0 } else { i };
            path.points.push(points[j]);

            // for the end of each segment, compute its length and the
            // normalized vector parallel to it
            if i > 0 {
                let segment = path.points[i] - path.points[i - 1];
                let length = segment.length();
                path.lengths[i] = length;
                path.tangents[i] = segment / length;
                path.total_path_length += length;
            }
        }

        log::debug!(
            "polyline pathway: {} points, length {:.3}, radius {}, cyclic {}",
            path.points.len(),
            path.total_path_length,
            radius,
            cyclic
        );

        path
    }

    /// Points of the polyline (with the closing point when cyclic)
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Tube radius
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether the path wraps back to its first point
    #[must_use]
    pub fn cyclic(&self) -> bool {
        self.cyclic
    }

    /// Sum of all segment lengths
    #[must_use]
    pub fn total_path_length(&self) -> f32 {
        self.total_path_length
    }
}

impl Pathway for PolylinePathway {
    fn map_point_to_path(&self, point: Vec3) -> PathRelation {
        let mut min_distance = f32::MAX;
        let mut on_path = Vec3::ZERO;
        let mut tangent = Vec3::ZERO;

        // loop over all segments, find the one nearest to the point
        for i in 1..self.points.len() {
            let projection = point_to_segment_distance(
                point,
                self.points[i - 1],
                self.points[i],
                self.tangents[i],
                self.lengths[i],
            );
            if projection.distance < min_distance {
                min_distance = projection.distance;
                on_path = projection.chosen;
                tangent = self.tangents[i];
            }
        }

        // measure how far the original point is outside the tube
        let outside = on_path.distance(point) - self.radius;

        PathRelation {
            on_path,
            tangent,
            outside,
        }
    }

    fn map_point_to_path_distance(&self, point: Vec3) -> f32 {
        let mut min_distance = f32::MAX;
        let mut segment_length_total = 0.0;
        let mut path_distance = 0.0;

        for i in 1..self.points.len() {
            let projection = point_to_segment_distance(
                point,
                self.points[i - 1],
                self.points[i],
                self.tangents[i],
                self.lengths[i],
            );
            if projection.distance < min_distance {
                min_distance = projection.distance;
                path_distance = segment_length_total + projection.segment_projection;
            }
            segment_length_total += self.lengths[i];
        }

        path_distance
    }

    fn map_path_distance_to_point(&self, path_distance: f32) -> Vec3 {
        // clip or wrap the given path distance according to the cyclic flag
        let mut remaining = path_distance;
        if self.cyclic {
            remaining = path_distance % self.total_path_length;
        } else {
            if path_distance < 0.0 {
                return self.points[0];
            }
            if path_distance >= self.total_path_length {
                return self.points[self.points.len() - 1];
            }
        }

        // step through segments, subtracting off segment lengths until
        // locating the one containing the original path distance, then
        // interpolate along it
        let mut result = Vec3::ZERO;
        for i in 1..self.points.len() {
            if self.lengths[i] < remaining {
                remaining -= self.lengths[i];
            } else {
                let ratio = remaining / self.lengths[i];
                result = self.points[i - 1].lerp(self.points[i], ratio);
                break;
            }
        }
        result
    }
}

struct SegmentProjection {
    distance: f32,
    chosen: Vec3,
    segment_projection: f32,
}

fn point_to_segment_distance(
    point: Vec3,
    ep0: Vec3,
    ep1: Vec3,
    segment_tangent: Vec3,
    segment_length: f32,
) -> SegmentProjection {
    // convert the test point to be local to ep0, then project onto the
    // segment's tangent
    let local = point - ep0;
    let projection = segment_tangent.dot(local);

    // when the projection is not on the segment, the nearest point is
    // one of the endpoints
    if projection < 0.0 {
        return SegmentProjection {
            distance: point.distance(ep0),
            chosen: ep0,
            segment_projection: 0.0,
        };
    }
    if projection > segment_length {
        return SegmentProjection {
            distance: point.distance(ep1),
            chosen: ep1,
            segment_projection: segment_length,
        };
    }

    // otherwise the nearest point is the projection onto the segment
    let chosen = ep0 + (segment_tangent * projection);
    SegmentProjection {
        distance: point.distance(chosen),
        chosen,
        segment_projection: projection,
    }
}
