//! Optional visualization sink
//!
//! Steering behaviors can describe what they are doing (lines, circles,
//! semantic events) through this trait. Every method is a default no-op,
//! so the simulation math carries no rendering dependency; a host that
//! wants debug drawing implements the subset it cares about.

use glam::Vec3;

use crate::vehicle::Vehicle;

/// Colors used by the built-in annotation calls, as linear RGB
pub mod colors {
    use glam::Vec3;

    pub const WHITE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const ORANGE: Vec3 = Vec3::new(1.0, 165.0 / 255.0, 0.0);
    pub const GOLD: Vec3 = Vec3::new(1.0, 215.0 / 255.0, 0.0);
    pub const DARK_GRAY: Vec3 = Vec3::new(87.0 / 255.0, 87.0 / 255.0, 87.0 / 255.0);
}

/// Sink for annotation data emitted by steering behaviors
#[allow(unused_variables)]
pub trait Annotation {
    /// Draw a line segment with the given color
    fn line(&mut self, start: Vec3, end: Vec3, color: Vec3) {}

    /// General circle/disk drawing; the convenience variants below
    /// all funnel through this
    fn circle_or_disk(
        &mut self,
        radius: f32,
        axis: Vec3,
        center: Vec3,
        color: Vec3,
        segments: u32,
        filled: bool,
        in_3d: bool,
    ) {
    }

    /// Draw a circle on the XZ plane
    fn circle_xz(&mut self, radius: f32, center: Vec3, color: Vec3, segments: u32) {
        self.circle_or_disk(radius, Vec3::ZERO, center, color, segments, false, false);
    }

    /// Draw a filled disk on the XZ plane
    fn disk_xz(&mut self, radius: f32, center: Vec3, color: Vec3, segments: u32) {
        self.circle_or_disk(radius, Vec3::ZERO, center, color, segments, true, false);
    }

    /// Draw a circle about an arbitrary axis
    fn circle_3d(&mut self, radius: f32, center: Vec3, axis: Vec3, color: Vec3, segments: u32) {
        self.circle_or_disk(radius, axis, center, color, segments, false, true);
    }

    /// Draw a filled disk about an arbitrary axis
    fn disk_3d(&mut self, radius: f32, center: Vec3, axis: Vec3, color: Vec3, segments: u32) {
        self.circle_or_disk(radius, axis, center, color, segments, true, true);
    }

    /// Obstacle avoidance fired; the corridor checked had this length
    fn avoid_obstacle(&mut self, min_distance_to_collision: f32) {}

    /// Path following steered toward a target point
    fn path_following(&mut self, future: Vec3, on_path: Vec3, target: Vec3, outside: f32) {}

    /// A hard close-neighbor avoidance fired against `other`
    fn avoid_close_neighbor(&mut self, other: &dyn Vehicle, additional_distance: f32) {}

    /// Neighbor collision avoidance fired against `threat`
    fn avoid_neighbor(&mut self, threat: &dyn Vehicle, steer: f32, our_future: Vec3, threat_future: Vec3) {}

    /// Report a vehicle's velocity and acceleration for this frame
    fn velocity_acceleration(&mut self, vehicle: &dyn Vehicle) {}
}

/// Annotation sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnnotation;

impl Annotation for NullAnnotation {}

/// Ring buffer of recent positions, recorded at a fixed interval
///
/// Purely annotation data for drawing motion trails; never consulted by
/// the simulation.
#[derive(Debug, Clone)]
pub struct Trail {
    positions: Vec<Vec3>,
    /// Seconds between recorded samples
    sample_interval: f32,
    last_sample_time: f32,
    /// Index of the next slot to overwrite
    cursor: usize,
    /// Number of valid samples (saturates at capacity)
    len: usize,
}

impl Trail {
    /// Create a trail covering `duration` seconds with `capacity` samples
    #[must_use]
    pub fn new(duration: f32, capacity: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; capacity.max(1)],
            sample_interval: duration / capacity.max(1) as f32,
            last_sample_time: 0.0,
            cursor: 0,
            len: 0,
        }
    }

    /// Record a position if the sampling interval has elapsed
    pub fn record(&mut self, current_time: f32, position: Vec3) {
        if self.len > 0 && current_time < self.last_sample_time + self.sample_interval {
            return;
        }
        self.positions[self.cursor] = position;
        self.cursor = (self.cursor + 1) % self.positions.len();
        self.len = (self.len + 1).min(self.positions.len());
        self.last_sample_time = current_time;
    }

    /// Forget all recorded samples
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.len = 0;
        self.last_sample_time = 0.0;
    }

    /// Recorded samples, oldest first
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let capacity = self.positions.len();
        let start = (self.cursor + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.positions[(start + i) % capacity])
    }

    /// Number of recorded samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
