//! Obstacles vehicles can anticipate and steer around

use glam::Vec3;

use crate::math::Vec3Ext;
use crate::vehicle::Vehicle;

/// Any obstacle a vehicle can collide with
///
/// A closed set for now; spherical obstacles are the only shape the
/// avoidance behaviors reason about.
#[derive(Debug, Clone, Copy)]
pub enum Obstacle {
    Sphere(SphericalObstacle),
}

impl Obstacle {
    /// Distance along the vehicle's forward axis to the first
    /// intersection with this obstacle, if any
    #[must_use]
    pub fn next_intersection(&self, vehicle: &dyn Vehicle) -> Option<f32> {
        match self {
            Self::Sphere(sphere) => sphere.next_intersection(vehicle),
        }
    }

    /// Steering to avoid this obstacle, or zero when no collision is
    /// anticipated within `min_time_to_collision` seconds
    #[must_use]
    pub fn steer_to_avoid(&self, vehicle: &dyn Vehicle, min_time_to_collision: f32) -> Vec3 {
        match self {
            Self::Sphere(sphere) => sphere.steer_to_avoid(vehicle, min_time_to_collision),
        }
    }
}

impl From<SphericalObstacle> for Obstacle {
    fn from(sphere: SphericalObstacle) -> Self {
        Self::Sphere(sphere)
    }
}

/// A sphere fixed in space
#[derive(Debug, Clone, Copy)]
pub struct SphericalObstacle {
    pub center: Vec3,
    pub radius: f32,
}

impl SphericalObstacle {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance along the vehicle's forward axis to the first
    /// intersection with this sphere, if any
    ///
    /// The sphere is grown by the vehicle's own radius, so the result
    /// is the distance at which the two spheres touch. A vehicle
    /// already inside the grown sphere reports an intersection at
    /// distance zero.
    #[must_use]
    pub fn next_intersection(&self, vehicle: &dyn Vehicle) -> Option<f32> {
        // take the sphere into the vehicle's local space, where the
        // motion ray is the -Z axis; then solve the quadratic for the
        // ray/sphere intersection
        let local_center = vehicle.local_space().localize_position(self.center);
        let combined_radius = self.radius + vehicle.radius();

        let b = -2.0 * local_center.z;
        let c = local_center.length_squared() - (combined_radius * combined_radius);
        let d = (b * b) - (4.0 * c);

        // no real roots: the ray misses the sphere
        if d < 0.0 {
            return None;
        }

        let dd = d.sqrt();
        let p = (-b + dd) / 2.0;
        let q = (-b - dd) / 2.0;

        // both intersections behind the vehicle
        if p < 0.0 && q < 0.0 {
            return None;
        }

        // one behind and one ahead means we are inside the sphere
        if (p > 0.0 && q < 0.0) || (p < 0.0 && q > 0.0) {
            return Some(0.0);
        }

        Some(p.min(q))
    }

    /// Steer laterally away from this sphere when a collision is
    /// anticipated within `min_time_to_collision` seconds
    #[must_use]
    pub fn steer_to_avoid(&self, vehicle: &dyn Vehicle, min_time_to_collision: f32) -> Vec3 {
        let Some(distance) = self.next_intersection(vehicle) else {
            return Vec3::ZERO;
        };

        if distance > min_time_to_collision * vehicle.speed() {
            return Vec3::ZERO;
        }

        // steer away from the obstacle center, perpendicular to the
        // current heading
        let offset = vehicle.position() - self.center;
        let avoidance = offset.perpendicular_component(vehicle.forward());
        if avoidance.length_squared() > f32::EPSILON {
            avoidance
        } else {
            // dead ahead through the center; pick any lateral direction
            vehicle.forward().find_perpendicular_in_3d()
        }
    }
}
