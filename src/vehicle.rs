//! Vehicle capability trait and the simple kinematic model
//!
//! `Vehicle` is the polymorphism boundary of the crate: any body that
//! exposes a local space, speed and limits can participate in pursuit,
//! flocking and avoidance. `SimpleVehicle` is the reference kinematic
//! model, integrating steering forces under force/speed limits with
//! acceleration smoothing.

use glam::Vec3;
use rand::Rng;

use crate::annotation::{Annotation, colors};
use crate::local_space::LocalSpace;
use crate::math::{Vec3Ext, blend_into_accumulator, random_unit_vector_on_xz_plane};

/// Capability interface consumed by steering behaviors and the
/// proximity database
pub trait Vehicle {
    /// The vehicle's orientation frame and position
    fn local_space(&self) -> &LocalSpace;

    /// Speed along the forward axis
    fn speed(&self) -> f32;

    /// Radius of the bounding sphere, for avoidance
    fn radius(&self) -> f32;

    /// Maximum steering force magnitude
    fn max_force(&self) -> f32;

    /// Maximum speed
    fn max_speed(&self) -> f32;

    /// Best estimate of this body's position `prediction_time` seconds
    /// from now
    fn predict_future_position(&self, prediction_time: f32) -> Vec3 {
        self.position() + (self.velocity() * prediction_time)
    }

    /// World position
    fn position(&self) -> Vec3 {
        self.local_space().position
    }

    /// Forward-pointing unit basis vector
    fn forward(&self) -> Vec3 {
        self.local_space().forward
    }

    /// Side-pointing unit basis vector
    fn side(&self) -> Vec3 {
        self.local_space().side
    }

    /// Upward-pointing unit basis vector
    fn up(&self) -> Vec3 {
        self.local_space().up
    }

    /// Velocity; local space is velocity-aligned, so this is always
    /// `forward * speed`
    fn velocity(&self) -> Vec3 {
        self.forward() * self.speed()
    }
}

/// A kinematic body: local space plus motion state and limits
///
/// Each simulation tick the owner combines steering behavior outputs
/// into a single force and feeds it to [`SimpleVehicle::apply_steering_force`].
#[derive(Debug, Clone)]
pub struct SimpleVehicle {
    /// Orientation frame, kept velocity-aligned
    pub local_space: LocalSpace,
    /// Mass; defaults to one so acceleration equals force
    pub mass: f32,
    /// Speed along the forward axis
    pub speed: f32,
    /// Bounding sphere radius
    pub radius: f32,
    /// Steering force is clipped to this magnitude
    pub max_force: f32,
    /// Velocity is clipped to this magnitude
    pub max_speed: f32,

    // smoothed acceleration, damping abrupt force changes
    acceleration: Vec3,
    smoothed_position: Vec3,
    curvature: f32,
    smoothed_curvature: f32,
    last_forward: Vec3,
    last_position: Vec3,
}

impl SimpleVehicle {
    /// Create a vehicle with default state
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_space: LocalSpace::new(),
            mass: 1.0,
            speed: 0.0,
            radius: 0.5,
            max_force: 0.1,
            max_speed: 1.0,
            acceleration: Vec3::ZERO,
            smoothed_position: Vec3::ZERO,
            curvature: 0.0,
            smoothed_curvature: 0.0,
            last_forward: Vec3::ZERO,
            last_position: Vec3::ZERO,
        }
    }

    /// Reset all state to defaults
    pub fn reset(&mut self) {
        self.local_space.reset();
        self.mass = 1.0;
        self.speed = 0.0;
        self.radius = 0.5;
        self.reset_acceleration();
        self.reset_smoothed_position(Vec3::ZERO);
        self.reset_smoothed_curvature(0.0);
    }

    /// Smoothed acceleration from recent updates
    #[must_use]
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Exponentially smoothed running average of recent positions
    #[must_use]
    pub fn smoothed_position(&self) -> Vec3 {
        self.smoothed_position
    }

    /// Instantaneous path curvature (1 / turning radius), signed by
    /// turn direction
    #[must_use]
    pub fn curvature(&self) -> f32 {
        self.curvature
    }

    /// Exponentially smoothed curvature
    #[must_use]
    pub fn smoothed_curvature(&self) -> f32 {
        self.smoothed_curvature
    }

    pub fn reset_acceleration(&mut self) {
        self.acceleration = Vec3::ZERO;
    }

    pub fn reset_smoothed_position(&mut self, value: Vec3) {
        self.smoothed_position = value;
    }

    pub fn reset_smoothed_curvature(&mut self, value: f32) {
        self.last_forward = Vec3::ZERO;
        self.last_position = Vec3::ZERO;
        self.curvature = value;
        self.smoothed_curvature = value;
    }

    /// Apply a steering force to our momentum for one time step,
    /// adjusting orientation to maintain velocity alignment
    pub fn apply_steering_force(&mut self, force: Vec3, elapsed_time: f32) {
        let adjusted_force = self.adjust_raw_steering_force(force);

        // enforce limit on magnitude of steering force
        let clipped_force = adjusted_force.truncate_length(self.max_force);

        // compute acceleration and velocity
        let new_acceleration = clipped_force / self.mass;
        let mut new_velocity = self.velocity();

        // damp out abrupt changes and oscillations in steering
        // acceleration (rate is proportional to time step, clipped
        // into a useful range)
        if elapsed_time > 0.0 {
            let smooth_rate = (9.0 * elapsed_time).clamp(0.15, 0.4);
            blend_into_accumulator(smooth_rate, new_acceleration, &mut self.acceleration);
        }

        // Euler integrate (per frame) acceleration into velocity,
        // then enforce the speed limit
        new_velocity += self.acceleration * elapsed_time;
        new_velocity = new_velocity.truncate_length(self.max_speed);

        self.speed = new_velocity.length();

        // Euler integrate (per frame) velocity into position
        self.local_space.position += new_velocity * elapsed_time;

        // regenerate local space: align the forward axis with the new
        // velocity
        self.regenerate_local_space(new_velocity);

        // maintain path curvature information
        self.measure_path_curvature(elapsed_time);

        // running average of recent positions
        blend_into_accumulator(
            elapsed_time * 0.06,
            self.local_space.position,
            &mut self.smoothed_position,
        );
    }

    /// Default orientation update: keep forward parallel to velocity,
    /// changing up as little as possible
    fn regenerate_local_space(&mut self, new_velocity: Vec3) {
        if self.speed > 0.0 {
            self.local_space
                .regenerate_orthonormal_basis_uf(new_velocity / self.speed);
        }
    }

    /// Alternate orientation update: keep forward parallel to velocity
    /// and tilt up toward the net of a global righting force and the
    /// lateral turning acceleration, banking the turn like an aircraft
    pub fn regenerate_local_space_for_banking(
        &mut self,
        new_velocity: Vec3,
        elapsed_time: f32,
        annotation: &mut dyn Annotation,
    ) {
        // the length of this global-upward-pointing vector controls the
        // vehicle's tendency to right itself as it rolls over from
        // turning acceleration
        let global_up = Vec3::new(0.0, 0.2, 0.0);

        // acceleration points toward the center of local path
        // curvature; its length determines how much the vehicle rolls
        // while turning
        let accel_up = self.acceleration * 0.05;

        // combined banking, sum of up due to turning and global up
        let bank_up = accel_up + global_up;

        // blend bank_up into the vehicle's up basis vector
        let smooth_rate = elapsed_time * 3.0;
        let mut temp_up = self.local_space.up;
        blend_into_accumulator(smooth_rate, bank_up, &mut temp_up);
        self.local_space.up = temp_up.normalize();

        let position = self.local_space.position;
        annotation.line(position, position + (global_up * 4.0), colors::WHITE);
        annotation.line(position, position + (bank_up * 4.0), colors::ORANGE);
        annotation.line(position, position + (accel_up * 4.0), colors::RED);
        annotation.line(position, position + self.local_space.up, colors::GOLD);

        // adjust the basis vectors to be aligned with the new velocity
        if self.speed > 0.0 {
            self.local_space
                .regenerate_orthonormal_basis_uf(new_velocity / self.speed);
        }
    }

    /// Adjust the raw steering force before it is applied
    ///
    /// Below 20% of max speed, steering that deviates from the current
    /// forward direction is progressively clipped toward a forward-only
    /// cone, preventing backward-facing steering from spinning a
    /// near-stationary vehicle in place.
    fn adjust_raw_steering_force(&self, force: Vec3) -> Vec3 {
        let max_adjusted_speed = 0.2 * self.max_speed;

        if self.speed > max_adjusted_speed || force == Vec3::ZERO {
            return force;
        }

        // cosine ramps from +1 (forward only) at zero speed to -1
        // (unrestricted) at the adjusted-speed threshold
        let range = self.speed / max_adjusted_speed;
        let cosine = 1.0 - (2.0 * range.powi(20));
        force.limit_max_deviation_angle(cosine, self.local_space.forward)
    }

    /// Apply a braking force for one time step
    ///
    /// Never brakes harder than `max_force` allows, and never drives
    /// speed below zero.
    pub fn apply_braking_force(&mut self, rate: f32, elapsed_time: f32) {
        let raw_braking = self.speed * rate;
        let clip_braking = raw_braking.min(self.max_force);
        self.speed = (self.speed - (clip_braking * elapsed_time)).max(0.0);
    }

    /// Set a random heading on the XZ plane, keeping up global Y
    pub fn randomize_heading_on_xz_plane(&mut self, rng: &mut impl Rng) {
        self.local_space.up = Vec3::Y;
        self.local_space.forward = random_unit_vector_on_xz_plane(rng);
        self.local_space.side = self.local_space.forward.cross(self.local_space.up);
    }

    /// Measure path curvature (1 / turning radius) and maintain a
    /// smoothed version
    fn measure_path_curvature(&mut self, elapsed_time: f32) {
        if elapsed_time <= 0.0 {
            return;
        }

        let d_position = self.last_position - self.local_space.position;
        let travel = d_position.length();
        if travel > f32::EPSILON {
            let d_forward = (self.last_forward - self.local_space.forward) / travel;
            let lateral = d_forward.perpendicular_component(self.local_space.forward);
            let sign = if lateral.dot(self.local_space.side) < 0.0 {
                1.0
            } else {
                -1.0
            };
            self.curvature = lateral.length() * sign;
            blend_into_accumulator(elapsed_time * 4.0, self.curvature, &mut self.smoothed_curvature);
        }
        self.last_forward = self.local_space.forward;
        self.last_position = self.local_space.position;
    }
}

impl Default for SimpleVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl Vehicle for SimpleVehicle {
    fn local_space(&self) -> &LocalSpace {
        &self.local_space
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn max_force(&self) -> f32 {
        self.max_force
    }

    fn max_speed(&self) -> f32 {
        self.max_speed
    }
}
