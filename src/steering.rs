//! Steering behaviors
//!
//! Pure functions mapping vehicle state plus targets, neighbors,
//! obstacles, paths or flow fields to a desired steering force. The
//! caller combines behavior outputs and feeds the sum to the vehicle's
//! kinematic update; nothing here mutates the vehicle.
//!
//! Numerical degeneracies (zero-length offsets, zero relative speed)
//! are guarded and yield a zero vector rather than `NaN`.

use glam::Vec3;
use rand::Rng;

use crate::annotation::{Annotation, colors};
use crate::flow_field::FlowField;
use crate::math::{Vec3Ext, interval_comparison, scalar_random_walk};
use crate::obstacle::Obstacle;
use crate::pathway::Pathway;
use crate::vehicle::Vehicle;

/// Estimated-intercept-time factors for pursuit, the cross product of
/// the quarry being [behind, aside, ahead] of us (rows) and heading
/// [anti-parallel, perpendicular, parallel] to us (columns)
const PURSUIT_FACTORS: [[f32; 3]; 3] = [
    [2.0, 2.0, 0.5],  // behind
    [4.0, 0.8, 1.0],  // aside
    [0.85, 1.8, 4.0], // ahead
];

/// Persistent state for [`steer_for_wander`]: the current point of the
/// bounded random walk on the side and up axes
#[derive(Debug, Clone, Copy, Default)]
pub struct WanderState {
    pub side: f32,
    pub up: f32,
}

/// Random meandering: a pure lateral steering vector whose side and up
/// weights take a bounded random walk in `[-1, 1]`
pub fn steer_for_wander(
    vehicle: &dyn Vehicle,
    elapsed_time: f32,
    state: &mut WanderState,
    rng: &mut impl Rng,
) -> Vec3 {
    let walk_speed = 12.0 * elapsed_time;
    state.side = scalar_random_walk(state.side, walk_speed, -1.0, 1.0, rng);
    state.up = scalar_random_walk(state.up, walk_speed, -1.0, 1.0, rng);

    (vehicle.side() * state.side) + (vehicle.up() * state.up)
}

/// Steer directly toward a target position
#[must_use]
pub fn steer_for_seek(vehicle: &dyn Vehicle, target: Vec3, max_speed: f32) -> Vec3 {
    let offset = target - vehicle.position();
    let desired_velocity = offset.truncate_length(max_speed);
    desired_velocity - vehicle.velocity()
}

/// Steer directly away from a target position
#[must_use]
pub fn steer_for_flee(vehicle: &dyn Vehicle, target: Vec3, max_speed: f32) -> Vec3 {
    let offset = vehicle.position() - target;
    let desired_velocity = offset.truncate_length(max_speed);
    desired_velocity - vehicle.velocity()
}

/// Seek with a speed ramp: desired speed falls linearly to zero over
/// the final `slowing_distance`, so the vehicle stops at the target
#[must_use]
pub fn steer_for_arrival(
    vehicle: &dyn Vehicle,
    target: Vec3,
    max_speed: f32,
    slowing_distance: f32,
) -> Vec3 {
    let offset = target - vehicle.position();
    let distance = offset.length();
    if distance < f32::EPSILON {
        return -vehicle.velocity();
    }

    let ramped_speed = max_speed * (distance / slowing_distance);
    let clipped_speed = ramped_speed.min(max_speed);
    let desired_velocity = (clipped_speed / distance) * offset;
    desired_velocity - vehicle.velocity()
}

/// Steer to intercept a moving quarry
///
/// Estimates time-to-intercept from the direct travel time scaled by a
/// factor chosen from the quarry's bearing (behind, aside or ahead of
/// us) and heading (anti-parallel, perpendicular or parallel to ours),
/// then seeks the quarry's predicted position at that time.
pub fn steer_for_pursuit(
    vehicle: &dyn Vehicle,
    quarry: &dyn Vehicle,
    max_prediction_time: f32,
    max_speed: f32,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    let offset = quarry.position() - vehicle.position();
    let distance = offset.length();
    if distance < f32::EPSILON {
        return Vec3::ZERO;
    }
    let unit_offset = offset / distance;

    // how parallel are the quarry's path and ours
    // (1 parallel, 0 perpendicular, -1 anti-parallel)
    let parallelness = vehicle.forward().dot(quarry.forward());

    // how "forward" is the direction to the quarry
    // (1 dead ahead, 0 directly to the side, -1 straight back)
    let forwardness = vehicle.forward().dot(unit_offset);

    let direct_travel_time = distance / vehicle.speed().max(0.001);
    let f = interval_comparison(forwardness, -0.707, 0.707);
    let p = interval_comparison(parallelness, -0.707, 0.707);

    let time_factor = PURSUIT_FACTORS[(f + 1) as usize][(p + 1) as usize];

    // estimated time until intercept of quarry, limited so a slow
    // pursuer does not aim at wildly extrapolated positions
    let intercept_time = (direct_travel_time * time_factor).min(max_prediction_time);

    let target = quarry.predict_future_position(intercept_time);
    annotation.line(vehicle.position(), target, colors::DARK_GRAY);

    steer_for_seek(vehicle, target, max_speed)
}

/// Steer to escape a moving menace, fleeing its predicted position
#[must_use]
pub fn steer_for_evasion(
    vehicle: &dyn Vehicle,
    menace: &dyn Vehicle,
    max_prediction_time: f32,
    max_speed: f32,
) -> Vec3 {
    let offset = menace.position() - vehicle.position();
    let distance = offset.length();

    // a stationary menace gets the full prediction horizon rather
    // than a division by zero
    let prediction_time = if menace.speed() < f32::EPSILON {
        max_prediction_time
    } else {
        (distance / menace.speed()).min(max_prediction_time)
    };

    let target = menace.predict_future_position(prediction_time);
    steer_for_flee(vehicle, target, max_speed)
}

/// Maintain a given speed: a max-force-clipped steering force along the
/// forward/backward axis
#[must_use]
pub fn steer_for_target_speed(vehicle: &dyn Vehicle, target_speed: f32, max_force: f32) -> Vec3 {
    let speed_error = target_speed - vehicle.speed();
    vehicle.forward() * speed_error.clamp(-max_force, max_force)
}

/// Separation component of flocking: steer away from neighbors with a
/// 1/distance falloff, averaged and normalized to a pure direction
pub fn steer_for_separation<'a>(
    vehicle: &dyn Vehicle,
    max_distance: f32,
    cos_max_angle: f32,
    flock: impl IntoIterator<Item = &'a dyn Vehicle>,
) -> Vec3 {
    let mut steering = Vec3::ZERO;
    let mut neighbors = 0;

    for other in flock {
        if !is_in_boid_neighborhood(vehicle, other, vehicle.radius() * 3.0, max_distance, cos_max_angle) {
            continue;
        }

        // opposite of the offset direction, divided once by distance
        // to normalize, divided another time to get 1/d falloff
        let offset = other.position() - vehicle.position();
        let distance_squared = offset.dot(offset);
        steering += offset / -distance_squared;

        neighbors += 1;
    }

    if neighbors > 0 {
        steering = (steering / neighbors as f32).normalize_or_zero();
    }
    steering
}

/// Alignment component of flocking: steer toward the average heading
/// of neighbors
pub fn steer_for_alignment<'a>(
    vehicle: &dyn Vehicle,
    max_distance: f32,
    cos_max_angle: f32,
    flock: impl IntoIterator<Item = &'a dyn Vehicle>,
) -> Vec3 {
    let mut steering = Vec3::ZERO;
    let mut neighbors = 0;

    for other in flock {
        if !is_in_boid_neighborhood(vehicle, other, vehicle.radius() * 3.0, max_distance, cos_max_angle) {
            continue;
        }
        steering += other.forward();
        neighbors += 1;
    }

    // subtract off current heading to get an error-correcting
    // direction, then normalize unless the error is negligible
    if neighbors > 0 {
        steering = (steering / neighbors as f32) - vehicle.forward();
        let length = steering.length();
        if length > 0.025 {
            steering /= length;
        }
    }
    steering
}

/// Cohesion component of flocking: steer toward the average position
/// of neighbors
pub fn steer_for_cohesion<'a>(
    vehicle: &dyn Vehicle,
    max_distance: f32,
    cos_max_angle: f32,
    flock: impl IntoIterator<Item = &'a dyn Vehicle>,
) -> Vec3 {
    let mut steering = Vec3::ZERO;
    let mut neighbors = 0;

    for other in flock {
        if !is_in_boid_neighborhood(vehicle, other, vehicle.radius() * 3.0, max_distance, cos_max_angle) {
            continue;
        }
        steering += other.position();
        neighbors += 1;
    }

    if neighbors > 0 {
        steering = ((steering / neighbors as f32) - vehicle.position()).normalize_or_zero();
    }
    steering
}

/// Hard steer away from any other agent within a critical distance
///
/// First offender wins (not nearest): any other vehicle whose
/// center-to-center distance is below `min_separation_distance` plus
/// the sum of radii triggers a full perpendicular push away.
pub fn steer_to_avoid_close_neighbors<'a>(
    vehicle: &dyn Vehicle,
    min_separation_distance: f32,
    others: impl IntoIterator<Item = &'a dyn Vehicle>,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    for other in others {
        if std::ptr::addr_eq(other, vehicle) {
            continue;
        }

        let sum_of_radii = vehicle.radius() + other.radius();
        let min_center_to_center = min_separation_distance + sum_of_radii;
        let offset = other.position() - vehicle.position();

        if offset.length() < min_center_to_center {
            annotation.avoid_close_neighbor(other, min_separation_distance);
            return (-offset).perpendicular_component(vehicle.forward());
        }
    }

    Vec3::ZERO
}

/// Unaligned collision avoidance: find the other vehicle we would
/// collide with first and steer laterally to avoid the site of that
/// potential collision
///
/// Interpenetration is prevented first via
/// [`steer_to_avoid_close_neighbors`]. Otherwise the earliest threat
/// whose nearest-approach separation is below twice our radius is
/// selected, and the steer direction depends on how the paths cross:
/// head-on threats are dodged by their predicted position, parallel
/// ones by their current position, and on perpendicular paths only the
/// slower vehicle yields, steering behind the threat. The result is a
/// unit lateral force (`side * ±1`), not magnitude-weighted.
pub fn steer_to_avoid_neighbors<'a>(
    vehicle: &dyn Vehicle,
    min_time_to_collision: f32,
    others: impl IntoIterator<Item = &'a dyn Vehicle> + Clone,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    // first priority is to prevent immediate interpenetration
    let separation = steer_to_avoid_close_neighbors(vehicle, 0.0, others.clone(), annotation);
    if separation != Vec3::ZERO {
        return separation;
    }

    let mut steer = 0.0;
    let mut threat: Option<&dyn Vehicle> = None;

    // time until the most immediate collision threat found so far;
    // initially a threshold: look no further into the future than this
    let mut min_time = min_time_to_collision;

    let mut our_position_at_nearest_approach = Vec3::ZERO;
    let mut threat_position_at_nearest_approach = Vec3::ZERO;

    for other in others {
        if std::ptr::addr_eq(other, vehicle) {
            continue;
        }

        // avoid when future positions are this close (or less)
        let collision_danger_threshold = vehicle.radius() * 2.0;

        let time = predict_nearest_approach_time(vehicle, other);
        if time >= 0.0 && time < min_time {
            let (distance, our_final, other_final) =
                compute_nearest_approach_positions(vehicle, other, time);
            if distance < collision_danger_threshold {
                min_time = time;
                threat = Some(other);
                our_position_at_nearest_approach = our_final;
                threat_position_at_nearest_approach = other_final;
            }
        }
    }

    if let Some(threat) = threat {
        // parallel: +1, perpendicular: 0, anti-parallel: -1
        let parallelness = vehicle.forward().dot(threat.forward());
        let angle = 0.707;

        if parallelness < -angle {
            // anti-parallel "head on" paths:
            // steer away from future threat position
            let offset = threat_position_at_nearest_approach - vehicle.position();
            let side_dot = offset.dot(vehicle.side());
            steer = if side_dot > 0.0 { -1.0 } else { 1.0 };
        } else if parallelness > angle {
            // parallel paths: steer away from threat
            let offset = threat.position() - vehicle.position();
            let side_dot = offset.dot(vehicle.side());
            steer = if side_dot > 0.0 { -1.0 } else { 1.0 };
        } else {
            // perpendicular paths: steer behind threat
            // (only the slower of the two does this)
            if threat.speed() <= vehicle.speed() {
                let side_dot = vehicle.side().dot(threat.velocity());
                steer = if side_dot > 0.0 { -1.0 } else { 1.0 };
            }
        }

        annotation.avoid_neighbor(
            threat,
            steer,
            our_position_at_nearest_approach,
            threat_position_at_nearest_approach,
        );
    }

    vehicle.side() * steer
}

/// Time until the nearest approach of two vehicles on their current
/// straight-line courses; zero for parallel paths (constant distance)
#[must_use]
pub fn predict_nearest_approach_time(vehicle: &dyn Vehicle, other: &dyn Vehicle) -> f32 {
    // imagine we are at the origin with no velocity; consider the
    // other vehicle's path in that relative space
    let rel_velocity = other.velocity() - vehicle.velocity();
    let rel_speed = rel_velocity.length();
    if rel_speed < f32::EPSILON {
        return 0.0;
    }

    // the nearest approach is the projection of the relative offset
    // onto the relative path's unit tangent
    let rel_tangent = rel_velocity / rel_speed;
    let rel_position = vehicle.position() - other.position();
    let projection = rel_tangent.dot(rel_position);

    projection / rel_speed
}

/// Both vehicles' positions at the given time, and the distance
/// between them
fn compute_nearest_approach_positions(
    vehicle: &dyn Vehicle,
    other: &dyn Vehicle,
    time: f32,
) -> (f32, Vec3, Vec3) {
    let my_final = vehicle.position() + (vehicle.forward() * vehicle.speed() * time);
    let other_final = other.position() + (other.forward() * other.speed() * time);
    (my_final.distance(other_final), my_final, other_final)
}

/// Steer to avoid a single obstacle when a collision is anticipated
/// within `min_time_to_collision` seconds of travel
pub fn steer_to_avoid_obstacle(
    vehicle: &dyn Vehicle,
    min_time_to_collision: f32,
    obstacle: &Obstacle,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    let avoidance = obstacle.steer_to_avoid(vehicle, min_time_to_collision);
    if avoidance != Vec3::ZERO {
        annotation.avoid_obstacle(min_time_to_collision * vehicle.speed());
    }
    avoidance
}

/// Steer to avoid the obstacle whose intersection with our forward
/// axis is nearest; zero when none intersect
pub fn steer_to_avoid_obstacles<'a>(
    vehicle: &dyn Vehicle,
    min_time_to_collision: f32,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    let mut nearest: Option<(f32, &Obstacle)> = None;

    for obstacle in obstacles {
        let Some(distance) = obstacle.next_intersection(vehicle) else {
            continue;
        };
        if nearest.is_none_or(|(nearest_distance, _)| distance < nearest_distance) {
            nearest = Some((distance, obstacle));
        }
    }

    match nearest {
        Some((_, obstacle)) => {
            annotation.avoid_obstacle(min_time_to_collision * vehicle.speed());
            obstacle.steer_to_avoid(vehicle, min_time_to_collision)
        }
        None => Vec3::ZERO,
    }
}

/// Steer back toward a path when the predicted future position falls
/// outside its volume; zero while the prediction stays inside
pub fn steer_to_stay_on_path(
    vehicle: &dyn Vehicle,
    prediction_time: f32,
    path: &impl Pathway,
    max_speed: f32,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    let future_position = vehicle.predict_future_position(prediction_time);
    let relation = path.map_point_to_path(future_position);

    if relation.outside < 0.0 {
        // predicted position is inside the path, no steering needed
        return Vec3::ZERO;
    }

    // seek the on-path projection of our predicted position
    annotation.path_following(
        future_position,
        relation.on_path,
        relation.on_path,
        relation.outside,
    );
    steer_for_seek(vehicle, relation.on_path, max_speed)
}

/// Steer to travel along a path in the given direction (`true` means
/// increasing path distance)
pub fn steer_to_follow_path(
    vehicle: &dyn Vehicle,
    direction: bool,
    prediction_time: f32,
    path: &impl Pathway,
    max_speed: f32,
    annotation: &mut dyn Annotation,
) -> Vec3 {
    steer_to_follow_path_with_distance(
        vehicle,
        direction,
        prediction_time,
        path,
        max_speed,
        annotation,
    )
    .0
}

/// As [`steer_to_follow_path`], also returning the vehicle's current
/// distance along the path
pub fn steer_to_follow_path_with_distance(
    vehicle: &dyn Vehicle,
    direction: bool,
    prediction_time: f32,
    path: &impl Pathway,
    max_speed: f32,
    annotation: &mut dyn Annotation,
) -> (Vec3, f32) {
    // our goal will be offset from our path distance by this amount
    let path_distance_offset =
        (if direction { 1.0 } else { -1.0 }) * prediction_time * vehicle.speed();

    let future_position = vehicle.predict_future_position(prediction_time);

    // measure distance along path of our current and predicted positions
    let current_path_distance = path.map_point_to_path_distance(vehicle.position());
    let future_path_distance = path.map_point_to_path_distance(future_position);

    // are we facing in the correct direction?
    let rightway = if path_distance_offset > 0.0 {
        current_path_distance < future_path_distance
    } else {
        current_path_distance > future_path_distance
    };

    let relation = path.map_point_to_path(future_position);

    // no corrective steering is required if our future position is
    // inside the path tube and we are facing in the correct direction
    if relation.outside <= 0.0 && rightway {
        // already at full speed in the right direction, nothing to do
        if vehicle.speed() >= max_speed {
            return (Vec3::ZERO, current_path_distance);
        }

        // sample a few lookahead points increasingly far along the
        // path and seek the furthest one still inside the tube, to
        // accelerate smoothly along the path
        let near_future = vehicle.predict_future_position(prediction_time / 3.0);
        let mut probe = path.map_point_to_path(near_future);
        let mut seek = probe.on_path;
        for i in 0..3 {
            let next =
                path.map_point_to_path(seek + (probe.tangent * vehicle.speed() / (i + 1) as f32));
            if next.outside > 0.0 {
                break;
            }
            seek = next.on_path;
            probe = next;
            annotation.circle_3d(0.3, seek, Vec3::X, colors::GREEN, 6);
        }

        return (steer_for_seek(vehicle, seek, max_speed), current_path_distance);
    }

    // otherwise steer toward a target point obtained by adding the
    // path distance offset to our current path position
    let target_path_distance = current_path_distance + path_distance_offset;
    let target = path.map_path_distance_to_point(target_path_distance);
    annotation.path_following(future_position, relation.on_path, target, relation.outside);

    (steer_for_seek(vehicle, target, max_speed), current_path_distance)
}

/// Steer to align velocity with a flow field sampled at the predicted
/// future position
#[must_use]
pub fn steer_to_follow_flow_field(
    vehicle: &dyn Vehicle,
    flow_field: &impl FlowField,
    max_speed: f32,
    prediction_distance: f32,
) -> Vec3 {
    let future_position = vehicle.predict_future_position(prediction_distance);
    let flow = flow_field.sample(future_position);
    vehicle.velocity() - flow.truncate_length(max_speed)
}

/// True when `target` lies within the forward cone of the vehicle
#[must_use]
pub fn is_ahead(vehicle: &dyn Vehicle, target: Vec3, cos_threshold: f32) -> bool {
    let target_direction = (target - vehicle.position()).normalize_or_zero();
    vehicle.forward().dot(target_direction) > cos_threshold
}

/// True when `target` lies beside the vehicle, in neither the forward
/// nor the backward cone
#[must_use]
pub fn is_aside(vehicle: &dyn Vehicle, target: Vec3, cos_threshold: f32) -> bool {
    let target_direction = (target - vehicle.position()).normalize_or_zero();
    let dp = vehicle.forward().dot(target_direction);
    dp < cos_threshold && dp > -cos_threshold
}

/// True when `target` lies within the backward cone of the vehicle
#[must_use]
pub fn is_behind(vehicle: &dyn Vehicle, target: Vec3, cos_threshold: f32) -> bool {
    let target_direction = (target - vehicle.position()).normalize_or_zero();
    vehicle.forward().dot(target_direction) < cos_threshold
}

/// Neighborhood test used by the flocking behaviors
///
/// Inside the `min_distance` sphere is always a neighbor; outside the
/// `max_distance` sphere never is. In between, membership requires the
/// other vehicle to lie within the forward cone whose half-angle has
/// cosine `cos_max_angle`. A vehicle is never its own neighbor.
#[must_use]
pub fn is_in_boid_neighborhood(
    vehicle: &dyn Vehicle,
    other: &dyn Vehicle,
    min_distance: f32,
    max_distance: f32,
    cos_max_angle: f32,
) -> bool {
    if std::ptr::addr_eq(other, vehicle) {
        return false;
    }

    let offset = other.position() - vehicle.position();
    let distance_squared = offset.length_squared();

    if distance_squared < min_distance * min_distance {
        return true;
    }
    if distance_squared > max_distance * max_distance {
        return false;
    }

    // otherwise, test angular offset from forward axis
    let unit_offset = offset / distance_squared.sqrt();
    let forwardness = vehicle.forward().dot(unit_offset);
    forwardness > cos_max_angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::NullAnnotation;
    use crate::obstacle::SphericalObstacle;
    use crate::pathway::PolylinePathway;
    use crate::vehicle::SimpleVehicle;

    fn vehicle_at(position: Vec3) -> SimpleVehicle {
        let mut vehicle = SimpleVehicle::new();
        vehicle.local_space.position = position;
        vehicle
    }

    fn moving_vehicle(position: Vec3, forward: Vec3, speed: f32) -> SimpleVehicle {
        let mut vehicle = vehicle_at(position);
        vehicle.local_space.regenerate_orthonormal_basis(forward);
        vehicle.speed = speed;
        vehicle.max_speed = speed.max(1.0);
        vehicle
    }

    fn assert_vec_eq(expected: Vec3, actual: Vec3, epsilon: f32) {
        assert!(
            (expected - actual).length() <= epsilon,
            "expected {expected} but got {actual}"
        );
    }

    #[test]
    fn seek_points_at_target_from_rest() {
        let vehicle = vehicle_at(Vec3::ZERO);
        let steering = steer_for_seek(&vehicle, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_vec_eq(Vec3::new(2.0, 0.0, 0.0), steering, 1e-5);
    }

    #[test]
    fn flee_points_away_from_target_from_rest() {
        let vehicle = vehicle_at(Vec3::ZERO);
        let steering = steer_for_flee(&vehicle, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_vec_eq(Vec3::new(-2.0, 0.0, 0.0), steering, 1e-5);
    }

    #[test]
    fn seek_subtracts_current_velocity() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let steering = steer_for_seek(&vehicle, Vec3::new(0.0, 0.0, -10.0), 1.0);
        // already moving at desired velocity
        assert_vec_eq(Vec3::ZERO, steering, 1e-5);
    }

    #[test]
    fn arrival_slows_inside_slowing_distance() {
        let vehicle = vehicle_at(Vec3::ZERO);
        let far = steer_for_arrival(&vehicle, Vec3::new(20.0, 0.0, 0.0), 2.0, 10.0);
        let near = steer_for_arrival(&vehicle, Vec3::new(2.0, 0.0, 0.0), 2.0, 10.0);

        // outside the slowing distance arrival is just seek
        assert_vec_eq(Vec3::new(2.0, 0.0, 0.0), far, 1e-5);
        // inside, desired speed ramps down linearly
        assert_vec_eq(Vec3::new(0.4, 0.0, 0.0), near, 1e-5);
    }

    #[test]
    fn arrival_at_target_brakes() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let steering = steer_for_arrival(&vehicle, Vec3::ZERO, 2.0, 10.0);
        assert_vec_eq(-vehicle.velocity(), steering, 1e-6);
    }

    #[test]
    fn pursuit_of_stationary_quarry_is_seek() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let quarry = vehicle_at(Vec3::new(0.0, 0.0, -10.0));

        let pursuit =
            steer_for_pursuit(&vehicle, &quarry, 20.0, 1.0, &mut NullAnnotation);
        let seek = steer_for_seek(&vehicle, quarry.position(), 1.0);
        assert_vec_eq(seek, pursuit, 1e-5);
    }

    #[test]
    fn pursuit_of_head_on_quarry_uses_short_intercept() {
        // quarry dead ahead, closing head-on: intercept time is 0.85 of
        // the direct travel time
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let quarry = moving_vehicle(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, 1.0);

        let pursuit =
            steer_for_pursuit(&vehicle, &quarry, 20.0, 1.0, &mut NullAnnotation);

        let intercept_time = 10.0 * 0.85;
        let target = quarry.predict_future_position(intercept_time);
        let seek = steer_for_seek(&vehicle, target, 1.0);
        assert_vec_eq(seek, pursuit, 1e-4);
    }

    #[test]
    fn evasion_flees_predicted_menace_position() {
        let vehicle = vehicle_at(Vec3::ZERO);
        let menace = moving_vehicle(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, 2.0);

        // distance 10 at speed 2 gives a 5 second prediction
        let expected_target = menace.predict_future_position(5.0);
        let steering = steer_for_evasion(&vehicle, &menace, 20.0, 1.0);
        assert_vec_eq(
            steer_for_flee(&vehicle, expected_target, 1.0),
            steering,
            1e-5,
        );
    }

    #[test]
    fn target_speed_clamps_to_max_force() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let accelerate = steer_for_target_speed(&vehicle, 100.0, 0.5);
        let brake = steer_for_target_speed(&vehicle, 0.0, 0.5);

        assert_vec_eq(vehicle.forward() * 0.5, accelerate, 1e-6);
        assert_vec_eq(vehicle.forward() * -0.5, brake, 1e-6);
    }

    #[test]
    fn wander_is_purely_lateral() {
        let mut rng = rand::thread_rng();
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let mut state = WanderState::default();

        for _ in 0..100 {
            let steering = steer_for_wander(&vehicle, 0.1, &mut state, &mut rng);
            assert!(steering.dot(vehicle.forward()).abs() < 1e-5);
            assert!((-1.0..=1.0).contains(&state.side));
            assert!((-1.0..=1.0).contains(&state.up));
        }
    }

    #[test]
    fn neighborhood_always_contains_very_close_vehicles() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        // directly behind, but within the inner sphere
        let other = vehicle_at(Vec3::new(0.0, 0.0, 1.0));
        assert!(is_in_boid_neighborhood(&vehicle, &other, 1.5, 10.0, 0.0));
    }

    #[test]
    fn neighborhood_excludes_far_vehicles() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = vehicle_at(Vec3::new(0.0, 0.0, -100.0));
        assert!(!is_in_boid_neighborhood(&vehicle, &other, 1.5, 10.0, -1.0));
    }

    #[test]
    fn neighborhood_mid_range_requires_forward_cone() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let ahead = vehicle_at(Vec3::new(0.0, 0.0, -5.0));
        let behind = vehicle_at(Vec3::new(0.0, 0.0, 5.0));

        assert!(is_in_boid_neighborhood(&vehicle, &ahead, 1.5, 10.0, 0.0));
        assert!(!is_in_boid_neighborhood(&vehicle, &behind, 1.5, 10.0, 0.0));
    }

    #[test]
    fn neighborhood_never_contains_self() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        assert!(!is_in_boid_neighborhood(&vehicle, &vehicle, 1.5, 10.0, -1.0));
    }

    #[test]
    fn separation_pushes_away_from_neighbor() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = vehicle_at(Vec3::new(0.0, 0.0, -2.0));
        let flock = [&other as &dyn Vehicle];

        let steering = steer_for_separation(&vehicle, 10.0, -1.0, flock);
        assert_vec_eq(Vec3::Z, steering, 1e-5);
    }

    #[test]
    fn alignment_corrects_toward_flock_heading() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = moving_vehicle(Vec3::new(0.0, 0.0, -2.0), Vec3::X, 1.0);
        let flock = [&other as &dyn Vehicle];

        let steering = steer_for_alignment(&vehicle, 10.0, -1.0, flock);
        // error-correcting direction away from our heading toward theirs
        assert!(steering.dot(Vec3::X) > 0.0);
        assert!(steering.dot(Vec3::NEG_Z) < 0.0);
        assert!((steering.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cohesion_points_at_flock_center() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let a = vehicle_at(Vec3::new(2.0, 0.0, -4.0));
        let b = vehicle_at(Vec3::new(-2.0, 0.0, -4.0));
        let flock = [&a as &dyn Vehicle, &b as &dyn Vehicle];

        let steering = steer_for_cohesion(&vehicle, 10.0, -1.0, flock);
        assert_vec_eq(Vec3::NEG_Z, steering, 1e-5);
    }

    #[test]
    fn flock_behaviors_return_zero_with_no_neighbors() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let flock: [&dyn Vehicle; 0] = [];

        assert_eq!(Vec3::ZERO, steer_for_separation(&vehicle, 10.0, 0.0, flock));
        assert_eq!(Vec3::ZERO, steer_for_alignment(&vehicle, 10.0, 0.0, flock));
        assert_eq!(Vec3::ZERO, steer_for_cohesion(&vehicle, 10.0, 0.0, flock));
    }

    #[test]
    fn close_neighbor_triggers_hard_lateral_push() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = vehicle_at(Vec3::new(0.5, 0.0, -0.5));
        let others = [&other as &dyn Vehicle];

        let steering =
            steer_to_avoid_close_neighbors(&vehicle, 1.0, others, &mut NullAnnotation);
        assert!(steering.length() > 0.0);
        // push is lateral and away from the offender
        assert!(steering.dot(vehicle.forward()).abs() < 1e-5);
        assert!(steering.dot(other.position() - vehicle.position()) < 0.0);
    }

    #[test]
    fn distant_neighbor_triggers_no_push() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = vehicle_at(Vec3::new(0.0, 0.0, -50.0));
        let others = [&other as &dyn Vehicle];

        assert_eq!(
            Vec3::ZERO,
            steer_to_avoid_close_neighbors(&vehicle, 1.0, others, &mut NullAnnotation)
        );
    }

    #[test]
    fn nearest_approach_time_for_crossing_paths() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        // crossing our track 10 units ahead, arriving at the same time
        let other = moving_vehicle(Vec3::new(-10.0, 0.0, -10.0), Vec3::X, 1.0);

        let time = predict_nearest_approach_time(&vehicle, &other);
        assert!((time - 10.0).abs() < 0.1);
    }

    #[test]
    fn nearest_approach_time_is_zero_for_parallel_paths() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let other = moving_vehicle(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z, 1.0);
        assert_eq!(0.0, predict_nearest_approach_time(&vehicle, &other));
    }

    #[test]
    fn perpendicular_threat_makes_slower_vehicle_yield() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        // same speed, crossing our track just ahead
        let threat = moving_vehicle(Vec3::new(-5.0, 0.0, -5.0), Vec3::X, 1.0);
        let others = [&threat as &dyn Vehicle];

        let steering =
            steer_to_avoid_neighbors(&vehicle, 10.0, others, &mut NullAnnotation);
        assert!(steering.length() > 0.0);
        // unit lateral force along the side axis
        assert!((steering.length() - 1.0).abs() < 1e-5);
        assert!(steering.dot(vehicle.forward()).abs() < 1e-5);
    }

    #[test]
    fn no_threat_means_no_avoidance() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        // moving away on a diverging course
        let other = moving_vehicle(Vec3::new(20.0, 0.0, 20.0), Vec3::X, 1.0);
        let others = [&other as &dyn Vehicle];

        assert_eq!(
            Vec3::ZERO,
            steer_to_avoid_neighbors(&vehicle, 10.0, others, &mut NullAnnotation)
        );
    }

    #[test]
    fn obstacle_list_avoids_nearest_intersection() {
        let vehicle = moving_vehicle(Vec3::new(0.1, 0.0, 0.0), Vec3::NEG_Z, 1.0);
        let near = Obstacle::Sphere(SphericalObstacle::new(Vec3::new(0.0, 0.0, -5.0), 1.0));
        let far = Obstacle::Sphere(SphericalObstacle::new(Vec3::new(0.0, 0.0, -15.0), 1.0));

        let from_list = steer_to_avoid_obstacles(
            &vehicle,
            20.0,
            [&far, &near],
            &mut NullAnnotation,
        );
        let from_nearest =
            steer_to_avoid_obstacle(&vehicle, 20.0, &near, &mut NullAnnotation);
        assert_vec_eq(from_nearest, from_list, 1e-6);
        assert!(from_list.length() > 0.0);
    }

    fn straight_path() -> PolylinePathway {
        PolylinePathway::new(
            &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -100.0)],
            2.0,
            false,
        )
    }

    #[test]
    fn stay_on_path_is_quiet_inside_tube() {
        let vehicle = moving_vehicle(Vec3::new(0.5, 0.0, -10.0), Vec3::NEG_Z, 1.0);
        let steering =
            steer_to_stay_on_path(&vehicle, 1.0, &straight_path(), 1.0, &mut NullAnnotation);
        assert_eq!(Vec3::ZERO, steering);
    }

    #[test]
    fn stay_on_path_steers_back_when_leaving_tube() {
        let vehicle = moving_vehicle(Vec3::new(5.0, 0.0, -10.0), Vec3::X, 1.0);
        let steering =
            steer_to_stay_on_path(&vehicle, 1.0, &straight_path(), 1.0, &mut NullAnnotation);
        assert!(steering.length() > 0.0);
        // corrective steering points back toward the centerline
        assert!(steering.dot(Vec3::NEG_X) > 0.0);
    }

    #[test]
    fn follow_path_advances_along_the_path() {
        let path = straight_path();
        let vehicle = moving_vehicle(Vec3::new(4.0, 0.0, -10.0), Vec3::X, 1.0);

        let (steering, current_distance) = steer_to_follow_path_with_distance(
            &vehicle,
            true,
            2.0,
            &path,
            1.0,
            &mut NullAnnotation,
        );
        assert!((current_distance - 10.0).abs() < 0.1);
        assert!(steering.length() > 0.0);
        // the target sits further down the path, so the correction has
        // both a back-to-path and an along-path component
        assert!(steering.dot(Vec3::NEG_X) > 0.0);
    }

    #[test]
    fn follow_path_below_max_speed_accelerates_along_path() {
        let path = straight_path();
        let mut vehicle = moving_vehicle(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z, 0.5);
        vehicle.max_speed = 2.0;

        let steering =
            steer_to_follow_path(&vehicle, true, 2.0, &path, 2.0, &mut NullAnnotation);
        // inside the tube, facing the right way, below max speed:
        // seek a lookahead point further down the path
        assert!(steering.dot(Vec3::NEG_Z) > 0.0);
    }

    #[test]
    fn flow_field_following_uses_inverted_seek_convention() {
        struct Uniform(Vec3);
        impl FlowField for Uniform {
            fn sample(&self, _: Vec3) -> Vec3 {
                self.0
            }
        }

        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let field = Uniform(Vec3::X * 10.0);

        let steering = steer_to_follow_flow_field(&vehicle, &field, 2.0, 1.0);
        assert_vec_eq(vehicle.velocity() - Vec3::X * 2.0, steering, 1e-5);
    }

    #[test]
    fn ahead_aside_behind_partition_directions() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::NEG_Z, 1.0);

        assert!(is_ahead(&vehicle, Vec3::new(0.0, 0.0, -5.0), 0.707));
        assert!(is_aside(&vehicle, Vec3::new(5.0, 0.0, 0.0), 0.707));
        assert!(is_behind(&vehicle, Vec3::new(0.0, 0.0, 5.0), -0.707));

        assert!(!is_ahead(&vehicle, Vec3::new(5.0, 0.0, 0.0), 0.707));
        assert!(!is_behind(&vehicle, Vec3::new(0.0, 0.0, -5.0), -0.707));
    }
}
