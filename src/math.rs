//! Numeric utilities and `Vec3` extensions
//!
//! Shared math used throughout the crate: exponential smoothing,
//! vector clipping and decomposition, and random direction helpers.

use std::ops::{Add, Mul, Sub};

use glam::Vec3;
use rand::Rng;

/// Blend a new value into a running accumulator (exponential smoothing).
///
/// `smooth_rate` is clamped to `[0, 1]`: zero leaves the accumulator
/// unchanged, one (or more) snaps it fully to `new_value`.
pub fn blend_into_accumulator<T>(smooth_rate: f32, new_value: T, accumulator: &mut T)
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    let rate = smooth_rate.clamp(0.0, 1.0);
    *accumulator = *accumulator + (new_value - *accumulator) * rate;
}

/// Classify `x` against an interval: -1 below, 0 inside, +1 above
#[must_use]
pub fn interval_comparison(x: f32, lower_bound: f32, upper_bound: f32) -> i32 {
    if x < lower_bound {
        return -1;
    }
    if x > upper_bound {
        return 1;
    }
    0
}

/// Take one step of a bounded random walk
#[must_use]
pub fn scalar_random_walk(
    initial: f32,
    walk_speed: f32,
    min: f32,
    max: f32,
    rng: &mut impl Rng,
) -> f32 {
    let next = initial + (rng.gen_range(-1.0f32..1.0) * walk_speed);
    next.clamp(min, max)
}

/// Extension methods for `glam::Vec3` used by the steering math
pub trait Vec3Ext {
    /// Clip the vector's magnitude to `max_length`, preserving direction
    #[must_use]
    fn truncate_length(self, max_length: f32) -> Vec3;

    /// Component of this vector parallel to a unit basis vector
    #[must_use]
    fn parallel_component(self, unit_basis: Vec3) -> Vec3;

    /// Component of this vector perpendicular to a unit basis vector
    #[must_use]
    fn perpendicular_component(self, unit_basis: Vec3) -> Vec3;

    /// Clip the vector to lie within a cone around `basis`
    ///
    /// The cone's half-angle has cosine `cos_max_angle`. Length is
    /// preserved. A zero input, or a vector with no perpendicular
    /// component to rotate through, returns zero.
    #[must_use]
    fn limit_max_deviation_angle(self, cos_max_angle: f32, basis: Vec3) -> Vec3;

    /// Clip the vector to lie outside a cone around `basis`
    #[must_use]
    fn limit_min_deviation_angle(self, cos_min_angle: f32, basis: Vec3) -> Vec3;

    /// Rotate about the global Y axis by `angle` radians
    #[must_use]
    fn rotate_about_global_y(self, angle: f32) -> Vec3;

    /// As `rotate_about_global_y`, caching the computed sin/cos
    #[must_use]
    fn rotate_about_global_y_cached(self, angle: f32, sin: &mut f32, cos: &mut f32) -> Vec3;

    /// Wrap a position into a sphere by mirroring through its surface
    ///
    /// Applied repeatedly until the result is inside the sphere, so
    /// positions far outside still wrap to the interior.
    #[must_use]
    fn spherical_wraparound(self, center: Vec3, radius: f32) -> Vec3;

    /// Perpendicular distance from this point to an infinite line
    #[must_use]
    fn distance_from_line(self, origin: Vec3, unit_tangent: Vec3) -> f32;

    /// An arbitrary vector perpendicular to this one
    #[must_use]
    fn find_perpendicular_in_3d(self) -> Vec3;
}

impl Vec3Ext for Vec3 {
    fn truncate_length(self, max_length: f32) -> Vec3 {
        let max_squared = max_length * max_length;
        let length_squared = self.length_squared();
        if length_squared <= max_squared {
            self
        } else {
            self * (max_length / length_squared.sqrt())
        }
    }

    fn parallel_component(self, unit_basis: Vec3) -> Vec3 {
        let projection = self.dot(unit_basis);
        unit_basis * projection
    }

    fn perpendicular_component(self, unit_basis: Vec3) -> Vec3 {
        self - self.parallel_component(unit_basis)
    }

    fn limit_max_deviation_angle(self, cos_max_angle: f32, basis: Vec3) -> Vec3 {
        limit_deviation_angle(true, self, cos_max_angle, basis)
    }

    fn limit_min_deviation_angle(self, cos_min_angle: f32, basis: Vec3) -> Vec3 {
        limit_deviation_angle(false, self, cos_min_angle, basis)
    }

    fn rotate_about_global_y(self, angle: f32) -> Vec3 {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(
            (self.x * cos) + (self.z * sin),
            self.y,
            (self.z * cos) - (self.x * sin),
        )
    }

    fn rotate_about_global_y_cached(self, angle: f32, sin: &mut f32, cos: &mut f32) -> Vec3 {
        // compute sin/cos only on the first call (when both are zero)
        if *sin == 0.0 && *cos == 0.0 {
            (*sin, *cos) = angle.sin_cos();
        }
        Vec3::new(
            (self.x * *cos) + (self.z * *sin),
            self.y,
            (self.z * *cos) - (self.x * *sin),
        )
    }

    fn spherical_wraparound(self, center: Vec3, radius: f32) -> Vec3 {
        let mut position = self;
        loop {
            let offset = position - center;
            let distance = offset.length();
            if distance <= radius {
                return position;
            }
            position += (-offset / distance) * radius * 2.0;
        }
    }

    fn distance_from_line(self, origin: Vec3, unit_tangent: Vec3) -> f32 {
        let offset = self - origin;
        offset.perpendicular_component(unit_tangent).length()
    }

    fn find_perpendicular_in_3d(self) -> Vec3 {
        // cross with whichever global axis is least parallel to self
        let id = Vec3::X.dot(self);
        let jd = Vec3::Y.dot(self);
        let kd = Vec3::Z.dot(self);

        let quasi_perp = if id <= jd && id <= kd {
            Vec3::X
        } else if jd <= id && jd <= kd {
            Vec3::Y
        } else {
            Vec3::Z
        };

        self.cross(quasi_perp)
    }
}

/// Clip a vector into (`inside` true) or out of a cone around `basis`
fn limit_deviation_angle(inside: bool, source: Vec3, cos_angle: f32, basis: Vec3) -> Vec3 {
    let source_length = source.length();
    if source_length == 0.0 {
        return source;
    }

    // measure the angular deviation of source from basis
    let direction = source / source_length;
    let cos_source_angle = direction.dot(basis);

    // return source unchanged if it already meets the angle criterion
    if inside {
        if cos_source_angle >= cos_angle {
            return source;
        }
    } else if cos_source_angle <= cos_angle {
        return source;
    }

    // find the portion of source perpendicular to basis; when there is
    // none (source parallel or anti-parallel to the axis) there is no
    // plane to rotate within, so clip fully to zero
    let perp = source.perpendicular_component(basis);
    let perp_length = perp.length();
    if perp_length == 0.0 {
        return Vec3::ZERO;
    }

    // construct a vector of the source's length on the cone's surface,
    // in the plane spanned by basis and the perpendicular
    let unit_perp = perp / perp_length;
    let perp_dist = (1.0 - (cos_angle * cos_angle)).sqrt();
    let c0 = basis * cos_angle;
    let c1 = unit_perp * perp_dist;
    (c0 + c1) * source_length
}

/// Random point inside the unit-radius sphere (rejection sampled)
#[must_use]
pub fn random_vector_in_unit_radius_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        );
        if v.length_squared() < 1.0 {
            return v;
        }
    }
}

/// Random unit-length direction, uniformly distributed
#[must_use]
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = random_vector_in_unit_radius_sphere(rng);
        if v.length_squared() > 0.0 {
            return v.normalize();
        }
    }
}

/// Random point on the unit-radius disk in the XZ plane
#[must_use]
pub fn random_vector_on_unit_radius_xz_disk(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(rng.gen_range(-1.0f32..1.0), 0.0, rng.gen_range(-1.0f32..1.0));
        if v.length_squared() < 1.0 {
            return v;
        }
    }
}

/// Random unit-length direction in the XZ plane
#[must_use]
pub fn random_unit_vector_on_xz_plane(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = random_vector_on_unit_radius_xz_disk(rng);
        if v.length_squared() > 0.0 {
            return v.normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn assert_vec_eq(expected: Vec3, actual: Vec3, epsilon: f32) {
        assert!(
            (expected - actual).length() <= epsilon,
            "expected {expected} but got {actual}"
        );
    }

    #[test]
    fn blend_rate_zero_leaves_accumulator_unchanged() {
        let mut acc = 3.0f32;
        blend_into_accumulator(0.0, 10.0, &mut acc);
        assert_eq!(3.0, acc);
    }

    #[test]
    fn blend_rate_one_snaps_to_new_value() {
        let mut acc = Vec3::ZERO;
        blend_into_accumulator(1.5, Vec3::X, &mut acc);
        assert_vec_eq(Vec3::X, acc, 1e-6);
    }

    #[test]
    fn interval_comparison_classifies() {
        assert_eq!(-1, interval_comparison(-2.0, -1.0, 1.0));
        assert_eq!(0, interval_comparison(0.0, -1.0, 1.0));
        assert_eq!(1, interval_comparison(2.0, -1.0, 1.0));
    }

    #[test]
    fn parallel_component_projects_onto_basis() {
        let v = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_vec_eq(Vec3::new(0.0, v.y, 0.0), v.parallel_component(Vec3::Y), 1e-6);
    }

    #[test]
    fn perpendicular_component_removes_basis_projection() {
        let v = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_vec_eq(
            Vec3::new(v.x, 0.0, 0.0),
            v.perpendicular_component(Vec3::Y),
            1e-6,
        );
    }

    #[test]
    fn truncate_length_does_not_touch_short_vector() {
        assert_vec_eq(Vec3::Y, Vec3::Y.truncate_length(2.0), 1e-6);
    }

    #[test]
    fn truncate_length_clips_long_vector() {
        assert_vec_eq(Vec3::Y * 0.5, Vec3::Y.truncate_length(0.5), 1e-6);
    }

    #[test]
    fn rotate_about_global_y_clockwise() {
        assert_vec_eq(
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0).rotate_about_global_y(FRAC_PI_2),
            1e-6,
        );
    }

    #[test]
    fn rotate_about_global_y_anticlockwise() {
        assert_vec_eq(
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, -1.0).rotate_about_global_y(-FRAC_PI_2),
            1e-6,
        );
    }

    #[test]
    fn rotate_about_global_y_fills_cache() {
        let angle = FRAC_PI_2;
        let mut sin = 0.0;
        let mut cos = 0.0;
        let rotated = Vec3::new(0.0, 1.0, 1.0).rotate_about_global_y_cached(angle, &mut sin, &mut cos);
        assert_vec_eq(Vec3::new(1.0, 1.0, 0.0), rotated, 1e-6);
        assert_eq!(angle.sin(), sin);
        assert_eq!(angle.cos(), cos);
    }

    #[test]
    fn spherical_wraparound_keeps_interior_point() {
        let pos = Vec3::new(10.0, 11.0, 12.0);
        assert_eq!(pos, pos.spherical_wraparound(Vec3::ZERO, 20.0));
    }

    #[test]
    fn spherical_wraparound_wraps_exterior_point() {
        let pos = Vec3::new(0.0, 0.0, 30.0);
        assert_vec_eq(
            Vec3::new(0.0, 0.0, -10.0),
            pos.spherical_wraparound(Vec3::ZERO, 20.0),
            1e-4,
        );
    }

    #[test]
    fn spherical_wraparound_wraps_far_exterior_point() {
        let pos = Vec3::new(0.0, 0.0, 90.0);
        assert_vec_eq(
            Vec3::new(0.0, 0.0, 10.0),
            pos.spherical_wraparound(Vec3::ZERO, 20.0),
            1e-4,
        );
    }

    #[test]
    fn distance_from_line_measures_perpendicular_offset() {
        let point = Vec3::new(0.0, 100.0, 0.0);
        assert_eq!(100.0, point.distance_from_line(Vec3::ZERO, Vec3::X));
    }

    fn bitset_directions(v: Vec3, set: &mut u32) {
        *set |= if v.x > 0.0 { 1 } else { 2 };
        *set |= if v.y > 0.0 { 4 } else { 8 };
        *set |= if v.z > 0.0 { 16 } else { 32 };
    }

    #[test]
    fn random_unit_vector_is_length_one_in_every_direction() {
        let mut rng = rand::thread_rng();
        let mut set = 0;
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
            bitset_directions(v, &mut set);
        }
        // every octant should be hit
        assert_eq!(63, set);
    }

    #[test]
    fn random_unit_vector_on_xz_plane_has_zero_y() {
        let mut rng = rand::thread_rng();
        let mut set = 0;
        for _ in 0..1000 {
            let v = random_unit_vector_on_xz_plane(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
            bitset_directions(v, &mut set);
        }
        // y is always zero, so positive-y is never seen
        assert_eq!(59, set);
    }

    #[test]
    fn random_vector_in_unit_radius_sphere_stays_inside() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            assert!(random_vector_in_unit_radius_sphere(&mut rng).length() <= 1.0);
        }
    }

    #[test]
    fn find_perpendicular_in_3d_is_perpendicular() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            let perp = v.find_perpendicular_in_3d();
            assert!(v.dot(perp).abs() < 1e-6);
            assert!(perp.length_squared() > 0.0);
        }
    }

    #[test]
    fn clip_within_cone_is_always_within_cone() {
        let mut rng = rand::thread_rng();
        for _ in 0..5000 {
            let vector = random_unit_vector(&mut rng);
            let basis = random_unit_vector(&mut rng);
            let angle: f32 = rng.gen_range(0.1..FRAC_PI_2);
            let result = vector.limit_max_deviation_angle(angle.cos(), basis);
            let measured = result.dot(basis).clamp(-1.0, 1.0).acos();
            assert!(measured <= angle + 1e-3);
        }
    }

    #[test]
    fn clip_outside_cone_is_always_outside_cone() {
        let mut rng = rand::thread_rng();
        for _ in 0..5000 {
            let vector = random_unit_vector(&mut rng);
            let basis = random_unit_vector(&mut rng);
            let angle: f32 = rng.gen_range(0.1..FRAC_PI_2);
            let result = vector.limit_min_deviation_angle(angle.cos(), basis);
            if result.length_squared() == 0.0 {
                continue; // axis-parallel input clips to zero
            }
            let measured = result.dot(basis).clamp(-1.0, 1.0).acos();
            assert!(measured >= angle - 1e-3);
        }
    }

    #[test]
    fn clip_zero_vector_returns_zero() {
        assert_eq!(Vec3::ZERO, Vec3::ZERO.limit_max_deviation_angle(0.2, Vec3::Y));
        assert_eq!(Vec3::ZERO, Vec3::ZERO.limit_min_deviation_angle(0.2, Vec3::Y));
    }

    #[test]
    fn clip_backwards_vector_is_zero() {
        assert_eq!(
            Vec3::ZERO,
            Vec3::Z.limit_max_deviation_angle(0.2, Vec3::NEG_Z)
        );
    }

    #[test]
    fn scalar_random_walk_respects_bounds() {
        let mut rng = rand::thread_rng();
        let mut value = 0.0;
        for _ in 0..1000 {
            value = scalar_random_walk(value, 0.5, -1.0, 1.0, &mut rng);
            assert!((-1.0..=1.0).contains(&value));
        }
    }
}
