//! Local coordinate frame for vehicles
//!
//! An orthonormal basis (forward, side, up) plus an origin, kept aligned
//! with a vehicle's velocity by the kinematic update. Corresponds to the
//! rows of a 3x4 transformation matrix.

use glam::{Mat4, Vec3, Vec4Swizzles};

/// Orthonormal basis vectors and the origin of a local space
///
/// The identity frame is right-handed with `forward = -Z`, `up = +Y`
/// and `side = +X`. All regenerate methods keep the three axes unit
/// length and mutually orthogonal; passing a zero-length forward is a
/// caller error and leaves the frame degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSpace {
    /// Forward-pointing unit basis vector
    pub forward: Vec3,
    /// Side-pointing unit basis vector
    pub side: Vec3,
    /// Upward-pointing unit basis vector
    pub up: Vec3,
    /// Origin of the local space
    pub position: Vec3,
}

impl LocalSpace {
    /// Create an identity frame at the origin
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: Vec3::NEG_Z,
            side: Vec3::X,
            up: Vec3::Y,
            position: Vec3::ZERO,
        }
    }

    /// Create a frame from an up/forward pair and a position
    ///
    /// The side axis is derived; forward and up are assumed unit length
    /// and not parallel.
    #[must_use]
    pub fn from_forward_and_up(forward: Vec3, up: Vec3, position: Vec3) -> Self {
        let mut space = Self {
            forward,
            side: Vec3::X,
            up,
            position,
        };
        space.set_unit_side_from_forward_and_up();
        space
    }

    /// Reset to the identity frame
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Set side to the normalized cross product of forward and up
    pub fn set_unit_side_from_forward_and_up(&mut self) {
        self.side = self.forward.cross(self.up).normalize();
    }

    /// Regenerate the basis from a new forward known to be unit length
    pub fn regenerate_orthonormal_basis_uf(&mut self, new_unit_forward: Vec3) {
        self.forward = new_unit_forward;
        self.set_unit_side_from_forward_and_up();
        self.up = self.side.cross(self.forward);
    }

    /// Regenerate the basis from a new forward of arbitrary length
    pub fn regenerate_orthonormal_basis(&mut self, new_forward: Vec3) {
        self.regenerate_orthonormal_basis_uf(new_forward.normalize());
    }

    /// Regenerate the basis from both a new forward and a new up
    pub fn regenerate_orthonormal_basis_with_up(&mut self, new_forward: Vec3, new_up: Vec3) {
        self.up = new_up;
        self.regenerate_orthonormal_basis(new_forward);
    }

    /// Transform a direction from local to world coordinates
    #[must_use]
    pub fn globalize_direction(&self, local: Vec3) -> Vec3 {
        (self.side * local.x) + (self.up * local.y) + (self.forward * local.z)
    }

    /// Transform a point from local to world coordinates
    #[must_use]
    pub fn globalize_position(&self, local: Vec3) -> Vec3 {
        self.position + self.globalize_direction(local)
    }

    /// Transform a world direction into local coordinates
    #[must_use]
    pub fn localize_direction(&self, global: Vec3) -> Vec3 {
        Vec3::new(
            global.dot(self.side),
            global.dot(self.up),
            global.dot(self.forward),
        )
    }

    /// Transform a world point into local coordinates
    #[must_use]
    pub fn localize_position(&self, global: Vec3) -> Vec3 {
        self.localize_direction(global - self.position)
    }

    /// Build the equivalent transformation matrix
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_cols(
            self.side.extend(0.0),
            self.up.extend(0.0),
            self.forward.extend(0.0),
            self.position.extend(1.0),
        )
    }

    /// Extract a frame from a transformation matrix
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self {
            side: matrix.x_axis.xyz(),
            up: matrix.y_axis.xyz(),
            forward: matrix.z_axis.xyz(),
            position: matrix.w_axis.xyz(),
        }
    }
}

impl Default for LocalSpace {
    fn default() -> Self {
        Self::new()
    }
}
