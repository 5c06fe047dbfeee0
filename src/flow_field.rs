//! Vector flow fields vehicles can follow

use glam::Vec3;
use rand::Rng;

use crate::math::random_unit_vector;

/// A vector field over space
pub trait FlowField {
    /// Sample the flow direction at a world location
    fn sample(&self, location: Vec3) -> Vec3;
}

/// A flow field stored as a dense 3D grid with unit cell size
///
/// Sampling offsets the query by `center` and clamps each coordinate
/// into the grid, so samples outside the grid return the border cell.
#[derive(Debug, Clone)]
pub struct GridFlowField {
    center: Vec3,
    size_x: usize,
    size_y: usize,
    size_z: usize,
    cells: Vec<Vec3>,
}

impl GridFlowField {
    /// Create a zeroed field of the given dimensions, with world-space
    /// offset `center` mapping to the grid origin
    #[must_use]
    pub fn new(size_x: usize, size_y: usize, size_z: usize, center: Vec3) -> Self {
        Self {
            center,
            size_x,
            size_y,
            size_z,
            cells: vec![Vec3::ZERO; size_x * size_y * size_z],
        }
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        ((x * self.size_y) + y) * self.size_z + z
    }

    /// Blend `func(world_position)` into every cell at the given weight
    pub fn apply(&mut self, mut func: impl FnMut(Vec3) -> Vec3, weight: f32) {
        for x in 0..self.size_x {
            for y in 0..self.size_y {
                for z in 0..self.size_z {
                    let position = Vec3::new(x as f32, y as f32, z as f32) - self.center;
                    let index = self.index(x, y, z);
                    self.cells[index] = self.cells[index].lerp(func(position), weight);
                }
            }
        }
    }

    /// Blend random unit directions into every cell
    pub fn randomize(&mut self, weight: f32, rng: &mut impl Rng) {
        self.apply(|_| random_unit_vector(rng), weight);
    }

    /// Flatten the field onto the XZ plane
    pub fn clamp_xz(&mut self) {
        for cell in &mut self.cells {
            cell.y = 0.0;
        }
    }

    /// Normalize every cell to unit length; zero cells stay zero
    pub fn normalize(&mut self) {
        for cell in &mut self.cells {
            *cell = cell.normalize_or_zero();
        }
    }

    /// Replace any non-finite cell with zero
    pub fn clean(&mut self) {
        for cell in &mut self.cells {
            if !cell.is_finite() {
                *cell = Vec3::ZERO;
            }
        }
    }
}

impl FlowField for GridFlowField {
    fn sample(&self, location: Vec3) -> Vec3 {
        let sample_location = location + self.center;
        let clamp_axis = |value: f32, size: usize| {
            value.clamp(0.0, (size - 1) as f32) as usize
        };
        self.cells[self.index(
            clamp_axis(sample_location.x, self.size_x),
            clamp_axis(sample_location.y, self.size_y),
            clamp_axis(sample_location.z, self.size_z),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clamps_to_grid_borders() {
        let mut field = GridFlowField::new(4, 1, 4, Vec3::ZERO);
        field.apply(|_| Vec3::X, 1.0);

        assert_eq!(Vec3::X, field.sample(Vec3::new(2.0, 0.0, 2.0)));
        // far outside the grid still samples the border cell
        assert_eq!(Vec3::X, field.sample(Vec3::new(100.0, -50.0, 100.0)));
    }

    #[test]
    fn apply_blends_by_weight() {
        let mut field = GridFlowField::new(2, 1, 2, Vec3::ZERO);
        field.apply(|_| Vec3::X * 2.0, 0.5);
        assert_eq!(Vec3::X, field.sample(Vec3::ZERO));
    }

    #[test]
    fn clamp_xz_zeroes_vertical_component() {
        let mut field = GridFlowField::new(2, 2, 2, Vec3::ZERO);
        field.apply(|_| Vec3::new(1.0, 2.0, 3.0), 1.0);
        field.clamp_xz();
        assert_eq!(Vec3::new(1.0, 0.0, 3.0), field.sample(Vec3::ZERO));
    }

    #[test]
    fn randomized_field_is_unit_length_after_normalize() {
        let mut rng = rand::thread_rng();
        let mut field = GridFlowField::new(3, 3, 3, Vec3::ZERO);
        field.randomize(1.0, &mut rng);
        field.normalize();
        field.clean();

        for x in 0..3 {
            for z in 0..3 {
                let sample = field.sample(Vec3::new(x as f32, 1.0, z as f32));
                assert!((sample.length() - 1.0).abs() < 1e-5);
            }
        }
    }
}
