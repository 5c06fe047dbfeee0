//! Bin-lattice spatial database for locality queries
//!
//! Answers "which objects are within radius R of location L?" faster
//! than brute force by hashing moving points into a 3D lattice of
//! brick-shaped bins (plus one overflow bin for points outside the
//! lattice). Each bin holds an intrusive doubly-linked list of
//! entries; the lists live in a slot arena and are linked by index, so
//! insert, relocate and remove are all O(1).
//!
//! The coarse bin-range scan is only a broad phase: every candidate is
//! re-checked against the true squared distance, so query results are
//! exact, merely unordered.

use glam::Vec3;

/// Handle to an object stored in a [`ProximityDatabase`]
///
/// Stays valid until the entry is removed; using a handle after
/// removal is a logic error and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenId(usize);

struct Entry<T> {
    object: T,
    // the object's location ("key point") used for spatial sorting
    position: Vec3,
    // bin currently linked into; None while unbound
    bin: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// The spatial database: a lattice of `div_x * div_y * div_z` bins
/// spanning a box of `size` anchored at `origin`, plus an overflow bin
/// for everything outside the box
pub struct ProximityDatabase<T> {
    origin: Vec3,
    size: Vec3,
    div_x: usize,
    div_y: usize,
    div_z: usize,

    // head of each bin's list; the last index is the overflow bin
    bins: Vec<Option<usize>>,
    slots: Vec<Option<Entry<T>>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> ProximityDatabase<T> {
    /// Create a database whose lattice is centered on `center` with
    /// the given total dimensions and per-axis subdivisions
    #[must_use]
    pub fn new(center: Vec3, dimensions: Vec3, divisions: [usize; 3]) -> Self {
        let [div_x, div_y, div_z] = divisions;
        let origin = center - (dimensions * 0.5);

        log::debug!(
            "proximity database: origin {origin}, size {dimensions}, {div_x}x{div_y}x{div_z} bins"
        );

        Self {
            origin,
            size: dimensions,
            div_x,
            div_y,
            div_z,
            bins: vec![None; (div_x * div_y * div_z) + 1],
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of objects currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store an object at a position, returning its handle
    pub fn insert(&mut self, object: T, position: Vec3) -> TokenId {
        let entry = Entry {
            object,
            position,
            bin: None,
            prev: None,
            next: None,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.len += 1;

        let token = TokenId(slot);
        self.update_for_new_location(token, position);
        token
    }

    /// Move an object to a new position, re-binning it if it crossed a
    /// bin boundary
    pub fn update_for_new_location(&mut self, token: TokenId, position: Vec3) {
        let new_bin = self.bin_for_location(position);

        let entry = self.entry_mut(token);
        entry.position = position;

        if entry.bin != Some(new_bin) {
            self.unlink(token.0);
            self.link(token.0, new_bin);
        }
    }

    /// Remove an object, returning it
    pub fn remove(&mut self, token: TokenId) -> T {
        self.entry_mut(token); // validate before unlinking
        self.unlink(token.0);

        let Some(entry) = self.slots[token.0].take() else {
            unreachable!();
        };
        self.free.push(token.0);
        self.len -= 1;
        entry.object
    }

    /// Apply `func` to every object whose position lies strictly
    /// within `radius` of `center`, passing the squared distance
    ///
    /// `func` must not add, remove or relocate entries; the traversal
    /// walks live bin lists.
    pub fn map_over_all_objects_in_locality(
        &self,
        center: Vec3,
        radius: f32,
        mut func: impl FnMut(&T, f32),
    ) {
        let completely_outside = center.x + radius < self.origin.x
            || center.y + radius < self.origin.y
            || center.z + radius < self.origin.z
            || center.x - radius >= self.origin.x + self.size.x
            || center.y - radius >= self.origin.y + self.size.y
            || center.z - radius >= self.origin.z + self.size.z;

        if completely_outside {
            self.traverse_bin(self.overflow_bin(), center, radius, &mut func);
            return;
        }

        // inclusive bin coordinate range overlapping the query sphere,
        // unclipped (floor keeps ranges correct below the origin)
        let min = self.unclipped_bin_coords(center - Vec3::splat(radius));
        let max = self.unclipped_bin_coords(center + Vec3::splat(radius));

        // clip to the lattice; any clipping means part of the sphere
        // lies outside, where objects live in the overflow bin
        let min_clipped = [min[0].max(0), min[1].max(0), min[2].max(0)];
        let max_clipped = [
            max[0].min(self.div_x as i64 - 1),
            max[1].min(self.div_y as i64 - 1),
            max[2].min(self.div_z as i64 - 1),
        ];
        if min != min_clipped || max != max_clipped {
            self.traverse_bin(self.overflow_bin(), center, radius, &mut func);
        }

        for ix in min_clipped[0]..=max_clipped[0] {
            for iy in min_clipped[1]..=max_clipped[1] {
                for iz in min_clipped[2]..=max_clipped[2] {
                    let bin = self.bin_index(ix as usize, iy as usize, iz as usize);
                    self.traverse_bin(bin, center, radius, &mut func);
                }
            }
        }
    }

    /// Apply `func` to every stored object regardless of locality
    pub fn map_over_all_objects(&self, mut func: impl FnMut(&T)) {
        for entry in self.slots.iter().flatten() {
            func(&entry.object);
        }
    }

    fn overflow_bin(&self) -> usize {
        self.bins.len() - 1
    }

    fn bin_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.div_y * self.div_z) + (iy * self.div_z) + iz
    }

    /// Per-axis lattice coordinates of a point, unclipped; negative or
    /// beyond-the-edge values mean the point is off the lattice
    fn unclipped_bin_coords(&self, point: Vec3) -> [i64; 3] {
        let relative = point - self.origin;
        [
            ((relative.x / self.size.x) * self.div_x as f32).floor() as i64,
            ((relative.y / self.size.y) * self.div_y as f32).floor() as i64,
            ((relative.z / self.size.z) * self.div_z as f32).floor() as i64,
        ]
    }

    /// Bin holding a location: a lattice bin when inside the box, the
    /// overflow bin otherwise
    fn bin_for_location(&self, position: Vec3) -> usize {
        let relative = position - self.origin;
        if relative.min_element() < 0.0
            || relative.x >= self.size.x
            || relative.y >= self.size.y
            || relative.z >= self.size.z
        {
            return self.overflow_bin();
        }

        // rounding at the far face could yield an out-of-range cell,
        // so clamp each coordinate to its last cell
        let ix = (((relative.x / self.size.x) * self.div_x as f32) as usize).min(self.div_x - 1);
        let iy = (((relative.y / self.size.y) * self.div_y as f32) as usize).min(self.div_y - 1);
        let iz = (((relative.z / self.size.z) * self.div_z as f32) as usize).min(self.div_z - 1);
        self.bin_index(ix, iy, iz)
    }

    fn traverse_bin(&self, bin: usize, center: Vec3, radius: f32, func: &mut impl FnMut(&T, f32)) {
        let radius_squared = radius * radius;
        let mut cursor = self.bins[bin];
        while let Some(slot) = cursor {
            let Some(entry) = self.slots[slot].as_ref() else {
                unreachable!();
            };
            let distance_squared = (center - entry.position).length_squared();
            if distance_squared < radius_squared {
                func(&entry.object, distance_squared);
            }
            cursor = entry.next;
        }
    }

    fn entry_mut(&mut self, token: TokenId) -> &mut Entry<T> {
        match self.slots.get_mut(token.0) {
            Some(Some(entry)) => entry,
            _ => panic!("stale proximity token"),
        }
    }

    /// Link a slot at the head of a bin's list
    fn link(&mut self, slot: usize, bin: usize) {
        let head = self.bins[bin];
        if let Some(head_slot) = head {
            if let Some(head_entry) = self.slots[head_slot].as_mut() {
                head_entry.prev = Some(slot);
            }
        }
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.prev = None;
            entry.next = head;
            entry.bin = Some(bin);
        }
        self.bins[bin] = Some(slot);
    }

    /// Unlink a slot from its current bin's list, if bound
    fn unlink(&mut self, slot: usize) {
        let Some(entry) = self.slots[slot].as_ref() else {
            return;
        };
        let (bin, prev, next) = (entry.bin, entry.prev, entry.next);

        if let Some(bin) = bin {
            if self.bins[bin] == Some(slot) {
                self.bins[bin] = next;
            }
            if let Some(prev_slot) = prev {
                if let Some(prev_entry) = self.slots[prev_slot].as_mut() {
                    prev_entry.next = next;
                }
            }
            if let Some(next_slot) = next {
                if let Some(next_entry) = self.slots[next_slot].as_mut() {
                    next_entry.prev = prev;
                }
            }
        }

        if let Some(entry) = self.slots[slot].as_mut() {
            entry.bin = None;
            entry.prev = None;
            entry.next = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn test_database() -> ProximityDatabase<usize> {
        ProximityDatabase::new(Vec3::ZERO, Vec3::splat(20.0), [4, 4, 4])
    }

    fn query(db: &ProximityDatabase<usize>, center: Vec3, radius: f32) -> Vec<usize> {
        let mut found = Vec::new();
        db.map_over_all_objects_in_locality(center, radius, |&id, _| found.push(id));
        found.sort_unstable();
        found
    }

    #[test]
    fn finds_objects_within_radius_only() {
        let mut db = test_database();
        db.insert(0, Vec3::new(1.0, 0.0, 0.0));
        db.insert(1, Vec3::new(4.0, 0.0, 0.0));
        db.insert(2, Vec3::new(-8.0, 0.0, 0.0));

        assert_eq!(vec![0, 1], query(&db, Vec3::ZERO, 5.0));
        assert_eq!(vec![0, 1, 2], query(&db, Vec3::ZERO, 50.0));
    }

    #[test]
    fn boundary_distance_is_excluded() {
        let mut db = test_database();
        db.insert(0, Vec3::new(3.0, 0.0, 0.0));
        // strict inequality: exactly at the radius is not a neighbor
        assert!(query(&db, Vec3::ZERO, 3.0).is_empty());
        assert_eq!(vec![0], query(&db, Vec3::ZERO, 3.0 + 1e-3));
    }

    #[test]
    fn objects_outside_lattice_are_still_found() {
        let mut db = test_database();
        // both far outside the 20-unit box
        db.insert(0, Vec3::new(100.0, 0.0, 0.0));
        db.insert(1, Vec3::new(102.0, 0.0, 0.0));
        // straddling the boundary
        db.insert(2, Vec3::new(9.0, 0.0, 0.0));
        db.insert(3, Vec3::new(11.0, 0.0, 0.0));

        // query centered outside the lattice
        assert_eq!(vec![0, 1], query(&db, Vec3::new(101.0, 0.0, 0.0), 5.0));
        // query overlapping the lattice edge sees both sides
        assert_eq!(vec![2, 3], query(&db, Vec3::new(10.0, 0.0, 0.0), 2.0));
    }

    #[test]
    fn update_moves_object_between_bins() {
        let mut db = test_database();
        let token = db.insert(7, Vec3::new(-9.0, 0.0, 0.0));
        assert_eq!(vec![7], query(&db, Vec3::new(-9.0, 0.0, 0.0), 1.0));

        db.update_for_new_location(token, Vec3::new(9.0, 0.0, 0.0));
        assert!(query(&db, Vec3::new(-9.0, 0.0, 0.0), 1.0).is_empty());
        assert_eq!(vec![7], query(&db, Vec3::new(9.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn update_within_same_bin_keeps_list_intact() {
        let mut db = test_database();
        let a = db.insert(0, Vec3::new(1.0, 1.0, 1.0));
        db.insert(1, Vec3::new(1.2, 1.0, 1.0));
        db.insert(2, Vec3::new(1.4, 1.0, 1.0));

        // small move within the same 5-unit bin
        db.update_for_new_location(a, Vec3::new(1.1, 1.0, 1.0));
        assert_eq!(vec![0, 1, 2], query(&db, Vec3::new(1.0, 1.0, 1.0), 2.0));
        assert_eq!(3, db.len());
    }

    #[test]
    fn remove_unlinks_and_returns_object() {
        let mut db: ProximityDatabase<&str> =
            ProximityDatabase::new(Vec3::ZERO, Vec3::splat(20.0), [4, 4, 4]);
        db.insert("a", Vec3::new(1.0, 0.0, 0.0));
        let b = db.insert("b", Vec3::new(1.1, 0.0, 0.0));
        db.insert("c", Vec3::new(1.2, 0.0, 0.0));

        assert_eq!("b", db.remove(b));
        assert_eq!(2, db.len());

        let mut found = Vec::new();
        db.map_over_all_objects_in_locality(Vec3::new(1.0, 0.0, 0.0), 2.0, |&id, _| {
            found.push(id);
        });
        found.sort_unstable();
        assert_eq!(vec!["a", "c"], found);
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut db = test_database();
        let first = db.insert(0, Vec3::ZERO);
        db.remove(first);
        let second = db.insert(1, Vec3::ZERO);
        assert_eq!(first, second);
        assert_eq!(1, db.len());
    }

    #[test]
    #[should_panic(expected = "stale proximity token")]
    fn stale_token_panics() {
        let mut db = test_database();
        let token = db.insert(0, Vec3::ZERO);
        db.remove(token);
        db.update_for_new_location(token, Vec3::ONE);
    }

    #[test]
    fn map_over_all_objects_visits_everything() {
        let mut db = test_database();
        db.insert(1, Vec3::new(-9.0, -9.0, -9.0));
        db.insert(2, Vec3::new(9.0, 9.0, 9.0));
        db.insert(4, Vec3::new(500.0, 0.0, 0.0)); // overflow bin

        let mut sum = 0;
        db.map_over_all_objects(|&id| sum += id);
        assert_eq!(7, sum);
    }

    #[test]
    fn locality_query_matches_brute_force() {
        let mut rng = rand::thread_rng();
        let mut db = test_database();
        let mut points = Vec::new();

        // scatter points both inside and well outside the lattice
        for id in 0..300 {
            let range = if id % 5 == 0 { -40.0f32..40.0 } else { -10.0f32..10.0 };
            let position = Vec3::new(
                rng.gen_range(range.clone()),
                rng.gen_range(range.clone()),
                rng.gen_range(range),
            );
            db.insert(id, position);
            points.push(position);
        }

        for _ in 0..100 {
            let center = Vec3::new(
                rng.gen_range(-25.0f32..25.0),
                rng.gen_range(-25.0f32..25.0),
                rng.gen_range(-25.0f32..25.0),
            );
            let radius = rng.gen_range(0.5f32..15.0);

            let mut expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| (center - **p).length_squared() < radius * radius)
                .map(|(id, _)| id)
                .collect();
            expected.sort_unstable();

            assert_eq!(expected, query(&db, center, radius));
        }
    }

    #[test]
    fn reported_distance_squared_is_exact() {
        let mut db = test_database();
        db.insert(0, Vec3::new(3.0, 4.0, 0.0));

        let mut reported = None;
        db.map_over_all_objects_in_locality(Vec3::ZERO, 10.0, |_, d2| reported = Some(d2));
        assert_eq!(Some(25.0), reported);
    }
}
