use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn expand(&self, amount: f32) -> Aabb {
        Aabb {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }
}

/// Uniform-grid broad phase over piece AABBs. Only prunes snap
/// candidates to physically nearby pieces; topological adjacency stays
/// with the seam graph.
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), HashSet<u32>>,
    item_cells: HashMap<u32, Vec<(i32, i32)>>,
    item_bounds: HashMap<u32, Aabb>,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "spatial index cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            item_cells: HashMap::new(),
            item_bounds: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: u32, bounds: Aabb) {
        self.remove(id);
        let keys = self.cell_keys(&bounds);
        for key in &keys {
            self.cells.entry(*key).or_default().insert(id);
        }
        self.item_cells.insert(id, keys);
        self.item_bounds.insert(id, bounds);
    }

    pub fn update(&mut self, id: u32, bounds: Aabb) {
        self.insert(id, bounds);
    }

    pub fn remove(&mut self, id: u32) {
        if let Some(keys) = self.item_cells.remove(&id) {
            for key in keys {
                if let Some(bucket) = self.cells.get_mut(&key) {
                    bucket.remove(&id);
                    if bucket.is_empty() {
                        self.cells.remove(&key);
                    }
                }
            }
        }
        self.item_bounds.remove(&id);
    }

    pub fn query(&self, bounds: &Aabb) -> HashSet<u32> {
        let mut results = HashSet::new();
        for key in self.cell_keys(bounds) {
            let Some(bucket) = self.cells.get(&key) else {
                continue;
            };
            for &id in bucket {
                if let Some(item_bounds) = self.item_bounds.get(&id) {
                    if bounds.intersects(item_bounds) {
                        results.insert(id);
                    }
                }
            }
        }
        results
    }

    pub fn bounds(&self, id: u32) -> Option<Aabb> {
        self.item_bounds.get(&id).copied()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.item_cells.clear();
        self.item_bounds.clear();
    }

    fn cell_keys(&self, bounds: &Aabb) -> Vec<(i32, i32)> {
        let min_x = (bounds.min_x / self.cell_size).floor() as i32;
        let max_x = (bounds.max_x / self.cell_size).floor() as i32;
        let min_y = (bounds.min_y / self.cell_size).floor() as i32;
        let max_y = (bounds.max_y / self.cell_size).floor() as i32;
        let mut keys = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                keys.push((x, y));
            }
        }
        keys
    }
}
