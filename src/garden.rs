use hashbrown::HashSet;
use strata_world::{Dimension, Tile, WorldTarget};

/// Runs garden seeds through their own first and second pass after the
/// staged layer passes. Seeds spanning several tiles are deduplicated by
/// identity so each germinates exactly once per region export.
pub struct GardenExporter {
    planted: HashSet<u64>,
    grown: HashSet<u64>,
}

impl GardenExporter {
    pub fn new() -> Self {
        Self {
            planted: HashSet::new(),
            grown: HashSet::new(),
        }
    }

    pub fn first_pass(&mut self, dimension: &dyn Dimension, tile: &Tile, target: &mut dyn WorldTarget) {
        for seed in tile.seeds() {
            if self.planted.insert(seed.id()) {
                seed.plant(dimension, target);
            }
        }
    }

    pub fn second_pass(&mut self, dimension: &dyn Dimension, tile: &Tile, target: &mut dyn WorldTarget) {
        for seed in tile.seeds() {
            if self.grown.insert(seed.id()) {
                seed.grow(dimension, target);
            }
        }
    }
}

impl Default for GardenExporter {
    fn default() -> Self {
        Self::new()
    }
}
