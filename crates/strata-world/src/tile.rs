use std::sync::Arc;

use crate::coords::{TILE_SIZE, TileCoord};
use crate::dimension::Dimension;
use crate::layer::Layer;
use crate::target::WorldTarget;

/// A germination point placed by a garden-style layer. Seeds carry their
/// own two-pass export behavior and are deduplicated by identity across
/// the tiles of a region.
pub trait Seed: Send + Sync {
    fn id(&self) -> u64;

    /// First pass: place the seed's root structure.
    fn plant(&self, dimension: &dyn Dimension, target: &mut dyn WorldTarget);

    /// Second pass: grow the structure once neighbors exist.
    fn grow(&self, dimension: &dyn Dimension, target: &mut dyn WorldTarget);
}

/// One 128x128-block unit of the authored terrain model. Read-only during
/// export; built up front and shared behind `Arc`.
pub struct Tile {
    pub coord: TileCoord,
    heights: Vec<i32>,
    water: Vec<i32>,
    layers: Vec<Layer>,
    seeds: Vec<Arc<dyn Seed>>,
}

const NO_WATER: i32 = i32::MIN;

impl Tile {
    pub fn new(coord: TileCoord, default_height: i32) -> Self {
        let area = (TILE_SIZE * TILE_SIZE) as usize;
        Self {
            coord,
            heights: vec![default_height; area],
            water: vec![NO_WATER; area],
            layers: Vec::new(),
            seeds: Vec::new(),
        }
    }

    #[inline]
    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let (ox, oz) = self.coord.block_origin();
        let dx = x - ox;
        let dz = z - oz;
        if dx < 0 || dz < 0 || dx >= TILE_SIZE || dz >= TILE_SIZE {
            return None;
        }
        Some((dz * TILE_SIZE + dx) as usize)
    }

    /// Terrain height at world-space column (x, z); `None` outside the tile.
    #[inline]
    pub fn height_at(&self, x: i32, z: i32) -> Option<i32> {
        self.index(x, z).map(|i| self.heights[i])
    }

    /// Water level at world-space column (x, z); `None` when dry or
    /// outside the tile.
    #[inline]
    pub fn water_level_at(&self, x: i32, z: i32) -> Option<i32> {
        self.index(x, z)
            .map(|i| self.water[i])
            .filter(|&w| w != NO_WATER)
    }

    pub fn set_height(&mut self, x: i32, z: i32, height: i32) {
        if let Some(i) = self.index(x, z) {
            self.heights[i] = height;
        }
    }

    pub fn set_water_level(&mut self, x: i32, z: i32, level: i32) {
        if let Some(i) = self.index(x, z) {
            self.water[i] = level;
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn add_layer(&mut self, layer: Layer) {
        if !self.layers.contains(&layer) {
            self.layers.push(layer);
        }
    }

    pub fn seeds(&self) -> &[Arc<dyn Seed>] {
        &self.seeds
    }

    pub fn add_seed(&mut self, seed: Arc<dyn Seed>) {
        self.seeds.push(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_are_addressed_in_world_space() {
        let mut tile = Tile::new(TileCoord::new(-1, 2), 40);
        assert_eq!(tile.height_at(-1, 256), Some(40));
        assert_eq!(tile.height_at(0, 256), None);
        tile.set_height(-128, 383, 55);
        assert_eq!(tile.height_at(-128, 383), Some(55));
        assert_eq!(tile.water_level_at(-1, 256), None);
        tile.set_water_level(-1, 256, 62);
        assert_eq!(tile.water_level_at(-1, 256), Some(62));
    }
}
