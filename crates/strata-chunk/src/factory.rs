use std::ops::AddAssign;
use std::sync::Arc;

use strata_blocks::BlockRegistry;
use strata_world::{BlockRect, ChunkCoord, Dimension, expand_layers};

use crate::chunk::Chunk;

/// Area statistics for generated chunks. Accumulation is commutative and
/// associative, so regions may combine in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AreaStats {
    pub land_area: u64,
    pub surface_area: u64,
    pub water_area: u64,
}

impl AddAssign for AreaStats {
    fn add_assign(&mut self, rhs: AreaStats) {
        self.land_area += rhs.land_area;
        self.surface_area += rhs.surface_area;
        self.water_area += rhs.water_area;
    }
}

pub struct ChunkCreationResult {
    pub chunk: Chunk,
    pub stats: AreaStats,
}

/// Per-chunk terrain + layer synthesis. The algorithms behind this are
/// external to the export pipeline; the pipeline only requires that a
/// factory produce a chunk (or nothing) for a coordinate.
pub trait ChunkFactory: Send + Sync {
    fn max_height(&self) -> i32;

    fn create_chunk(&self, coord: ChunkCoord) -> Option<ChunkCreationResult>;
}

/// Reference factory: builds terrain columns straight from the authored
/// tile heights and water levels, then runs the ordinary pass of every
/// exported layer painted on the owning tile.
pub struct HeightmapChunkFactory {
    dimension: Arc<dyn Dimension>,
    registry: Arc<BlockRegistry>,
    max_height: i32,
}

impl HeightmapChunkFactory {
    pub fn new(
        dimension: Arc<dyn Dimension>,
        registry: Arc<BlockRegistry>,
        max_height: i32,
    ) -> Self {
        Self {
            dimension,
            registry,
            max_height,
        }
    }
}

impl ChunkFactory for HeightmapChunkFactory {
    fn max_height(&self) -> i32 {
        self.max_height
    }

    fn create_chunk(&self, coord: ChunkCoord) -> Option<ChunkCreationResult> {
        let tile = self.dimension.tile(coord.tile())?;
        let reg = &self.registry;
        let bedrock = reg.block("bedrock");
        let stone = reg.block("stone");
        let dirt = reg.block("dirt");
        let grass = reg.block("grass");
        let sand = reg.block("sand");
        let water = reg.block("water");

        let mut chunk = Chunk::new(coord, self.max_height);
        let mut stats = AreaStats::default();
        let (ox, oz) = coord.block_origin();
        for z in 0..16usize {
            for x in 0..16usize {
                let wx = ox + x as i32;
                let wz = oz + z as i32;
                let h = tile
                    .height_at(wx, wz)
                    .unwrap_or(0)
                    .clamp(0, self.max_height - 1);
                let water_level = tile
                    .water_level_at(wx, wz)
                    .map(|w| w.clamp(0, self.max_height - 1));
                let flooded = water_level.is_some_and(|w| w > h);
                chunk.set_local(x, 0, z, bedrock);
                for y in 1..=h as usize {
                    let b = if y as i32 == h {
                        if flooded { sand } else { grass }
                    } else if y as i32 >= h - 2 {
                        dirt
                    } else {
                        stone
                    };
                    chunk.set_local(x, y, z, b);
                }
                if let Some(w) = water_level {
                    for y in (h + 1)..=w {
                        chunk.set_local(x, y as usize, z, water);
                    }
                }
                chunk.set_height(x, z, h);
                stats.surface_area += 1;
                if flooded {
                    stats.water_area += 1;
                } else {
                    stats.land_area += 1;
                }
            }
        }
        chunk.terrain_populated = true;

        // Ordinary (no neighbor access) layer pass over this chunk only.
        let mut layers: Vec<_> = tile.layers().to_vec();
        layers.extend(self.dimension.minimum_layers());
        let mut layers = expand_layers(layers);
        layers.sort();
        let rect = BlockRect::new(ox, oz, ox + 16, oz + 16);
        for layer in &layers {
            if let Some(exporter) = self.dimension.exporter_for(layer) {
                exporter.ordinary_pass(self.dimension.as_ref(), rect, &mut chunk);
            }
        }

        Some(ChunkCreationResult { chunk, stats })
    }
}
