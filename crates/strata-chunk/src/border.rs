use strata_blocks::BlockRegistry;
use strata_world::{Border, ChunkCoord};

use crate::chunk::{BIOME_PLAINS, Chunk};
use crate::factory::{AreaStats, ChunkCreationResult};

/// Uniform full-height bedrock chunk sealing the world edge.
pub fn bedrock_wall_chunk(
    coord: ChunkCoord,
    max_height: i32,
    registry: &BlockRegistry,
) -> ChunkCreationResult {
    let bedrock = registry.block("bedrock");
    let mut chunk = Chunk::new(coord, max_height);
    let max_y = max_height - 1;
    for z in 0..16usize {
        for x in 0..16usize {
            chunk.set_biome(x, z, BIOME_PLAINS);
            for y in 0..=max_y as usize {
                chunk.set_local(x, y, z, bedrock);
            }
            chunk.set_height(x, z, max_y);
        }
    }
    chunk.terrain_populated = true;
    ChunkCreationResult {
        chunk,
        stats: AreaStats {
            land_area: 0,
            surface_area: 256,
            water_area: 0,
        },
    }
}

/// Synthetic chunk giving the world a finished edge outside the authored
/// tiles: a flat fill chosen by the border type, with the fluid surface
/// (when any) at the border level.
pub fn border_chunk(
    coord: ChunkCoord,
    border: Border,
    border_level: i32,
    max_height: i32,
    registry: &BlockRegistry,
) -> ChunkCreationResult {
    let mut chunk = Chunk::new(coord, max_height);
    let mut stats = AreaStats::default();
    let level = border_level.clamp(0, max_height - 1);
    match border {
        Border::Void | Border::EndlessVoid => {}
        Border::Water | Border::Lava | Border::EndlessWater | Border::EndlessLava => {
            let watery = matches!(border, Border::Water | Border::EndlessWater);
            let fluid = registry.block(if watery { "water" } else { "lava" });
            let floor = (level - 4).max(0);
            fill_columns(&mut chunk, registry, floor, level, Some(fluid));
            stats.surface_area = 256;
            if watery {
                stats.water_area = 256;
            }
        }
        Border::Barren => {
            fill_columns(&mut chunk, registry, level, level, None);
            stats.surface_area = 256;
            stats.land_area = 256;
        }
    }
    chunk.terrain_populated = true;
    ChunkCreationResult { chunk, stats }
}

fn fill_columns(
    chunk: &mut Chunk,
    registry: &BlockRegistry,
    floor: i32,
    level: i32,
    fluid: Option<strata_blocks::Block>,
) {
    let bedrock = registry.block("bedrock");
    let stone = registry.block("stone");
    for z in 0..16usize {
        for x in 0..16usize {
            chunk.set_biome(x, z, BIOME_PLAINS);
            chunk.set_local(x, 0, z, bedrock);
            for y in 1..=floor as usize {
                chunk.set_local(x, y, z, stone);
            }
            if let Some(fluid) = fluid {
                for y in (floor + 1)..=level {
                    chunk.set_local(x, y as usize, z, fluid);
                }
            }
            chunk.set_height(x, z, floor);
        }
    }
}
