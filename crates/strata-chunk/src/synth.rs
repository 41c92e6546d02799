use std::collections::HashMap;
use std::sync::Arc;

use strata_blocks::BlockRegistry;
use strata_world::{
    Border, ChunkCoord, Dimension, Tile, TileCoord, is_border_chunk, is_world_chunk,
};

use crate::border::{bedrock_wall_chunk, border_chunk};
use crate::factory::{ChunkCreationResult, ChunkFactory};

/// Everything the per-chunk synthesis policy needs about the region being
/// exported.
pub struct SynthesisContext<'a> {
    pub dimension: &'a dyn Dimension,
    pub factory: &'a dyn ChunkFactory,
    pub registry: &'a BlockRegistry,
    /// Tiles gathered for the region window; in selection mode these are
    /// already filtered down to the selected set.
    pub tiles: &'a HashMap<TileCoord, Arc<Tile>>,
    pub tile_selection: bool,
    pub ceiling: bool,
}

/// Decide what (if anything) exists at a chunk coordinate and synthesize
/// it. Chunks outside known space are `None`; downstream passes treat that
/// as "no data".
pub fn create_chunk(ctx: &SynthesisContext<'_>, coord: ChunkCoord) -> Option<ChunkCreationResult> {
    let dim = ctx.dimension;
    let tile_coord = coord.tile();
    if ctx.tile_selection {
        // Partial re-export: only selected tiles, never border or wall
        // synthesis.
        if ctx.tiles.contains_key(&tile_coord) {
            return ctx.factory.create_chunk(coord);
        }
        return None;
    }
    if dim.tile(tile_coord).is_some() {
        return ctx.factory.create_chunk(coord);
    }
    let endless = dim.border().map(Border::is_endless).unwrap_or(false);
    if ctx.ceiling || endless {
        // Ceiling dimensions and endless borders get no synthetic edge.
        return None;
    }
    let tile_exists = |t: TileCoord| dim.tile(t).is_some();
    let border_active = dim.border_active();
    if border_active && is_border_chunk(tile_exists, dim.border_size(), coord) {
        let border = dim.border().unwrap_or(Border::Void);
        return Some(border_chunk(
            coord,
            border,
            dim.border_level(),
            ctx.factory.max_height(),
            ctx.registry,
        ));
    }
    if dim.bedrock_wall() {
        let adjacent = [
            coord.offset(-1, 0),
            coord.offset(0, -1),
            coord.offset(1, 0),
            coord.offset(0, 1),
        ];
        let walled = if border_active {
            adjacent
                .iter()
                .any(|&c| is_border_chunk(tile_exists, dim.border_size(), c))
        } else {
            adjacent.iter().any(|&c| is_world_chunk(tile_exists, c))
        };
        if walled {
            return Some(bedrock_wall_chunk(
                coord,
                ctx.factory.max_height(),
                ctx.registry,
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::HeightmapChunkFactory;
    use strata_world::{DimensionId, MemoryDimension};

    fn context<'a>(
        dim: &'a MemoryDimension,
        factory: &'a HeightmapChunkFactory,
        registry: &'a BlockRegistry,
        tiles: &'a HashMap<TileCoord, Arc<Tile>>,
        tile_selection: bool,
    ) -> SynthesisContext<'a> {
        SynthesisContext {
            dimension: dim,
            factory,
            registry,
            tiles,
            tile_selection,
            ceiling: false,
        }
    }

    fn single_tile_world(bedrock_wall: bool, border: Option<Border>) -> Arc<MemoryDimension> {
        let mut dim = MemoryDimension::new(DimensionId::Surface, "test", 64);
        dim.fill_tiles(TileCoord::new(0, 0), TileCoord::new(0, 0), 10);
        dim.bedrock_wall = bedrock_wall;
        dim.border = border;
        if border.is_some() {
            dim.border_size = 1;
        }
        Arc::new(dim)
    }

    #[test]
    fn outside_known_space_is_absent() {
        let dim = single_tile_world(false, None);
        let reg = Arc::new(BlockRegistry::builtin());
        let factory = HeightmapChunkFactory::new(dim.clone(), reg.clone(), 64);
        let tiles = HashMap::new();
        let ctx = context(&dim, &factory, &reg, &tiles, false);
        assert!(create_chunk(&ctx, ChunkCoord::new(0, 0)).is_some());
        assert!(create_chunk(&ctx, ChunkCoord::new(8, 0)).is_none());
        assert!(create_chunk(&ctx, ChunkCoord::new(-1, -1)).is_none());
    }

    #[test]
    fn bedrock_wall_hugs_the_world_edge() {
        let dim = single_tile_world(true, None);
        let reg = Arc::new(BlockRegistry::builtin());
        let factory = HeightmapChunkFactory::new(dim.clone(), reg.clone(), 64);
        let tiles = HashMap::new();
        let ctx = context(&dim, &factory, &reg, &tiles, false);
        // Chunk just east of the world is wall; diagonal-only contact is not.
        let wall = create_chunk(&ctx, ChunkCoord::new(8, 0)).unwrap();
        assert_eq!(wall.stats.surface_area, 256);
        assert_eq!(wall.chunk.get_local(0, 63, 0), reg.block("bedrock"));
        assert!(create_chunk(&ctx, ChunkCoord::new(8, 8)).is_none());
    }

    #[test]
    fn border_then_wall_around_border() {
        let dim = single_tile_world(true, Some(Border::Water));
        let reg = Arc::new(BlockRegistry::builtin());
        let factory = HeightmapChunkFactory::new(dim.clone(), reg.clone(), 64);
        let tiles = HashMap::new();
        let ctx = context(&dim, &factory, &reg, &tiles, false);
        // One tile of water border past the world edge.
        let border = create_chunk(&ctx, ChunkCoord::new(8, 0)).unwrap();
        assert_eq!(border.stats.water_area, 256);
        // The wall now sits adjacent to border chunks, one tile further out.
        let wall = create_chunk(&ctx, ChunkCoord::new(16, 0)).unwrap();
        assert_eq!(wall.chunk.get_local(0, 0, 0), reg.block("bedrock"));
        assert_eq!(wall.stats.land_area, 0);
        assert!(create_chunk(&ctx, ChunkCoord::new(17, 0)).is_none());
    }

    #[test]
    fn selection_mode_suppresses_synthetic_chunks() {
        let dim = single_tile_world(true, Some(Border::Water));
        let reg = Arc::new(BlockRegistry::builtin());
        let factory = HeightmapChunkFactory::new(dim.clone(), reg.clone(), 64);
        let mut tiles = HashMap::new();
        tiles.insert(TileCoord::new(0, 0), dim.tile(TileCoord::new(0, 0)).unwrap());
        let ctx = context(&dim, &factory, &reg, &tiles, true);
        assert!(create_chunk(&ctx, ChunkCoord::new(0, 0)).is_some());
        // No border or wall synthesis during partial re-export.
        assert!(create_chunk(&ctx, ChunkCoord::new(8, 0)).is_none());
        assert!(create_chunk(&ctx, ChunkCoord::new(16, 0)).is_none());
    }

    #[test]
    fn endless_border_suppresses_edge_synthesis() {
        let dim = single_tile_world(true, Some(Border::EndlessWater));
        let reg = Arc::new(BlockRegistry::builtin());
        let factory = HeightmapChunkFactory::new(dim.clone(), reg.clone(), 64);
        let tiles = HashMap::new();
        let ctx = context(&dim, &factory, &reg, &tiles, false);
        assert!(create_chunk(&ctx, ChunkCoord::new(8, 0)).is_none());
    }
}
