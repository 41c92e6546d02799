//! Terrain model interfaces and the tile/chunk/region coordinate model.
#![forbid(unsafe_code)]

pub mod coords;
pub mod dimension;
pub mod layer;
pub mod memory;
pub mod settings;
pub mod target;
pub mod tile;

pub use coords::{
    BlockRect, CHUNK_SIZE, ChunkCoord, REGION_CHUNKS, REGION_SIZE, RegionCoord, TILE_CHUNKS,
    TILE_SIZE, TileCoord, is_border_chunk, is_world_chunk,
};
pub use dimension::{Border, Dimension, DimensionId};
pub use layer::{Fixup, FixupError, Layer, LayerExporter, LayerKind, Stage, StageSet, expand_layers};
pub use memory::MemoryDimension;
pub use settings::ExportSettings;
pub use target::{InvertedWorld, WorldTarget};
pub use tile::{Seed, Tile};
