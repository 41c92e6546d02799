//! Chunk containers, chunk synthesis, and the per-region voxel grid.
#![forbid(unsafe_code)]

mod border;
mod chunk;
mod factory;
mod grid;
mod synth;

pub use border::{bedrock_wall_chunk, border_chunk};
pub use chunk::{BIOME_PLAINS, Chunk, Entity, InvertedChunk, LEAF_DISTANCE_FAR, TileEntity};
pub use factory::{AreaStats, ChunkCreationResult, ChunkFactory, HeightmapChunkFactory};
pub use grid::RegionGrid;
pub use synth::{SynthesisContext, create_chunk};
