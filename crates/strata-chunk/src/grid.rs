use strata_blocks::Block;
use strata_world::{ChunkCoord, REGION_CHUNKS, RegionCoord, WorldTarget};

use crate::chunk::Chunk;

const GRID_SPAN: i32 = REGION_CHUNKS + 2;

/// Per-region voxel grid: the 32x32 chunk footprint plus a one-chunk
/// padding ring used for neighbor context during synthesis. Only the
/// inner footprint is persisted.
pub struct RegionGrid {
    pub coord: RegionCoord,
    max_height: i32,
    chunks: Vec<Option<Chunk>>,
}

impl RegionGrid {
    pub fn new(coord: RegionCoord, max_height: i32) -> Self {
        Self {
            coord,
            max_height,
            chunks: (0..GRID_SPAN * GRID_SPAN).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn max_height(&self) -> i32 {
        self.max_height
    }

    #[inline]
    fn index(&self, chunk: ChunkCoord) -> Option<usize> {
        let first = self.coord.first_chunk();
        let dx = chunk.cx - first.cx + 1;
        let dz = chunk.cz - first.cz + 1;
        if dx < 0 || dz < 0 || dx >= GRID_SPAN || dz >= GRID_SPAN {
            return None;
        }
        Some((dz * GRID_SPAN + dx) as usize)
    }

    pub fn get_chunk(&self, chunk: ChunkCoord) -> Option<&Chunk> {
        self.index(chunk).and_then(|i| self.chunks[i].as_ref())
    }

    pub fn get_chunk_mut(&mut self, chunk: ChunkCoord) -> Option<&mut Chunk> {
        self.index(chunk).and_then(|i| self.chunks[i].as_mut())
    }

    /// Insert a synthesized chunk. Chunks outside the padded window are
    /// dropped.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        debug_assert_eq!(chunk.max_height, self.max_height);
        if let Some(i) = self.index(chunk.coord) {
            self.chunks[i] = Some(chunk);
        } else {
            debug_assert!(false, "chunk {:?} outside region window", chunk.coord);
        }
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().flatten()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.iter_mut().flatten()
    }

    /// Chunks of the exported footprint, excluding the padding ring.
    pub fn inner_chunks(&self) -> impl Iterator<Item = &Chunk> {
        let region = self.coord;
        self.chunks().filter(move |c| c.coord.region() == region)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks().next().is_none()
    }

    pub fn leaf_distance_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.max_height {
            return crate::chunk::LEAF_DISTANCE_FAR;
        }
        match self.get_chunk(ChunkCoord::of_block(x, z)) {
            Some(chunk) => chunk.leaf_distance((x & 15) as usize, y as usize, (z & 15) as usize),
            None => crate::chunk::LEAF_DISTANCE_FAR,
        }
    }

    pub fn set_leaf_distance_at(&mut self, x: i32, y: i32, z: i32, distance: u8) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.get_chunk_mut(ChunkCoord::of_block(x, z)) {
            chunk.set_leaf_distance((x & 15) as usize, y as usize, (z & 15) as usize, distance);
        }
    }
}

impl WorldTarget for RegionGrid {
    fn max_height(&self) -> i32 {
        self.max_height
    }

    fn block_at(&self, x: i32, y: i32, z: i32) -> Block {
        if y < 0 || y >= self.max_height {
            return Block::AIR;
        }
        match self.get_chunk(ChunkCoord::of_block(x, z)) {
            Some(chunk) => chunk.get_local((x & 15) as usize, y as usize, (z & 15) as usize),
            None => Block::AIR,
        }
    }

    fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.get_chunk_mut(ChunkCoord::of_block(x, z)) {
            chunk.set_local((x & 15) as usize, y as usize, (z & 15) as usize, block);
        }
    }

    fn sky_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.max_height {
            return 0;
        }
        match self.get_chunk(ChunkCoord::of_block(x, z)) {
            Some(chunk) => chunk.sky_light_local((x & 15) as usize, y as usize, (z & 15) as usize),
            None => 0,
        }
    }

    fn set_sky_light(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.get_chunk_mut(ChunkCoord::of_block(x, z)) {
            chunk.set_sky_light_local((x & 15) as usize, y as usize, (z & 15) as usize, level);
        }
    }

    fn block_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.max_height {
            return 0;
        }
        match self.get_chunk(ChunkCoord::of_block(x, z)) {
            Some(chunk) => {
                chunk.block_light_local((x & 15) as usize, y as usize, (z & 15) as usize)
            }
            None => 0,
        }
    }

    fn set_block_light(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.get_chunk_mut(ChunkCoord::of_block(x, z)) {
            chunk.set_block_light_local((x & 15) as usize, y as usize, (z & 15) as usize, level);
        }
    }

    fn has_chunk(&self, chunk: ChunkCoord) -> bool {
        self.get_chunk(chunk).is_some()
    }
}
