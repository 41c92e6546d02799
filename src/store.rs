use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use strata_blocks::Block;
use strata_chunk::{Chunk, RegionGrid};
use strata_world::{ChunkCoord, DimensionId, RegionCoord, WorldTarget};

use crate::error::StoreError;

/// Persistence collaborator. The binary encoding of the saved world is
/// outside this system; the pipeline only needs region save and a
/// read-modify-write handle for applying fixups to already-saved chunks.
pub trait RegionStore: Send + Sync {
    fn save_region(
        &self,
        grid: &RegionGrid,
        dimension: DimensionId,
        coords: RegionCoord,
    ) -> Result<(), StoreError>;

    /// Open the saved world for fixups. The handle is released
    /// deterministically when dropped.
    fn open_for_fixups(
        &self,
        dimension: DimensionId,
        max_height: i32,
    ) -> Result<Box<dyn WorldTarget + '_>, StoreError>;
}

/// In-memory store keeping saved chunks per dimension. Reference
/// implementation backing the test suite.
#[derive(Default)]
pub struct MemoryRegionStore {
    chunks: Mutex<HashMap<(DimensionId, ChunkCoord), Chunk>>,
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_count(&self, dimension: DimensionId) -> usize {
        let chunks = self.chunks.lock().unwrap();
        chunks.keys().filter(|(d, _)| *d == dimension).count()
    }

    pub fn chunk(&self, dimension: DimensionId, coord: ChunkCoord) -> Option<Chunk> {
        let chunks = self.chunks.lock().unwrap();
        chunks.get(&(dimension, coord)).cloned()
    }
}

impl RegionStore for MemoryRegionStore {
    fn save_region(
        &self,
        grid: &RegionGrid,
        dimension: DimensionId,
        coords: RegionCoord,
    ) -> Result<(), StoreError> {
        debug_assert_eq!(grid.coord, coords);
        let mut chunks = self.chunks.lock().unwrap();
        for chunk in grid.inner_chunks() {
            chunks.insert((dimension, chunk.coord), chunk.clone());
        }
        Ok(())
    }

    fn open_for_fixups(
        &self,
        dimension: DimensionId,
        max_height: i32,
    ) -> Result<Box<dyn WorldTarget + '_>, StoreError> {
        Ok(Box::new(MemoryFixupWorld {
            chunks: self.chunks.lock().unwrap(),
            dimension,
            max_height,
        }))
    }
}

struct MemoryFixupWorld<'a> {
    chunks: MutexGuard<'a, HashMap<(DimensionId, ChunkCoord), Chunk>>,
    dimension: DimensionId,
    max_height: i32,
}

impl MemoryFixupWorld<'_> {
    fn chunk(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(&(self.dimension, ChunkCoord::of_block(x, z)))
    }

    fn chunk_mut(&mut self, x: i32, z: i32) -> Option<&mut Chunk> {
        self.chunks
            .get_mut(&(self.dimension, ChunkCoord::of_block(x, z)))
    }
}

impl WorldTarget for MemoryFixupWorld<'_> {
    fn max_height(&self) -> i32 {
        self.max_height
    }

    fn block_at(&self, x: i32, y: i32, z: i32) -> Block {
        if y < 0 || y >= self.max_height {
            return Block::AIR;
        }
        match self.chunk(x, z) {
            Some(chunk) => chunk.get_local((x & 15) as usize, y as usize, (z & 15) as usize),
            None => Block::AIR,
        }
    }

    fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.chunk_mut(x, z) {
            chunk.set_local((x & 15) as usize, y as usize, (z & 15) as usize, block);
        }
    }

    fn sky_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.max_height {
            return 0;
        }
        match self.chunk(x, z) {
            Some(chunk) => chunk.sky_light_local((x & 15) as usize, y as usize, (z & 15) as usize),
            None => 0,
        }
    }

    fn set_sky_light(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if y < 0 || y >= self.max_height {
            return;
        }
        if let Some(chunk) = self.chunk_mut(x, z) {
            chunk.set_sky_light_local((x & 15) as usize, y as usize, (z & 15) as usize, level);
        }
    }

    fn block_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.max_height {
            return 0;
        }
        match self.chunk(x, z) {
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
        if let Some(chunk) = self.chunk_mut(x, z) {
            chunk.set_block_light_local((x & 15) as usize, y as usize, (z & 15) as usize, level);
        }
    }

    fn has_chunk(&self, chunk: ChunkCoord) -> bool {
        self.chunks.contains_key(&(self.dimension, chunk))
    }
}
