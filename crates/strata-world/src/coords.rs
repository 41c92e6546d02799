use serde::{Deserialize, Serialize};

/// Edge length of a tile in blocks.
pub const TILE_SIZE: i32 = 128;
/// Edge length of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;
/// Chunks per tile edge.
pub const TILE_CHUNKS: i32 = 8;
/// Chunks per region edge.
pub const REGION_CHUNKS: i32 = 32;
/// Edge length of a region in blocks.
pub const REGION_SIZE: i32 = 512;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub tx: i32,
    pub tz: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCoord {
    pub rx: i32,
    pub rz: i32,
}

impl TileCoord {
    #[inline]
    pub const fn new(tx: i32, tz: i32) -> Self {
        Self { tx, tz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.tx + dx, self.tz + dz)
    }

    /// Region that owns this tile. Arithmetic shift keeps floor semantics
    /// for negative coordinates.
    #[inline]
    pub fn region(self) -> RegionCoord {
        RegionCoord::new(self.tx >> 2, self.tz >> 2)
    }

    /// North-west chunk of this tile.
    #[inline]
    pub fn first_chunk(self) -> ChunkCoord {
        ChunkCoord::new(self.tx * TILE_CHUNKS, self.tz * TILE_CHUNKS)
    }

    /// World-space block origin of this tile.
    #[inline]
    pub fn block_origin(self) -> (i32, i32) {
        (self.tx * TILE_SIZE, self.tz * TILE_SIZE)
    }
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.cx + dx, self.cz + dz)
    }

    #[inline]
    pub fn tile(self) -> TileCoord {
        TileCoord::new(self.cx >> 3, self.cz >> 3)
    }

    #[inline]
    pub fn region(self) -> RegionCoord {
        RegionCoord::new(self.cx >> 5, self.cz >> 5)
    }

    #[inline]
    pub fn block_origin(self) -> (i32, i32) {
        (self.cx << 4, self.cz << 4)
    }

    /// Chunk that owns world-space block column (x, z).
    #[inline]
    pub fn of_block(x: i32, z: i32) -> Self {
        Self::new(x >> 4, z >> 4)
    }
}

impl RegionCoord {
    #[inline]
    pub const fn new(rx: i32, rz: i32) -> Self {
        Self { rx, rz }
    }

    #[inline]
    pub fn block_origin(self) -> (i32, i32) {
        (self.rx << 9, self.rz << 9)
    }

    #[inline]
    pub fn first_chunk(self) -> ChunkCoord {
        ChunkCoord::new(self.rx << 5, self.rz << 5)
    }

    /// Inclusive chunk bounding box of the region footprint.
    #[inline]
    pub fn chunk_bounds(self) -> (ChunkCoord, ChunkCoord) {
        let first = self.first_chunk();
        (first, first.offset(REGION_CHUNKS - 1, REGION_CHUNKS - 1))
    }

    /// Inclusive chunk bounding box padded by one chunk on each side, the
    /// window chunk synthesis runs over so that neighbor context exists at
    /// the region edge.
    #[inline]
    pub fn chunk_bounds_padded(self) -> (ChunkCoord, ChunkCoord) {
        let first = self.first_chunk();
        (first.offset(-1, -1), first.offset(REGION_CHUNKS, REGION_CHUNKS))
    }

    /// Inclusive tile bounding box padded by one tile on each side: the
    /// 6x6-tile discovery window for one region.
    #[inline]
    pub fn tile_bounds_padded(self) -> (TileCoord, TileCoord) {
        let low = TileCoord::new((self.rx << 2) - 1, (self.rz << 2) - 1);
        (low, low.offset(5, 5))
    }

    /// The exported block footprint of this region.
    #[inline]
    pub fn block_rect(self) -> BlockRect {
        let (x0, z0) = self.block_origin();
        BlockRect::new(x0, z0, x0 + REGION_SIZE, z0 + REGION_SIZE)
    }

    /// The eight neighboring regions.
    pub fn neighbors(self) -> [RegionCoord; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.rx + dx, self.rz + dz)
    }
}

/// Axis-aligned block-column rectangle, lower bounds inclusive, upper
/// bounds exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRect {
    pub x0: i32,
    pub z0: i32,
    pub x1: i32,
    pub z1: i32,
}

impl BlockRect {
    #[inline]
    pub const fn new(x0: i32, z0: i32, x1: i32, z1: i32) -> Self {
        Self { x0, z0, x1, z1 }
    }

    #[inline]
    pub fn padded(self, margin: i32) -> Self {
        Self::new(self.x0 - margin, self.z0 - margin, self.x1 + margin, self.z1 + margin)
    }

    #[inline]
    pub fn contains(self, x: i32, z: i32) -> bool {
        x >= self.x0 && x < self.x1 && z >= self.z0 && z < self.z1
    }

    #[inline]
    pub fn width(self) -> i32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn depth(self) -> i32 {
        self.z1 - self.z0
    }
}

/// Whether a tile of the authored terrain exists at the chunk's coordinate.
#[inline]
pub fn is_world_chunk(tile_exists: impl Fn(TileCoord) -> bool, chunk: ChunkCoord) -> bool {
    tile_exists(chunk.tile())
}

/// Whether a chunk lies outside the authored area but within `border_size`
/// tiles (Chebyshev distance) of an authored tile.
pub fn is_border_chunk(
    tile_exists: impl Fn(TileCoord) -> bool,
    border_size: i32,
    chunk: ChunkCoord,
) -> bool {
    if border_size <= 0 {
        return false;
    }
    let tile = chunk.tile();
    if tile_exists(tile) {
        return false;
    }
    for dx in -border_size..=border_size {
        for dz in -border_size..=border_size {
            if tile_exists(tile.offset(dx, dz)) {
                return true;
            }
        }
    }
    false
}
