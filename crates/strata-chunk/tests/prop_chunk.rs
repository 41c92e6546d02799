use proptest::prelude::*;
use strata_blocks::Block;
use strata_chunk::{Chunk, InvertedChunk, RegionGrid};
use strata_world::{ChunkCoord, RegionCoord, WorldTarget};

fn height() -> impl Strategy<Value = i32> {
    8i32..=64
}

proptest! {
    // Local writes are observable at the matching world coordinate and
    // nowhere else
    #[test]
    fn grid_world_and_local_agree(
        rx in -100i32..=100,
        rz in -100i32..=100,
        dx in 0i32..32,
        dz in 0i32..32,
        lx in 0usize..16,
        lz in 0usize..16,
        y in 0usize..8,
        max_height in height(),
    ) {
        let region = RegionCoord::new(rx, rz);
        let chunk_coord = region.first_chunk().offset(dx, dz);
        let mut grid = RegionGrid::new(region, max_height);
        grid.add_chunk(Chunk::new(chunk_coord, max_height));
        let (ox, oz) = chunk_coord.block_origin();
        let wx = ox + lx as i32;
        let wz = oz + lz as i32;
        grid.set_block(wx, y as i32, wz, Block::new(3));
        let chunk = grid.get_chunk(chunk_coord).unwrap();
        prop_assert_eq!(chunk.get_local(lx, y, lz), Block::new(3));
        prop_assert_eq!(grid.block_at(wx, y as i32, wz), Block::new(3));
        // The write did not leak into any other cell of the chunk.
        let mut hits = 0;
        for cy in 0..max_height as usize {
            for cz in 0..16 {
                for cx in 0..16 {
                    if chunk.get_local(cx, cy, cz) != Block::AIR {
                        hits += 1;
                    }
                }
            }
        }
        prop_assert_eq!(hits, 1);
    }

    // The inversion is exactly y -> max_height - 1 - delta - y, air beyond
    #[test]
    fn inverted_chunk_matches_reflection(
        max_height in height(),
        delta in 0i32..8,
        y in 0usize..64,
    ) {
        prop_assume!((y as i32) < max_height);
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), max_height);
        chunk.set_local(1, y, 2, Block::new(9));
        let inv = InvertedChunk::new(chunk, delta);
        let expected_y = max_height - 1 - delta - y as i32;
        for ry in 0..max_height as usize {
            let expect = if ry as i32 == expected_y && expected_y >= 0 {
                Block::new(9)
            } else {
                Block::AIR
            };
            prop_assert_eq!(inv.get_local(1, ry, 2), expect);
        }
    }
}
