use strata_blocks::BlockRegistry;
use strata_chunk::{Chunk, InvertedChunk};

use crate::error::ExportError;

/// Merge the ceiling's inverted blocks into the destination chunk.
///
/// A destination block is replaced only when the source improves
/// solidity: air accepts any non-air source, a non-air insubstantial
/// block accepts only a solid source. Light levels travel with the
/// replacement, and tile-entity state is relocated (evicting any record
/// already at the destination coordinate). Entities are appended without
/// deduplication; the merge runs once per chunk pair.
pub fn merge_chunks(
    source: &mut InvertedChunk,
    destination: &mut Chunk,
    registry: &BlockRegistry,
) -> Result<(), ExportError> {
    let max_height = source.max_height();
    if max_height != destination.max_height {
        return Err(ExportError::Config(format!(
            "merge height mismatch: {} vs {}",
            max_height, destination.max_height
        )));
    }
    let (ox, oz) = destination.coord.block_origin();
    for y in 0..max_height as usize {
        for x in 0..16usize {
            for z in 0..16usize {
                let dest = destination.get_local(x, y, z);
                if registry.is_solid(dest) {
                    continue;
                }
                let src = source.get_local(x, y, z);
                let replace = if dest.is_air() {
                    !src.is_air()
                } else {
                    registry.is_solid(src)
                };
                if !replace {
                    continue;
                }
                destination.set_local(x, y, z, src);
                destination.set_block_light_local(x, y, z, source.block_light_local(x, y, z));
                destination.set_sky_light_local(x, y, z, source.sky_light_local(x, y, z));
                if registry.has_tile_entity(src) {
                    let wx = ox + x as i32;
                    let wz = oz + z as i32;
                    // Evict whatever was at the destination first so the
                    // relocation cannot produce duplicate records.
                    destination.remove_tile_entity_at(wx, y as i32, wz);
                    if let Some(mut entity) = source.take_tile_entity_at(wx, y as i32, wz) {
                        entity.y = y as i32;
                        destination.tile_entities.push(entity);
                    }
                }
            }
        }
    }
    destination.entities.extend(source.take_entities());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::Block;
    use strata_chunk::TileEntity;
    use strata_world::ChunkCoord;

    fn registry() -> BlockRegistry {
        BlockRegistry::builtin()
    }

    fn ceiling_chunk(reg: &BlockRegistry, max_height: i32) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), max_height);
        // Ceiling terrain at its own bottom: stone at y 0..=2.
        for z in 0..16 {
            for x in 0..16 {
                for y in 0..=2 {
                    chunk.set_local(x, y, z, reg.block("stone"));
                }
            }
        }
        chunk
    }

    #[test]
    fn merge_improves_solidity_only() {
        let reg = registry();
        let mut dest = Chunk::new(ChunkCoord::new(0, 0), 32);
        // Water column at the top where the ceiling will land, plus one
        // solid block that must survive.
        dest.set_local(4, 31, 4, reg.block("water"));
        dest.set_local(5, 31, 5, reg.block("bedrock"));
        let mut source = InvertedChunk::new(ceiling_chunk(&reg, 32), 0);
        merge_chunks(&mut source, &mut dest, &reg).unwrap();
        // Air replaced by inverted stone at the top three layers.
        assert_eq!(dest.get_local(0, 31, 0), reg.block("stone"));
        assert_eq!(dest.get_local(0, 29, 0), reg.block("stone"));
        assert_eq!(dest.get_local(0, 28, 0), Block::AIR);
        // Insubstantial water replaced by solid stone; solid kept.
        assert_eq!(dest.get_local(4, 31, 4), reg.block("stone"));
        assert_eq!(dest.get_local(5, 31, 5), reg.block("bedrock"));
    }

    #[test]
    fn merge_is_idempotent_under_solidity() {
        let reg = registry();
        let mut dest = Chunk::new(ChunkCoord::new(0, 0), 32);
        let mut source = InvertedChunk::new(ceiling_chunk(&reg, 32), 4);
        merge_chunks(&mut source, &mut dest, &reg).unwrap();
        let snapshot: Vec<Block> = (0..32usize)
            .flat_map(|y| {
                (0..16usize).flat_map(move |z| (0..16usize).map(move |x| (x, y, z)))
            })
            .map(|(x, y, z)| dest.get_local(x, y, z))
            .collect();
        merge_chunks(&mut source, &mut dest, &reg).unwrap();
        let after: Vec<Block> = (0..32usize)
            .flat_map(|y| {
                (0..16usize).flat_map(move |z| (0..16usize).map(move |x| (x, y, z)))
            })
            .map(|(x, y, z)| dest.get_local(x, y, z))
            .collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn tile_entities_relocate_without_duplicates() {
        let reg = registry();
        let mut dest = Chunk::new(ChunkCoord::new(0, 0), 32);
        // Stale record already at the destination coordinate.
        dest.tile_entities.push(TileEntity {
            id: "stale".into(),
            x: 7,
            y: 31,
            z: 7,
            data: Vec::new(),
        });
        let mut inner = Chunk::new(ChunkCoord::new(0, 0), 32);
        inner.set_local(7, 0, 7, reg.block("chest"));
        inner.tile_entities.push(TileEntity {
            id: "chest".into(),
            x: 7,
            y: 0,
            z: 7,
            data: Vec::new(),
        });
        let mut source = InvertedChunk::new(inner, 0);
        merge_chunks(&mut source, &mut dest, &reg).unwrap();
        assert_eq!(dest.get_local(7, 31, 7), reg.block("chest"));
        let records: Vec<_> = dest
            .tile_entities
            .iter()
            .filter(|e| e.x == 7 && e.z == 7 && e.y == 31)
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "chest");
    }

    #[test]
    fn mismatched_heights_are_fatal() {
        let reg = registry();
        let mut dest = Chunk::new(ChunkCoord::new(0, 0), 64);
        let mut source = InvertedChunk::new(Chunk::new(ChunkCoord::new(0, 0), 32), 0);
        let err = merge_chunks(&mut source, &mut dest, &reg).unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn entities_are_appended() {
        let reg = registry();
        let mut dest = Chunk::new(ChunkCoord::new(0, 0), 32);
        let mut inner = Chunk::new(ChunkCoord::new(0, 0), 32);
        inner.entities.push(strata_chunk::Entity {
            id: "bat".into(),
            x: 1.0,
            y: 2.0,
            z: 3.0,
        });
        let mut source = InvertedChunk::new(inner, 0);
        merge_chunks(&mut source, &mut dest, &reg).unwrap();
        assert_eq!(dest.entities.len(), 1);
        assert_eq!(dest.entities[0].id, "bat");
    }
}
