use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use strata_blocks::BlockRegistry;
use strata_chunk::{
    AreaStats, Chunk, ChunkFactory, InvertedChunk, RegionGrid, SynthesisContext, TileEntity,
    create_chunk,
};
use strata_lighting::{BlockPropertiesCalculator, DirtyBox};
use strata_world::{
    ChunkCoord, Dimension, DimensionId, Fixup, InvertedWorld, Layer, LayerExporter, RegionCoord,
    Stage, Tile, TileCoord, WorldTarget,
};

use crate::error::ExportError;
use crate::garden::GardenExporter;
use crate::merge::merge_chunks;
use crate::postprocess::PostProcessor;
use crate::progress::Progress;

/// Outcome of exporting one region.
#[derive(Default)]
pub struct ExportResults {
    /// Whether any chunk was generated inside the region footprint.
    pub chunks_generated: bool,
    /// Statistics for the generated chunks, if any.
    pub stats: AreaStats,
    /// Fixups to defer until the neighboring regions are known.
    pub fixups: Vec<Box<dyn Fixup>>,
}

/// Runs the strictly-ordered per-region pass protocol: tile/layer
/// discovery, first pass (terrain synthesis, ceiling merge), second pass
/// (staged neighbor-dependent layer effects, garden seeds, goodies
/// chest), post-processing, and the optional block-property pass.
pub struct RegionExporter<'a> {
    pub dimension: &'a dyn Dimension,
    pub ceiling: Option<&'a dyn Dimension>,
    pub registry: &'a BlockRegistry,
    pub factory: &'a dyn ChunkFactory,
    pub ceiling_factory: Option<&'a dyn ChunkFactory>,
    pub post_processor: &'a dyn PostProcessor,
    pub tile_selection: Option<&'a hashbrown::HashSet<TileCoord>>,
    pub spawn_point: (i32, i32),
    pub create_goodies_chest: bool,
}

impl RegionExporter<'_> {
    pub fn export_region(
        &self,
        grid: &mut RegionGrid,
        progress: Progress<'_>,
    ) -> Result<ExportResults, ExportError> {
        let coords = grid.coord;
        self.export_region_inner(grid, progress).map_err(|e| {
            if e.is_cancelled() {
                e
            } else {
                ExportError::Region {
                    coords,
                    source: Box::new(e),
                }
            }
        })
    }

    fn export_region_inner(
        &self,
        grid: &mut RegionGrid,
        progress: Progress<'_>,
    ) -> Result<ExportResults, ExportError> {
        let coords = grid.coord;
        progress.set_message(&format!(
            "Exporting region {},{} of {}",
            coords.rx,
            coords.rz,
            self.dimension.name()
        ));
        progress.check_cancelled()?;

        let tiles = self.gather_tiles(self.dimension, coords);
        let ceiling_tiles = self
            .ceiling
            .map(|ceiling| self.gather_tiles(ceiling, coords));
        let second_pass_layers = self.second_pass_layers(self.dimension, &tiles);
        let ceiling_second_pass_layers = self
            .ceiling
            .zip(ceiling_tiles.as_ref())
            .map(|(ceiling, tiles)| self.second_pass_layers(ceiling, tiles));

        let has_ceiling = self.ceiling.is_some();
        let first_span = if has_ceiling { 0.225 } else { 0.45 };
        let mut results = self.first_pass(
            grid,
            self.dimension,
            self.factory,
            &tiles,
            false,
            progress.sub(0.0, first_span),
        )?;
        if let (Some(ceiling), Some(ceiling_factory), Some(ceiling_tiles)) =
            (self.ceiling, self.ceiling_factory, ceiling_tiles.as_ref())
        {
            let ceiling_results = self.first_pass(
                grid,
                ceiling,
                ceiling_factory,
                ceiling_tiles,
                true,
                progress.sub(0.225, 0.225),
            )?;
            results.chunks_generated |= ceiling_results.chunks_generated;
        }

        if results.chunks_generated {
            let second_span = if has_ceiling { 0.05 } else { 0.1 };
            results.fixups = self.second_pass(
                &second_pass_layers,
                self.dimension,
                grid,
                &tiles,
                coords,
                progress.sub(0.45, second_span),
            )?;
            self.place_goodies_chest(grid);

            if let (Some(ceiling), Some(ceiling_tiles), Some(layers)) = (
                self.ceiling,
                ceiling_tiles.as_ref(),
                ceiling_second_pass_layers.as_ref(),
            ) {
                // Fixups emitted against the inverted world are dropped;
                // the ceiling's second pass has no deferral support.
                let ceiling_delta = ceiling.max_height() - ceiling.ceiling_height();
                let mut inverted = InvertedWorld::new(&mut *grid, ceiling_delta);
                self.second_pass(
                    layers,
                    ceiling,
                    &mut inverted,
                    ceiling_tiles,
                    coords,
                    progress.sub(0.5, 0.05),
                )?;
            }

            let settings = self.dimension.export_settings();
            self.post_processor.post_process(
                grid,
                coords.block_rect(),
                &settings,
                progress.sub(0.55, 0.1),
            )?;

            if settings.block_properties_needed() {
                self.block_properties_pass(grid, coords, progress.sub(0.65, 0.35))?;
            }
        }

        progress.set(1.0)?;
        Ok(results)
    }

    /// Tiles overlapping the region, padded by one tile on each side (the
    /// 6x6 discovery window), filtered by the tile selection when one is
    /// active.
    fn gather_tiles(
        &self,
        dimension: &dyn Dimension,
        coords: RegionCoord,
    ) -> HashMap<TileCoord, Arc<Tile>> {
        let (lo, hi) = coords.tile_bounds_padded();
        let mut tiles = HashMap::new();
        for tx in lo.tx..=hi.tx {
            for tz in lo.tz..=hi.tz {
                let tile_coords = TileCoord::new(tx, tz);
                if let Some(tile) = dimension.tile(tile_coords) {
                    if self
                        .tile_selection
                        .is_none_or(|selection| selection.contains(&tile_coords))
                    {
                        tiles.insert(tile_coords, tile);
                    }
                }
            }
        }
        tiles
    }

    /// Union of tile layers and dimension-wide minimum layers, combined
    /// layers expanded, non-exported layers dropped, second-pass-capable
    /// exporters kept in their natural order for reproducible staging.
    fn second_pass_layers(
        &self,
        dimension: &dyn Dimension,
        tiles: &HashMap<TileCoord, Arc<Tile>>,
    ) -> Vec<(Layer, Arc<dyn LayerExporter>)> {
        let mut all: Vec<Layer> = Vec::new();
        for tile in tiles.values() {
            all.extend(tile.layers().iter().cloned());
        }
        all.extend(dimension.minimum_layers());
        let mut layers = strata_world::expand_layers(all);
        layers.sort();
        layers
            .into_iter()
            .filter_map(|layer| {
                dimension
                    .exporter_for(&layer)
                    .map(|exporter| (layer, exporter))
            })
            .filter(|(_, exporter)| !exporter.stages().is_empty())
            .collect()
    }

    /// First pass: synthesize every chunk in the one-chunk-padded window.
    /// Statistics accumulate only for chunks strictly inside the region
    /// footprint; the padding exists to give second-pass effects neighbor
    /// context, not to export neighbor area twice.
    fn first_pass(
        &self,
        grid: &mut RegionGrid,
        dimension: &dyn Dimension,
        factory: &dyn ChunkFactory,
        tiles: &HashMap<TileCoord, Arc<Tile>>,
        ceiling: bool,
        progress: Progress<'_>,
    ) -> Result<ExportResults, ExportError> {
        let coords = grid.coord;
        debug!("start of first pass for region {},{}", coords.rx, coords.rz);
        progress.set_message(if ceiling {
            "Generating ceiling"
        } else {
            "Generating landscape"
        });
        let (lo, hi) = coords.chunk_bounds_padded();
        let (inner_lo, inner_hi) = coords.chunk_bounds();
        let ctx = SynthesisContext {
            dimension,
            factory,
            registry: self.registry,
            tiles,
            tile_selection: self.tile_selection.is_some(),
            ceiling,
        };
        let ceiling_delta = dimension.max_height() - dimension.ceiling_height();
        let total = ((hi.cx - lo.cx + 1) * (hi.cz - lo.cz + 1)) as f32;
        let mut results = ExportResults::default();
        let mut chunk_no = 0;
        for cx in lo.cx..=hi.cx {
            for cz in lo.cz..=hi.cz {
                let coord = ChunkCoord::new(cx, cz);
                if let Some(creation) = create_chunk(&ctx, coord) {
                    if cx >= inner_lo.cx
                        && cx <= inner_hi.cx
                        && cz >= inner_lo.cz
                        && cz <= inner_hi.cz
                    {
                        results.chunks_generated = true;
                        results.stats += creation.stats;
                    }
                    if ceiling {
                        let mut inverted = InvertedChunk::new(creation.chunk, ceiling_delta);
                        if grid.get_chunk(coord).is_none() {
                            grid.add_chunk(Chunk::new(coord, grid.max_height()));
                        }
                        if let Some(existing) = grid.get_chunk_mut(coord) {
                            merge_chunks(&mut inverted, existing, self.registry)?;
                        }
                    } else {
                        grid.add_chunk(creation.chunk);
                    }
                }
                chunk_no += 1;
                progress.set(chunk_no as f32 / total)?;
            }
        }
        debug!("end of first pass for region {},{}", coords.rx, coords.rz);
        Ok(results)
    }

    /// Second pass: staged neighbor-dependent layer effects over the
    /// padded area, fixups scoped to the exported area, then garden
    /// seeds.
    fn second_pass(
        &self,
        layers: &[(Layer, Arc<dyn LayerExporter>)],
        dimension: &dyn Dimension,
        world: &mut dyn WorldTarget,
        tiles: &HashMap<TileCoord, Arc<Tile>>,
        coords: RegionCoord,
        progress: Progress<'_>,
    ) -> Result<Vec<Box<dyn Fixup>>, ExportError> {
        debug!(
            "start of second pass for region {},{}",
            coords.rx, coords.rz
        );
        let stage_count: usize = layers.iter().map(|(_, e)| e.stages().len()).sum();
        let area = coords.block_rect().padded(16);
        let exported_area = coords.block_rect();
        let mut fixups: Vec<Box<dyn Fixup>> = Vec::new();
        let mut counter = 0;
        for stage in Stage::ALL {
            debug!(
                "start of {:?} stage for region {},{}",
                stage, coords.rx, coords.rz
            );
            for (layer, exporter) in layers {
                if !exporter.stages().contains(stage) {
                    continue;
                }
                progress.check_cancelled()?;
                progress.set_message(&format!(
                    "Exporting layer {} ({:?} stage)",
                    layer.name, stage
                ));
                let layer_fixups = match stage {
                    Stage::Carve => exporter.carve(dimension, area, exported_area, world),
                    Stage::AddFeatures => {
                        exporter.add_features(dimension, area, exported_area, world)
                    }
                };
                fixups.extend(layer_fixups);
                counter += 1;
                progress.set(counter as f32 / stage_count.max(1) as f32)?;
            }
        }

        // Garden seeds run their own first and second pass afterward,
        // deduplicated by seed identity across the tile set.
        let mut garden = GardenExporter::new();
        let mut seeded: Vec<&Arc<Tile>> = tiles.values().filter(|t| !t.seeds().is_empty()).collect();
        seeded.sort_by_key(|t| t.coord);
        for tile in &seeded {
            garden.first_pass(dimension, tile, world);
        }
        for tile in &seeded {
            garden.second_pass(dimension, tile, world);
        }

        debug!("end of second pass for region {},{}", coords.rx, coords.rz);
        Ok(fixups)
    }

    /// One chest next to the spawn point on the primary dimension, placed
    /// at the terrain height beneath the world ceiling.
    fn place_goodies_chest(&self, grid: &mut RegionGrid) {
        if !self.create_goodies_chest || self.dimension.id() != DimensionId::Surface {
            return;
        }
        let x = self.spawn_point.0 + 3;
        let z = self.spawn_point.1 + 3;
        let Some(height) = self.dimension.height_at(x, z) else {
            return;
        };
        let y = (height + 1).min(self.dimension.max_height() - 1).max(0);
        let Some(chunk) = grid.get_chunk_mut(ChunkCoord::of_block(x, z)) else {
            // Spawn lies in some other region; that region's task places it.
            return;
        };
        let chest = self.registry.block("chest");
        chunk.set_local((x & 15) as usize, y as usize, (z & 15) as usize, chest);
        chunk.remove_tile_entity_at(x, y, z);
        chunk.tile_entities.push(TileEntity {
            id: "chest".into(),
            x,
            y,
            z,
            data: starter_kit(),
        });
    }

    /// Block-property pass: chunk-local seeding over the padded window,
    /// then propagation sweeps over the dirty volume until convergence or
    /// the iteration cap.
    fn block_properties_pass(
        &self,
        grid: &mut RegionGrid,
        coords: RegionCoord,
        progress: Progress<'_>,
    ) -> Result<(), ExportError> {
        let settings = self.dimension.export_settings();
        let mut nouns = String::new();
        if settings.light_requested() {
            nouns.push_str("block lighting");
        }
        if settings.calculate_leaf_distance {
            if !nouns.is_empty() {
                nouns.push_str(" and ");
            }
            nouns.push_str("leaf distances");
        }
        progress.set_message(&format!("Calculating initial {nouns}"));

        let mut calculator = BlockPropertiesCalculator::new(settings);
        let (lo, hi) = coords.chunk_bounds_padded();
        let mut low = i32::MAX;
        let mut high = i32::MIN;
        let total = (hi.cx - lo.cx + 1) as f32;
        for cx in lo.cx..=hi.cx {
            for cz in lo.cz..=hi.cz {
                if let Some(chunk) = grid.get_chunk_mut(ChunkCoord::new(cx, cz)) {
                    if let Some((chunk_low, chunk_high)) =
                        calculator.first_pass(chunk, self.registry)
                    {
                        low = low.min(chunk_low);
                        high = high.max(chunk_high);
                    }
                }
            }
            progress.set(0.2 * (cx - lo.cx + 1) as f32 / total)?;
        }

        if low != i32::MAX {
            progress.set_message(&format!("Propagating {nouns}"));
            let (x0, z0) = coords.block_origin();
            calculator.set_dirty_area(DirtyBox {
                x0: x0 - 16,
                x1: x0 + strata_world::REGION_SIZE + 16,
                y0: low,
                y1: high + 1,
                z0: z0 - 16,
                z1: z0 + strata_world::REGION_SIZE + 16,
            });
            let cap = calculator.max_iterations();
            let mut iteration = 0;
            while iteration < cap && calculator.second_pass(grid, self.registry) {
                iteration += 1;
                progress.set(0.2 + 0.8 * iteration as f32 / cap.max(1) as f32)?;
            }
            calculator.finalise(grid, self.registry);
        }

        progress.set(1.0)?;
        Ok(())
    }
}

fn starter_kit() -> Vec<(String, String)> {
    [
        ("torch", 64),
        ("log", 64),
        ("sapling", 64),
        ("bread", 32),
        ("water_bucket", 1),
    ]
    .iter()
    .enumerate()
    .map(|(slot, &(item, count))| (format!("slot{slot}"), format!("{item} x{count}")))
    .collect()
}
