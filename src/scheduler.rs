use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::unbounded;
use hashbrown::{HashMap, HashSet};
use log::{debug, error, trace};
use rayon::ThreadPoolBuilder;
use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkFactory, RegionGrid};
use strata_world::{Dimension, Fixup, RegionCoord, TileCoord};

use crate::engine::RegionExporter;
use crate::error::ExportError;
use crate::fixup::FixupQueue;
use crate::postprocess::PostProcessor;
use crate::progress::{ParallelProgress, Progress};
use crate::stats::Stats;
use crate::store::RegionStore;

/// Entry point of the pipeline: partitions the dimension (plus its
/// optional ceiling) into regions, exports them on a bounded worker pool,
/// tracks fixup readiness, and aggregates statistics.
pub struct WorldExporter<'a> {
    pub dimension: &'a dyn Dimension,
    pub ceiling: Option<&'a dyn Dimension>,
    pub registry: &'a BlockRegistry,
    pub store: &'a dyn RegionStore,
    pub factory: &'a dyn ChunkFactory,
    pub ceiling_factory: Option<&'a dyn ChunkFactory>,
    pub post_processor: &'a dyn PostProcessor,
    /// When set, only regions implied by the selected tiles are exported
    /// (exactly one dimension allowed in this mode).
    pub tile_selection: Option<HashSet<TileCoord>>,
    pub spawn_point: (i32, i32),
    pub create_goodies_chest: bool,
}

impl WorldExporter<'_> {
    pub fn export(&self, progress: Progress<'_>) -> Result<Stats, ExportError> {
        self.validate()?;
        progress.set_message(&format!("Exporting {} dimension", self.dimension.name()));
        let start = Instant::now();

        let regions = self.determine_regions();
        let sorted = order_regions(&regions);
        if sorted.is_empty() {
            progress.set(1.0)?;
            return Ok(Stats {
                time: start.elapsed(),
                ..Stats::default()
            });
        }

        let job_count = sorted.len();
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8)
            .min(job_count)
            .max(1);
        debug!(
            "exporting {} regions of {} on {} workers",
            job_count,
            self.dimension.name(),
            workers
        );
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-export-{i}"))
            .build()
            .map_err(|e| ExportError::Other(format!("failed to build worker pool: {e}")))?;

        let engine = RegionExporter {
            dimension: self.dimension,
            ceiling: self.ceiling,
            registry: self.registry,
            factory: self.factory,
            ceiling_factory: self.ceiling_factory,
            post_processor: self.post_processor,
            tile_selection: self.tile_selection.as_ref(),
            spawn_point: self.spawn_point,
            create_goodies_chest: self.create_goodies_chest,
        };
        let stats = Mutex::new(Stats::default());
        let queue = FixupQueue::new();
        let abort = AtomicBool::new(false);
        let parallel = progress
            .is_present()
            .then(|| ParallelProgress::new(progress, job_count));

        let (job_tx, job_rx) = unbounded::<(usize, RegionCoord)>();
        let (res_tx, res_rx) = unbounded::<(RegionCoord, Option<ExportError>)>();
        for job in sorted.into_iter().enumerate() {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        pool.scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let res_tx = res_tx.clone();
                let engine = &engine;
                let queue = &queue;
                let stats = &stats;
                let abort = &abort;
                let parallel = parallel.as_ref();
                let regions = &regions;
                scope.spawn(move |_| {
                    while let Ok((index, coords)) = job_rx.recv() {
                        if abort.load(Ordering::SeqCst) {
                            continue;
                        }
                        let sink = parallel.map(|p| p.job(index));
                        let task_progress = match &sink {
                            Some(sink) => Progress::new(sink),
                            None => Progress::none(),
                        };
                        if task_progress.check_cancelled().is_err() {
                            abort.store(true, Ordering::SeqCst);
                            let _ = res_tx.send((coords, Some(ExportError::Cancelled)));
                            continue;
                        }
                        match self.region_task(engine, queue, regions, stats, coords, task_progress)
                        {
                            None => {
                                let _ = res_tx.send((coords, None));
                            }
                            Some(err) => {
                                if err.is_cancelled() {
                                    abort.store(true, Ordering::SeqCst);
                                } else {
                                    error!(
                                        "{err} while exporting region {},{}",
                                        coords.rx, coords.rz
                                    );
                                    if task_progress.is_present() {
                                        task_progress.report_error(&err);
                                    } else {
                                        // No sink to report to: shut the
                                        // pool down and surface the first
                                        // failure once in-flight tasks
                                        // drain.
                                        abort.store(true, Ordering::SeqCst);
                                    }
                                }
                                let _ = res_tx.send((coords, Some(err)));
                            }
                        }
                    }
                });
            }
        });
        drop(res_tx);

        let mut first_error: Option<ExportError> = None;
        let mut cancelled = false;
        for (_, outcome) in res_rx.try_iter() {
            if let Some(err) = outcome {
                cancelled |= err.is_cancelled();
                if first_error.is_none() && !err.is_cancelled() {
                    first_error = Some(err);
                }
            }
        }
        if cancelled {
            return Err(ExportError::Cancelled);
        }
        if let Some(err) = first_error {
            if !progress.is_present() {
                return Err(err);
            }
        }

        // It is possible for fixups to be left over: a thread that was
        // draining may have finished while another registered new ones and
        // then quit. Apply whatever remains in one synchronous sweep.
        let remaining = queue.take_all();
        if !remaining.is_empty() {
            progress.set_message(&format!(
                "Doing remaining fixups for {}",
                self.dimension.name()
            ));
            progress.reset();
            if let Err(err) = self.perform_fixups(remaining, progress) {
                if err.is_cancelled() || !progress.is_present() {
                    return Err(err);
                }
                error!("{err}");
                progress.report_error(&err);
            }
        }

        let mut stats = stats.into_inner().unwrap_or_else(|e| e.into_inner());
        stats.time = start.elapsed();
        progress.set(1.0)?;
        Ok(stats)
    }

    fn validate(&self) -> Result<(), ExportError> {
        if self.dimension.id().ceiling().is_none() {
            return Err(ExportError::Config(format!(
                "dimension {} cannot be exported directly",
                self.dimension.id()
            )));
        }
        if let Some(ceiling) = self.ceiling {
            if Some(ceiling.id()) != self.dimension.id().ceiling() {
                return Err(ExportError::Config(format!(
                    "dimension {} is not the ceiling of {}",
                    ceiling.id(),
                    self.dimension.id()
                )));
            }
            if self.ceiling_factory.is_none() {
                return Err(ExportError::Config(
                    "ceiling dimension supplied without a ceiling chunk factory".to_string(),
                ));
            }
            if self.tile_selection.is_some() {
                return Err(ExportError::Config(
                    "tile selection export is limited to a single dimension".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The complete region set: either implied by the tile selection, or
    /// every authored tile expanded by the border radius and bedrock-wall
    /// adjacency, plus the ceiling's tiles.
    fn determine_regions(&self) -> HashSet<RegionCoord> {
        let mut regions = HashSet::new();
        if let Some(selection) = &self.tile_selection {
            for tile in selection {
                regions.insert(tile.region());
            }
            return regions;
        }
        let dim = self.dimension;
        let mut radius = 0;
        let border_endless = dim.border().map(|b| b.is_endless()).unwrap_or(false);
        if dim.border().is_some() && !border_endless {
            radius += dim.border_size();
        }
        if !border_endless && dim.bedrock_wall() {
            radius += 1;
        }
        for tile in dim.tile_coords() {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    regions.insert(tile.offset(dx, dz).region());
                }
            }
        }
        if let Some(ceiling) = self.ceiling {
            for tile in ceiling.tile_coords() {
                regions.insert(tile.region());
            }
        }
        regions
    }

    /// One region: synthesize into a fresh grid, persist when anything was
    /// generated, register fixups + mark exported atomically, then attempt
    /// an opportunistic fixup drain.
    fn region_task(
        &self,
        engine: &RegionExporter<'_>,
        queue: &FixupQueue,
        export_set: &HashSet<RegionCoord>,
        stats: &Mutex<Stats>,
        coords: RegionCoord,
        progress: Progress<'_>,
    ) -> Option<ExportError> {
        let mut grid = RegionGrid::new(coords, self.dimension.max_height());
        let results = match engine.export_region(&mut grid, progress.sub(0.0, 0.9)) {
            Ok(results) => results,
            Err(err) => return Some(err),
        };
        debug!("generated region {},{}", coords.rx, coords.rz);
        if results.chunks_generated {
            {
                let mut stats = stats.lock().unwrap();
                stats.add_area(results.stats);
            }
            let save_start = Instant::now();
            if let Err(source) = self.store.save_region(&grid, self.dimension.id(), coords) {
                return Some(ExportError::Region {
                    coords,
                    source: Box::new(ExportError::Store(source)),
                });
            }
            debug!(
                "saving region {},{} took {} ms",
                coords.rx,
                coords.rz,
                save_start.elapsed().as_millis()
            );
        }
        queue.complete_region(coords, results.fixups);
        self.drain_ready_fixups(queue, export_set, progress.sub(0.9, 0.1))
            .err()
    }

    /// Apply all fixup batches whose readiness condition holds, but only
    /// if no other thread is already doing so; losers skip rather than
    /// wait and rely on a later opportunity.
    fn drain_ready_fixups(
        &self,
        queue: &FixupQueue,
        export_set: &HashSet<RegionCoord>,
        progress: Progress<'_>,
    ) -> Result<(), ExportError> {
        let Some(_guard) = queue.try_begin_drain() else {
            return Ok(());
        };
        let ready = queue.take_ready(export_set);
        if ready.is_empty() {
            return Ok(());
        }
        self.perform_fixups(ready, progress)
    }

    fn perform_fixups(
        &self,
        fixups: HashMap<RegionCoord, Vec<Box<dyn Fixup>>>,
        progress: Progress<'_>,
    ) -> Result<(), ExportError> {
        let start = Instant::now();
        let total: usize = fixups.values().map(Vec::len).sum();
        let region_count = fixups.len();
        let settings = self.dimension.export_settings();
        let mut world = self
            .store
            .open_for_fixups(self.dimension.id(), self.dimension.max_height())
            .map_err(ExportError::Store)?;
        let mut count = 0usize;
        for (coords, batch) in fixups {
            progress.set_message(&format!(
                "Performing fixups for region {},{}",
                coords.rx, coords.rz
            ));
            debug!(
                "performing {} fixups for region {},{}",
                batch.len(),
                coords.rx,
                coords.rz
            );
            for fixup in batch {
                fixup
                    .apply(&mut *world, self.dimension, &settings)
                    .map_err(|source| ExportError::Fixup { coords, source })?;
                count += 1;
                progress.set(count as f32 / total.max(1) as f32)?;
            }
        }
        trace!(
            "fixups for {region_count} regions took {} ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Order regions for export locality: when the set spans more than one
/// row, the first two rows are interleaved together (front-loading
/// cross-row fixups), then remaining rows go top-to-bottom,
/// left-to-right. A single-row set is left unordered.
pub fn order_regions(regions: &HashSet<RegionCoord>) -> Vec<RegionCoord> {
    let mut sorted = Vec::with_capacity(regions.len());
    let Some(first) = regions.iter().next() else {
        return sorted;
    };
    let mut lo = *first;
    let mut hi = *first;
    for r in regions {
        lo.rx = lo.rx.min(r.rx);
        lo.rz = lo.rz.min(r.rz);
        hi.rx = hi.rx.max(r.rx);
        hi.rz = hi.rz.max(r.rz);
    }
    if lo.rz == hi.rz {
        sorted.extend(regions.iter().copied());
        return sorted;
    }
    for rx in lo.rx..=hi.rx {
        for rz in lo.rz..=(lo.rz + 1) {
            let coords = RegionCoord::new(rx, rz);
            if regions.contains(&coords) {
                sorted.push(coords);
            }
        }
    }
    for rz in (lo.rz + 2)..=hi.rz {
        for rx in lo.rx..=hi.rx {
            let coords = RegionCoord::new(rx, rz);
            if regions.contains(&coords) {
                sorted.push(coords);
            }
        }
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(coords: &[(i32, i32)]) -> HashSet<RegionCoord> {
        coords.iter().map(|&(x, z)| RegionCoord::new(x, z)).collect()
    }

    #[test]
    fn first_two_rows_interleave() {
        let regions = set(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]);
        let sorted = order_regions(&regions);
        let expected: Vec<RegionCoord> = [(0, 0), (0, 1), (1, 0), (1, 1), (0, 2), (1, 2)]
            .iter()
            .map(|&(x, z)| RegionCoord::new(x, z))
            .collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn single_row_keeps_every_region() {
        let regions = set(&[(3, 7), (5, 7), (4, 7)]);
        let sorted = order_regions(&regions);
        assert_eq!(sorted.len(), 3);
        for r in &sorted {
            assert!(regions.contains(r));
        }
    }

    #[test]
    fn sparse_sets_only_emit_members() {
        let regions = set(&[(0, 0), (5, 0), (2, 3)]);
        let sorted = order_regions(&regions);
        assert_eq!(sorted.len(), 3);
        assert_eq!(sorted.last(), Some(&RegionCoord::new(2, 3)));
    }
}
