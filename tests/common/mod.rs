#![allow(dead_code)]

use std::sync::Arc;

use strata::{
    ExportError, GrassPostProcessor, MemoryRegionStore, Progress, RegionStore, Stats,
    WorldExporter,
};
use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkFactory, HeightmapChunkFactory};
use strata_world::{DimensionId, MemoryDimension, TileCoord};

/// A flat authored world covering the inclusive tile rectangle.
pub fn flat_dimension(
    t0: (i32, i32),
    t1: (i32, i32),
    height: i32,
    max_height: i32,
) -> MemoryDimension {
    let mut dim = MemoryDimension::new(DimensionId::Surface, "test surface", max_height);
    dim.fill_tiles(
        TileCoord::new(t0.0, t0.1),
        TileCoord::new(t1.0, t1.1),
        height,
    );
    dim
}

/// Everything an export run needs, wired to the in-memory reference
/// collaborators.
pub struct Harness {
    pub dimension: Arc<MemoryDimension>,
    pub ceiling: Option<Arc<MemoryDimension>>,
    pub registry: Arc<BlockRegistry>,
    pub factory: HeightmapChunkFactory,
    pub ceiling_factory: Option<HeightmapChunkFactory>,
    pub post_processor: GrassPostProcessor,
    pub store: MemoryRegionStore,
    pub tile_selection: Option<hashbrown::HashSet<TileCoord>>,
    pub spawn_point: (i32, i32),
    pub create_goodies_chest: bool,
}

impl Harness {
    pub fn new(dimension: MemoryDimension) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let registry = Arc::new(BlockRegistry::builtin());
        let dimension = Arc::new(dimension);
        let max_height = dimension.max_height;
        let factory = HeightmapChunkFactory::new(
            dimension.clone() as Arc<dyn strata_world::Dimension>,
            registry.clone(),
            max_height,
        );
        Self {
            dimension,
            ceiling: None,
            registry: registry.clone(),
            factory,
            ceiling_factory: None,
            post_processor: GrassPostProcessor::new(registry),
            store: MemoryRegionStore::new(),
            tile_selection: None,
            spawn_point: (0, 0),
            create_goodies_chest: false,
        }
    }

    pub fn with_ceiling(mut self, ceiling: MemoryDimension) -> Self {
        let ceiling = Arc::new(ceiling);
        // Ceiling chunks are built at the primary dimension's full height
        // so that the merge sees matching chunk heights.
        self.ceiling_factory = Some(HeightmapChunkFactory::new(
            ceiling.clone() as Arc<dyn strata_world::Dimension>,
            self.registry.clone(),
            self.dimension.max_height,
        ));
        self.ceiling = Some(ceiling);
        self
    }

    pub fn run(&self) -> Result<Stats, ExportError> {
        self.run_with(Progress::none(), &self.store)
    }

    pub fn run_with(
        &self,
        progress: Progress<'_>,
        store: &dyn RegionStore,
    ) -> Result<Stats, ExportError> {
        let exporter = WorldExporter {
            dimension: &*self.dimension,
            ceiling: self.ceiling.as_deref().map(|c| c as &dyn strata_world::Dimension),
            registry: &self.registry,
            store,
            factory: &self.factory,
            ceiling_factory: self
                .ceiling_factory
                .as_ref()
                .map(|f| f as &dyn ChunkFactory),
            post_processor: &self.post_processor,
            tile_selection: self.tile_selection.clone(),
            spawn_point: self.spawn_point,
            create_goodies_chest: self.create_goodies_chest,
        };
        exporter.export(progress)
    }
}
