//! Region export pipeline: turns a tile-based terrain model into a
//! chunked voxel world, one 512x512 region at a time, in parallel.
//!
//! The entry point is [`WorldExporter::export`]. The per-region building
//! blocks ([`RegionExporter`], [`merge_chunks`], the synthesis policy in
//! `strata-chunk`, and the property propagation in `strata-lighting`)
//! are exposed for partial or selective re-export.
#![forbid(unsafe_code)]

mod engine;
mod error;
mod fixup;
mod garden;
mod merge;
mod postprocess;
mod progress;
mod scheduler;
mod stats;
mod store;

pub use engine::{ExportResults, RegionExporter};
pub use error::{ExportError, StoreError};
pub use fixup::ready_for_fixups;
pub use garden::GardenExporter;
pub use merge::merge_chunks;
pub use postprocess::{GrassPostProcessor, PostProcessor};
pub use progress::{JobProgress, ParallelProgress, Progress, ProgressSink};
pub use scheduler::{WorldExporter, order_regions};
pub use stats::Stats;
pub use store::{MemoryRegionStore, RegionStore};
