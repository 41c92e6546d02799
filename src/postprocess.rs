use strata_blocks::BlockRegistry;
use strata_chunk::RegionGrid;
use strata_world::{BlockRect, ExportSettings, WorldTarget};

use crate::error::ExportError;
use crate::progress::Progress;

/// Fixes surface-block inconsistencies the second pass may have
/// introduced, invoked once over the exact region footprint.
pub trait PostProcessor: Send + Sync {
    fn post_process(
        &self,
        grid: &mut RegionGrid,
        area: BlockRect,
        settings: &ExportSettings,
        progress: Progress<'_>,
    ) -> Result<(), ExportError>;
}

/// Reference post-processor: grass buried under an opaque block (the
/// canonical artifact of feature placement) is re-capped as dirt.
pub struct GrassPostProcessor {
    registry: std::sync::Arc<BlockRegistry>,
}

impl GrassPostProcessor {
    pub fn new(registry: std::sync::Arc<BlockRegistry>) -> Self {
        Self { registry }
    }
}

impl PostProcessor for GrassPostProcessor {
    fn post_process(
        &self,
        grid: &mut RegionGrid,
        area: BlockRect,
        _settings: &ExportSettings,
        progress: Progress<'_>,
    ) -> Result<(), ExportError> {
        let reg = &self.registry;
        let grass = reg.block("grass");
        let dirt = reg.block("dirt");
        let max_height = grid.max_height();
        let total = area.depth().max(1);
        for (row, z) in (area.z0..area.z1).enumerate() {
            for x in area.x0..area.x1 {
                for y in 0..max_height - 1 {
                    if grid.block_at(x, y, z) == grass {
                        let above = grid.block_at(x, y + 1, z);
                        if reg.opacity(above) >= 15 {
                            grid.set_block(x, y, z, dirt);
                        }
                    }
                }
            }
            progress.set((row + 1) as f32 / total as f32)?;
        }
        Ok(())
    }
}
