//! Block property propagation: light levels and leaf distances computed
//! to a fixed point over a dirty volume.
#![forbid(unsafe_code)]

use strata_blocks::BlockRegistry;
use strata_chunk::{Chunk, LEAF_DISTANCE_FAR, RegionGrid};
use strata_world::{ChunkCoord, ExportSettings, WorldTarget};


pub const MAX_LIGHT: u8 = 15;
pub const MAX_LEAF_DISTANCE: u8 = 7;

/// 3D volume the propagation phase is allowed to touch. Lower bounds
/// inclusive, upper bounds exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyBox {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
    pub z0: i32,
    pub z1: i32,
}

impl DirtyBox {
    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1 && z >= self.z0 && z < self.z1
    }
}

/// Two-phase fixed-point computation of per-block light levels and leaf
/// distances: a chunk-local seed phase, then relaxation sweeps over the
/// dirty volume until nothing changes or the iteration cap is reached.
/// The cap bounds worst-case propagation distance; exceeding it yields a
/// usable approximation rather than an error.
pub struct BlockPropertiesCalculator {
    settings: ExportSettings,
    dirty: Option<DirtyBox>,
}

impl BlockPropertiesCalculator {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            dirty: None,
        }
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.settings.max_iterations()
    }

    pub fn set_dirty_area(&mut self, dirty: DirtyBox) {
        self.dirty = Some(dirty);
    }

    /// Seed one chunk in isolation: sky columns scanned from the top,
    /// light emitters, and leaf-distance sources. Returns the vertical
    /// bounds touched, or `None` when the chunk contributed nothing.
    pub fn first_pass(&self, chunk: &mut Chunk, reg: &BlockRegistry) -> Option<(i32, i32)> {
        let max_height = chunk.max_height;
        let mut low = i32::MAX;
        let mut high = i32::MIN;
        for z in 0..16usize {
            for x in 0..16usize {
                let mut open = true;
                for y in (0..max_height as usize).rev() {
                    let b = chunk.get_local(x, y, z);
                    if self.settings.calculate_sky_light {
                        if open && reg.opacity(b) > 0 {
                            open = false;
                        }
                        chunk.set_sky_light_local(x, y, z, if open { MAX_LIGHT } else { 0 });
                    }
                    if !open && y as i32 > high {
                        // First obstruction in this column.
                        high = y as i32;
                    }
                    if !b.is_air() && (y as i32) < low {
                        low = y as i32;
                    }
                    if self.settings.calculate_block_light {
                        let emission = reg.emission(b);
                        if emission > 0 {
                            chunk.set_block_light_local(x, y, z, emission.min(MAX_LIGHT));
                            low = low.min(y as i32);
                            high = high.max(y as i32);
                        }
                    }
                    if self.settings.calculate_leaf_distance {
                        if reg.is_leaf_source(b) {
                            chunk.set_leaf_distance(x, y, z, 0);
                            low = low.min(y as i32);
                            high = high.max(y as i32);
                        } else if reg.is_leaves(b) {
                            chunk.set_leaf_distance(x, y, z, MAX_LEAF_DISTANCE);
                            low = low.min(y as i32);
                            high = high.max(y as i32);
                        }
                    }
                }
            }
        }
        (low != i32::MAX).then_some((low, high.max(low)))
    }

    /// One relaxation sweep over the dirty volume. Returns whether any
    /// value changed; callers iterate until this reports `false` or the
    /// iteration cap is reached.
    pub fn second_pass(&self, grid: &mut RegionGrid, reg: &BlockRegistry) -> bool {
        let Some(dirty) = self.dirty else {
            return false;
        };
        let y0 = dirty.y0.max(0);
        let y1 = dirty.y1.min(grid.max_height());
        if y0 >= y1 {
            return false;
        }
        let mut changed = false;
        for ccz in (dirty.z0 >> 4)..=((dirty.z1 - 1) >> 4) {
            for ccx in (dirty.x0 >> 4)..=((dirty.x1 - 1) >> 4) {
                let coord = ChunkCoord::new(ccx, ccz);
                if !grid.has_chunk(coord) {
                    continue;
                }
                let (ox, oz) = coord.block_origin();
                let zr = dirty.z0.max(oz)..dirty.z1.min(oz + 16);
                let xr = dirty.x0.max(ox)..dirty.x1.min(ox + 16);
                for y in y0..y1 {
                    for z in zr.clone() {
                        for x in xr.clone() {
                            changed |= self.relax_cell(grid, reg, x, y, z);
                        }
                    }
                }
            }
        }
        changed
    }

    fn relax_cell(&self, grid: &mut RegionGrid, reg: &BlockRegistry, x: i32, y: i32, z: i32) -> bool {
        let b = grid.block_at(x, y, z);
        let opacity = reg.opacity(b);
        let mut changed = false;
        if self.settings.calculate_sky_light && opacity < MAX_LIGHT {
            let cur = grid.sky_light_at(x, y, z);
            if cur < MAX_LIGHT {
                let new = self.incoming_sky(grid, x, y, z, opacity);
                if new > cur {
                    grid.set_sky_light(x, y, z, new);
                    changed = true;
                }
            }
        }
        if self.settings.calculate_block_light && opacity < MAX_LIGHT {
            let cur = grid.block_light_at(x, y, z);
            if cur < MAX_LIGHT {
                let atten = opacity.max(1);
                let mut best = cur;
                for (nx, ny, nz) in neighbors(x, y, z) {
                    let n = grid.block_light_at(nx, ny, nz);
                    best = best.max(n.saturating_sub(atten));
                }
                if best > cur {
                    grid.set_block_light(x, y, z, best);
                    changed = true;
                }
            }
        }
        if self.settings.calculate_leaf_distance && reg.is_leaves(b) {
            let cur = grid.leaf_distance_at(x, y, z);
            let mut best = cur;
            for (nx, ny, nz) in neighbors(x, y, z) {
                let nb = grid.block_at(nx, ny, nz);
                let n = if reg.is_leaf_source(nb) || reg.is_leaves(nb) {
                    grid.leaf_distance_at(nx, ny, nz)
                } else {
                    LEAF_DISTANCE_FAR
                };
                best = best.min(n.saturating_add(1));
            }
            if best < cur && best <= MAX_LEAF_DISTANCE {
                grid.set_leaf_distance_at(x, y, z, best);
                changed = true;
            }
        }
        changed
    }

    fn incoming_sky(&self, grid: &RegionGrid, x: i32, y: i32, z: i32, opacity: u8) -> u8 {
        let atten = opacity.max(1);
        // Open sky above the world; full daylight descends without loss
        // through fully transparent blocks.
        let above = if y + 1 >= grid.max_height() {
            MAX_LIGHT
        } else {
            grid.sky_light_at(x, y + 1, z)
        };
        let mut best = if above == MAX_LIGHT && opacity == 0 {
            MAX_LIGHT
        } else {
            above.saturating_sub(atten)
        };
        for (nx, ny, nz) in [(x - 1, y, z), (x + 1, y, z), (x, y - 1, z), (x, y, z - 1), (x, y, z + 1)] {
            let n = grid.sky_light_at(nx, ny, nz);
            best = best.max(n.saturating_sub(atten));
        }
        best
    }

    /// Commit or clear transient propagation state: leaf distances that
    /// leaked outside leaf and log blocks are reset.
    pub fn finalise(&self, grid: &mut RegionGrid, reg: &BlockRegistry) {
        if !self.settings.calculate_leaf_distance {
            return;
        }
        for chunk in grid.chunks_mut() {
            if !chunk.has_leaf_distances() {
                continue;
            }
            for y in 0..chunk.max_height as usize {
                for z in 0..16usize {
                    for x in 0..16usize {
                        let b = chunk.get_local(x, y, z);
                        if !reg.is_leaves(b) && !reg.is_leaf_source(b) {
                            chunk.set_leaf_distance(x, y, z, LEAF_DISTANCE_FAR);
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn neighbors(x: i32, y: i32, z: i32) -> [(i32, i32, i32); 6] {
    [
        (x + 1, y, z),
        (x - 1, y, z),
        (x, y + 1, z),
        (x, y - 1, z),
        (x, y, z + 1),
        (x, y, z - 1),
    ]
}
