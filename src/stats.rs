use std::time::Duration;

use strata_chunk::AreaStats;

/// Aggregate outcome of one export run. Area accumulation is commutative
/// and associative, so per-region contributions combine in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub land_area: u64,
    pub surface_area: u64,
    pub water_area: u64,
    pub time: Duration,
}

impl Stats {
    pub fn add_area(&mut self, area: AreaStats) {
        self.land_area += area.land_area;
        self.surface_area += area.surface_area;
        self.water_area += area.water_area;
    }
}
