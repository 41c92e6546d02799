use std::sync::{Mutex, MutexGuard, TryLockError};

use hashbrown::{HashMap, HashSet};
use strata_world::{Fixup, RegionCoord};

/// A fixup batch keyed to region R may be applied once none of R's eight
/// neighbors is both in the export set and not yet exported. Finishing a
/// neighbor can make previously blocked fixups ready, so this is
/// re-evaluated every time any region completes.
pub fn ready_for_fixups(
    export_set: &HashSet<RegionCoord>,
    exported: &HashSet<RegionCoord>,
    coords: RegionCoord,
) -> bool {
    coords
        .neighbors()
        .iter()
        .all(|n| !export_set.contains(n) || exported.contains(n))
}

struct QueueState {
    pending: HashMap<RegionCoord, Vec<Box<dyn Fixup>>>,
    exported: HashSet<RegionCoord>,
}

/// Shared fixup bookkeeping. Registering a region's fixups and marking it
/// exported is one atomic step so a neighbor can never observe the pair
/// half-updated, and the drain token admits at most one draining thread
/// (non-blocking try: losers skip and rely on a later opportunity).
pub(crate) struct FixupQueue {
    state: Mutex<QueueState>,
    draining: Mutex<()>,
}

impl FixupQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: HashMap::new(),
                exported: HashSet::new(),
            }),
            draining: Mutex::new(()),
        }
    }

    pub fn complete_region(&self, coords: RegionCoord, fixups: Vec<Box<dyn Fixup>>) {
        let mut state = self.state.lock().unwrap();
        if !fixups.is_empty() {
            state.pending.insert(coords, fixups);
        }
        state.exported.insert(coords);
    }

    /// Non-blocking acquisition of the drain token.
    pub fn try_begin_drain(&self) -> Option<MutexGuard<'_, ()>> {
        match self.draining.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
        }
    }

    /// Remove and return every pending batch whose readiness condition
    /// holds against the current exported set.
    pub fn take_ready(
        &self,
        export_set: &HashSet<RegionCoord>,
    ) -> HashMap<RegionCoord, Vec<Box<dyn Fixup>>> {
        let mut state = self.state.lock().unwrap();
        let ready: Vec<RegionCoord> = state
            .pending
            .keys()
            .copied()
            .filter(|&coords| ready_for_fixups(export_set, &state.exported, coords))
            .collect();
        let mut taken = HashMap::new();
        for coords in ready {
            if let Some(fixups) = state.pending.remove(&coords) {
                taken.insert(coords, fixups);
            }
        }
        taken
    }

    /// Drain everything left, readiness notwithstanding; used by the final
    /// synchronous sweep after all region tasks have completed.
    pub fn take_all(&self) -> HashMap<RegionCoord, Vec<Box<dyn Fixup>>> {
        let mut state = self.state.lock().unwrap();
        std::mem::take(&mut state.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(coords: &[(i32, i32)]) -> HashSet<RegionCoord> {
        coords.iter().map(|&(x, z)| RegionCoord::new(x, z)).collect()
    }

    #[test]
    fn readiness_requires_all_export_set_neighbors() {
        let export_set = set(&[(0, 0), (1, 0), (0, 1)]);
        let target = RegionCoord::new(0, 0);
        // Neighbors not exported yet: blocked.
        assert!(!ready_for_fixups(&export_set, &set(&[]), target));
        assert!(!ready_for_fixups(&export_set, &set(&[(1, 0)]), target));
        // All export-set neighbors done: ready. Regions outside the export
        // set never block.
        assert!(ready_for_fixups(&export_set, &set(&[(1, 0), (0, 1)]), target));
    }

    #[test]
    fn lone_region_is_immediately_ready() {
        let export_set = set(&[(4, 4)]);
        assert!(ready_for_fixups(&export_set, &set(&[]), RegionCoord::new(4, 4)));
    }

    #[test]
    fn drain_token_is_single_permit() {
        let queue = FixupQueue::new();
        let first = queue.try_begin_drain();
        assert!(first.is_some());
        assert!(queue.try_begin_drain().is_none());
        drop(first);
        assert!(queue.try_begin_drain().is_some());
    }
}
