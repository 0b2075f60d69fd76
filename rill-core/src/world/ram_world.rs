//! RAM-only voxel grid.
//!
//! Stores only positions that were written; everything else reads as air with
//! status 0. Useful for:
//! - Tests and benches
//! - The command-line driver
//! - Hosts that want to simulate a detached region

use parking_lot::RwLock;
use rill_registry::BlockId;
use rill_utils::{BlockBox, BlockPos};
use rustc_hash::FxHashMap;

use super::WorldGrid;

/// In-memory [`WorldGrid`].
///
/// Writes outside every loaded region are dropped, matching a host that
/// cannot modify unloaded chunks.
#[derive(Debug, Default)]
pub struct RamWorld {
    cells: RwLock<FxHashMap<BlockPos, (BlockId, u8)>>,
    regions: RwLock<Vec<BlockBox>>,
}

impl RamWorld {
    /// Creates an empty grid with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty grid with one loaded region.
    #[must_use]
    pub fn with_region(region: BlockBox) -> Self {
        let world = Self::new();
        world.load_region(region);
        world
    }

    /// Marks a region as loaded.
    pub fn load_region(&self, region: BlockBox) {
        self.regions.write().push(region);
    }

    /// Unloads a region. Stored cells are kept.
    pub fn unload_region(&self, region: BlockBox) {
        self.regions.write().retain(|loaded| *loaded != region);
    }

    /// Fills a region with one block, resetting statuses.
    pub fn fill(&self, region: BlockBox, block: BlockId) {
        for pos in region.positions() {
            self.set_block(pos, block);
            self.set_raw_status(pos, 0);
        }
    }

    /// Number of positions holding anything but air.
    #[must_use]
    pub fn non_air_count(&self) -> usize {
        self.cells
            .read()
            .values()
            .filter(|(block, _)| !block.is_air())
            .count()
    }

    /// Snapshot of every stored non-air cell.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(BlockPos, BlockId, u8)> {
        self.cells
            .read()
            .iter()
            .filter(|(_, (block, _))| !block.is_air())
            .map(|(pos, (block, status))| (*pos, *block, *status))
            .collect()
    }
}

impl WorldGrid for RamWorld {
    fn block(&self, pos: BlockPos) -> BlockId {
        self.cells
            .read()
            .get(&pos)
            .map_or(BlockId::AIR, |(block, _)| *block)
    }

    fn set_block(&self, pos: BlockPos, block: BlockId) {
        if !self.is_loaded(pos) {
            log::trace!("Dropped block write at unloaded {pos}");
            return;
        }
        let mut cells = self.cells.write();
        if block.is_air() && cells.get(&pos).is_none_or(|(_, status)| *status == 0) {
            cells.remove(&pos);
        } else {
            cells.entry(pos).or_default().0 = block;
        }
    }

    fn raw_status(&self, pos: BlockPos) -> u8 {
        self.cells.read().get(&pos).map_or(0, |(_, status)| *status)
    }

    fn set_raw_status(&self, pos: BlockPos, status: u8) {
        if !self.is_loaded(pos) {
            return;
        }
        let mut cells = self.cells.write();
        match cells.get_mut(&pos) {
            Some((block, _)) if block.is_air() && status == 0 => {
                cells.remove(&pos);
            }
            Some(cell) => cell.1 = status,
            None if status != 0 => {
                cells.insert(pos, (BlockId::AIR, status));
            }
            None => {}
        }
    }

    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.regions.read().iter().any(|region| region.contains(&pos))
    }

    fn loaded_regions(&self) -> Vec<BlockBox> {
        self.regions.read().clone()
    }
}
