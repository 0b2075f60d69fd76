//! The voxel grid the simulation reads and writes.
//!
//! The simulation never owns block storage. Hosts implement [`WorldGrid`] over
//! their own chunk storage and [`DestroyHook`] over their block-break logic;
//! [`RamWorld`] is a self-contained grid for tests and tools.

mod ram_world;

use rill_registry::BlockId;
use rill_utils::{BlockBox, BlockPos};

pub use ram_world::RamWorld;

/// Block and status storage shared with the host.
///
/// All methods take `&self`; implementations synchronise internally so event
/// sources on other threads can read while the tick thread writes. Writes must
/// be visible to the next read on the same thread.
pub trait WorldGrid: Send + Sync {
    /// Block at a position. Unloaded or untouched positions read as air.
    fn block(&self, pos: BlockPos) -> BlockId;

    /// Replaces the block at a position.
    fn set_block(&self, pos: BlockPos, block: BlockId);

    /// Liquid status byte at a position, 0 if untracked.
    fn raw_status(&self, pos: BlockPos) -> u8;

    /// Stores the liquid status byte at a position.
    fn set_raw_status(&self, pos: BlockPos, status: u8);

    /// Returns `true` if the position is loaded and may be simulated.
    fn is_loaded(&self, pos: BlockPos) -> bool;

    /// Every loaded region.
    fn loaded_regions(&self) -> Vec<BlockBox>;
}

/// Result of asking the host to destroy a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The block may be replaced.
    Proceeded,
    /// The host refused; the block stays this tick.
    Vetoed,
}

/// Host-side block destruction, consulted before a liquid washes a block away.
pub trait DestroyHook: Send + Sync {
    /// Requests destruction of the block at `pos` by the liquid `cause`.
    fn request_destroy(&self, pos: BlockPos, cause: BlockId) -> DestroyOutcome;
}

/// Hook that lets every destruction proceed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl DestroyHook for AllowAll {
    fn request_destroy(&self, _pos: BlockPos, _cause: BlockId) -> DestroyOutcome {
        DestroyOutcome::Proceeded
    }
}

/// Hook that vetoes every destruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct VetoAll;

impl DestroyHook for VetoAll {
    fn request_destroy(&self, pos: BlockPos, cause: BlockId) -> DestroyOutcome {
        log::trace!("Vetoed destruction at {pos} by {cause:?}");
        DestroyOutcome::Vetoed
    }
}
