//! Liquid flow: the status codec, the per-position transition and the random
//! agitator.

pub mod agitator;
pub mod flow;
pub mod status;
mod reaction;

use std::sync::Arc;

use rill_registry::{BlockId, BlockRegistry, Reaction, ReactionTable};
use rill_utils::{BlockPos, Direction};
use thiserror::Error;

use crate::world::WorldGrid;

pub use agitator::Agitator;
pub use flow::{FlowContext, FlowEngine};
pub use status::{
    FlowDirection, LiquidStatus, MAX_DOWN_RATE, MAX_HEIGHT, MAX_RATE, StatusError,
};

/// Failure while processing one position. Nothing is persisted for it.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The stored outflow exceeded the stored volume.
    #[error("settled height {height} at {pos} is negative (stored rate {rate})")]
    NegativeHeight {
        /// Position being processed.
        pos: BlockPos,
        /// Height after subtracting the outflow.
        height: i32,
        /// Stored outflow rate.
        rate: u8,
    },
    /// A status could not be encoded.
    #[error(transparent)]
    Status(#[from] StatusError),
}

/// A voxel as the flow rules see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Block occupying the voxel.
    pub block: BlockId,
    /// Raw status byte, 0 for non-liquids.
    pub raw: u8,
    /// Liquid height, 0 for non-liquids.
    pub height: u8,
    /// Face the liquid flows out through.
    pub direction: Option<Direction>,
    /// Outflow rate, 0 for non-liquids.
    pub rate: u8,
}

impl Cell {
    /// Returns `true` if the cell holds a liquid.
    #[must_use]
    pub fn is_liquid(&self) -> bool {
        self.height > 0
    }
}

/// Block classification shared by the engine and the agitator.
#[derive(Clone)]
pub struct LiquidRules {
    blocks: Arc<BlockRegistry>,
    reactions: Arc<ReactionTable>,
}

impl LiquidRules {
    /// Creates rules over frozen registries.
    #[must_use]
    pub fn new(blocks: Arc<BlockRegistry>, reactions: Arc<ReactionTable>) -> Self {
        Self { blocks, reactions }
    }

    /// The block registry.
    #[must_use]
    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    /// Returns `true` if the block is a liquid.
    #[must_use]
    pub fn is_liquid(&self, block: BlockId) -> bool {
        self.blocks.is_liquid(block)
    }

    /// Reaction of `liquid` flowing into `block`, if one is registered.
    #[must_use]
    pub fn reaction(&self, liquid: BlockId, block: BlockId) -> Option<&Reaction> {
        self.reactions.get_for_block(&self.blocks, liquid, block)
    }

    /// Returns `true` if `liquid` may flow into `block`: empty space, a
    /// penetrable non-liquid, or anything with a reaction.
    #[must_use]
    pub fn can_displace(&self, liquid: BlockId, block: BlockId) -> bool {
        block != liquid && (self.blocks.is_penetrable(block) || self.reaction(liquid, block).is_some())
    }

    /// Reads and decodes a voxel. Non-liquid voxels report no liquid state
    /// regardless of their stored status byte.
    #[must_use]
    pub fn read(&self, world: &dyn WorldGrid, pos: BlockPos) -> Cell {
        let block = world.block(pos);
        if !self.is_liquid(block) {
            return Cell {
                block,
                raw: 0,
                height: 0,
                direction: None,
                rate: 0,
            };
        }
        let raw = world.raw_status(pos);
        let status = LiquidStatus::decode(raw);
        Cell {
            block,
            raw,
            height: status.height,
            direction: status.direction,
            rate: status.rate,
        }
    }
}
