//! Read-only access to decoded liquid state for renderers and physics.

use rill_registry::{BlockId, BlockRegistry};
use rill_utils::math::Vector3;
use rill_utils::{BlockBox, BlockPos, Direction};

use crate::liquid::LiquidStatus;
use crate::world::WorldGrid;

/// Decoded liquid state of one voxel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidSample {
    /// The liquid block.
    pub block: BlockId,
    /// Height in `1..=16`.
    pub height: u8,
    /// Outflow direction.
    pub direction: Option<Direction>,
    /// Outflow rate.
    pub rate: u8,
    /// Mass per full block of this liquid.
    pub mass: f32,
}

impl LiquidSample {
    /// Current pushing the liquid exerts: unit direction * rate * mass.
    #[must_use]
    pub fn flow_vector(&self) -> Vector3<f32> {
        self.direction.map_or_else(Vector3::default, |direction| {
            direction.unit().as_f32() * (f32::from(self.rate) * self.mass)
        })
    }
}

/// Read-only window onto the liquid in a grid.
pub struct LiquidView<'a> {
    world: &'a dyn WorldGrid,
    blocks: &'a BlockRegistry,
}

impl<'a> LiquidView<'a> {
    /// Creates a view over `world`.
    #[must_use]
    pub fn new(world: &'a dyn WorldGrid, blocks: &'a BlockRegistry) -> Self {
        Self { world, blocks }
    }

    /// Samples a voxel; `None` if it holds no liquid.
    #[must_use]
    pub fn sample(&self, pos: BlockPos) -> Option<LiquidSample> {
        let block = self.world.block(pos);
        if !self.blocks.is_liquid(block) {
            return None;
        }
        let status = LiquidStatus::decode(self.world.raw_status(pos));
        Some(LiquidSample {
            block,
            height: status.height,
            direction: status.direction,
            rate: status.rate,
            mass: self.blocks.mass(block),
        })
    }

    /// Sum of liquid heights inside a region, optionally of one liquid only.
    #[must_use]
    pub fn volume(&self, region: &BlockBox, liquid: Option<BlockId>) -> u64 {
        region
            .positions()
            .filter_map(|pos| self.sample(pos))
            .filter(|sample| liquid.is_none_or(|liquid| sample.block == liquid))
            .map(|sample| u64::from(sample.height))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use rill_registry::BlockConfig;

    use super::*;
    use crate::world::RamWorld;

    #[test]
    fn test_sample_and_flow_vector() {
        let mut blocks = BlockRegistry::new();
        let lava = blocks
            .register("core:lava", None, BlockConfig::liquid(3.0))
            .expect("registers");
        let region = BlockBox::new(BlockPos::new(0, 0, 0), BlockPos::new(2, 0, 0));
        let world = RamWorld::with_region(region);
        let pos = BlockPos::new(1, 0, 0);
        world.set_block(pos, lava);
        world.set_raw_status(
            pos,
            LiquidStatus::flowing(9, Direction::West, 2)
                .encode()
                .expect("valid status"),
        );

        let view = LiquidView::new(&world, &blocks);
        let sample = view.sample(pos).expect("lava");
        assert_eq!(sample.height, 9);
        assert_eq!(sample.rate, 2);
        assert_eq!(sample.flow_vector(), Vector3::new(-6.0, 0.0, 0.0));
        assert!(view.sample(BlockPos::new(0, 0, 0)).is_none());
        assert_eq!(view.volume(&region, None), 9);
        assert_eq!(view.volume(&region, Some(BlockId::AIR)), 0);
    }
}
