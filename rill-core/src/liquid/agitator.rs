//! Random perturbation of still liquid.
//!
//! The downhill rule never moves liquid between cells of equal height, so a
//! perfectly symmetric pool would never settle into a level surface on its
//! own. Every tick a few random cells of the active parity are nudged towards
//! a random horizontal neighbour that could take the liquid.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rill_utils::{BlockBox, BlockPos, Direction, Parity};

use super::LiquidRules;
use super::status::{self, FlowDirection};
use crate::ticks::LiquidScheduler;
use crate::world::WorldGrid;

/// Nudges still liquid cells.
pub struct Agitator {
    rules: LiquidRules,
    rng: StdRng,
    samples: usize,
}

impl Agitator {
    /// Default number of samples per loaded region and tick.
    pub const DEFAULT_SAMPLES: usize = 10;

    /// Creates an agitator seeded from the operating system.
    #[must_use]
    pub fn new(rules: LiquidRules, samples: usize) -> Self {
        Self::with_rng(rules, samples, StdRng::from_os_rng())
    }

    /// Creates an agitator with a given random source.
    #[must_use]
    pub fn with_rng(rules: LiquidRules, samples: usize, rng: StdRng) -> Self {
        Self { rules, rng, samples }
    }

    /// Samples every loaded region and nudges still liquid of `parity`.
    ///
    /// Returns the number of cells given a direction.
    pub fn agitate(
        &mut self,
        world: &dyn WorldGrid,
        scheduler: &LiquidScheduler,
        parity: Parity,
    ) -> usize {
        let mut agitated = 0;
        for region in world.loaded_regions() {
            for _ in 0..self.samples {
                let Some(pos) = self.sample(&region, parity) else {
                    continue;
                };
                if self.nudge(world, scheduler, pos) {
                    agitated += 1;
                }
            }
        }
        if agitated > 0 {
            log::debug!("Agitated {agitated} still liquid cells");
        }
        agitated
    }

    /// Picks a random position of `parity` inside the region.
    ///
    /// A sample of the wrong parity is moved one step along the first axis
    /// that has room, which keeps it inside the region.
    fn sample(&mut self, region: &BlockBox, parity: Parity) -> Option<BlockPos> {
        let pos = BlockPos::new(
            self.rng.random_range(region.min.x()..=region.max.x()),
            self.rng.random_range(region.min.y()..=region.max.y()),
            self.rng.random_range(region.min.z()..=region.max.z()),
        );
        if pos.parity() == parity {
            return Some(pos);
        }
        let step = |value: i32, min: i32, max: i32| -> Option<i32> {
            if value < max {
                Some(1)
            } else if value > min {
                Some(-1)
            } else {
                None
            }
        };
        if let Some(dx) = step(pos.x(), region.min.x(), region.max.x()) {
            return Some(pos.offset(dx, 0, 0));
        }
        if let Some(dy) = step(pos.y(), region.min.y(), region.max.y()) {
            return Some(pos.offset(0, dy, 0));
        }
        step(pos.z(), region.min.z(), region.max.z()).map(|dz| pos.offset(0, 0, dz))
    }

    /// Points a still liquid cell at a random horizontal neighbour that is
    /// lower or displaceable.
    fn nudge(&mut self, world: &dyn WorldGrid, scheduler: &LiquidScheduler, pos: BlockPos) -> bool {
        let cell = self.rules.read(world, pos);
        if !cell.is_liquid() || cell.rate != 0 {
            return false;
        }
        let direction = Direction::HORIZONTAL[self.rng.random_range(0..Direction::HORIZONTAL.len())];
        let target_pos = direction.relative(pos);
        if !world.is_loaded(target_pos) {
            return false;
        }
        let target = self.rules.read(world, target_pos);
        let accepts = if target.block == cell.block {
            target.height < cell.height
        } else {
            self.rules.can_displace(cell.block, target.block)
        };
        if !accepts {
            return false;
        }

        // A face code with a clear rate bit reads back as rate 1.
        world.set_raw_status(pos, status::with_direction(cell.raw, FlowDirection::Face(direction)));
        scheduler.schedule(world, pos);
        scheduler.schedule(world, target_pos);
        log::trace!("Agitated liquid at {pos} towards {direction:?}");
        true
    }
}
