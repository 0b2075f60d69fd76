//! Tick driver for the liquid simulation.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rill_registry::{BlockId, BlockRegistry, ReactionTable};
use rill_utils::{BlockBox, BlockPos, Direction};

use crate::config::LiquidConfig;
use crate::liquid::{Agitator, FlowContext, FlowEngine, LiquidRules, status};
use crate::ticks::LiquidScheduler;
use crate::world::{DestroyHook, WorldGrid};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Positions taken from the queue.
    pub processed: usize,
    /// Passes that changed something.
    pub useful: usize,
    /// Still cells nudged by the agitator.
    pub agitated: usize,
    /// Passes aborted with an error.
    pub errors: usize,
}

/// Owns the flow engine and agitator and drives them once per tick.
///
/// The scheduler is shared: block-change and region-load notifications may
/// arrive from other threads through [`LiquidFlowSystem::scheduler`].
pub struct LiquidFlowSystem {
    config: LiquidConfig,
    blocks: Arc<BlockRegistry>,
    world: Arc<dyn WorldGrid>,
    hook: Arc<dyn DestroyHook>,
    scheduler: Arc<LiquidScheduler>,
    engine: FlowEngine,
    agitator: Agitator,
    ticks: u64,
}

impl LiquidFlowSystem {
    /// Creates a system over a world. Existing liquid is not scheduled until
    /// [`on_region_loaded`](Self::on_region_loaded) is called for it.
    #[must_use]
    pub fn new(
        config: LiquidConfig,
        blocks: Arc<BlockRegistry>,
        reactions: Arc<ReactionTable>,
        world: Arc<dyn WorldGrid>,
        hook: Arc<dyn DestroyHook>,
    ) -> Self {
        let mut seeds = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let rules = LiquidRules::new(Arc::clone(&blocks), reactions);
        let engine = FlowEngine::with_rng(rules.clone(), StdRng::seed_from_u64(seeds.next_u64()))
            .with_max_reaction_draws(config.max_reaction_draws);
        let agitator = Agitator::with_rng(
            rules,
            config.agitation_samples,
            StdRng::seed_from_u64(seeds.next_u64()),
        );
        Self {
            config,
            blocks,
            world,
            hook,
            scheduler: Arc::new(LiquidScheduler::new()),
            engine,
            agitator,
            ticks: 0,
        }
    }

    /// The shared scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<LiquidScheduler> {
        &self.scheduler
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &Arc<dyn WorldGrid> {
        &self.world
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LiquidConfig {
        &self.config
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Schedules a changed position and its six neighbours, if they hold
    /// liquid.
    pub fn on_block_changed(&self, pos: BlockPos) {
        let world = &*self.world;
        self.scheduler.schedule_if_liquid(world, &self.blocks, pos);
        for direction in Direction::ALL {
            self.scheduler
                .schedule_if_liquid(world, &self.blocks, direction.relative(pos));
        }
    }

    /// Schedules every liquid cell of a freshly loaded region.
    pub fn on_region_loaded(&self, region: BlockBox) {
        let world = &*self.world;
        let scheduled = region
            .positions()
            .filter(|pos| self.scheduler.schedule_if_liquid(world, &self.blocks, *pos))
            .count();
        log::debug!("Scheduled {scheduled} liquid cells in loaded region {region:?}");
    }

    /// Places a full, still liquid block.
    ///
    /// Returns `false` if `liquid` is not a liquid or `pos` is not loaded.
    pub fn place_liquid(&self, pos: BlockPos, liquid: BlockId) -> bool {
        if !self.blocks.is_liquid(liquid) || !self.world.is_loaded(pos) {
            return false;
        }
        self.world.set_block(pos, liquid);
        self.world.set_raw_status(pos, status::FULL);
        self.on_block_changed(pos);
        true
    }

    /// Runs one tick of `delta` seconds.
    ///
    /// Flips the active parity, swaps its queues if drained, then processes
    /// positions until the update budget is spent or the queue is empty.
    /// The agitator runs last so every cell it nudges is settled only after
    /// its target has taken the flow.
    pub fn tick(&mut self, delta: f64) -> TickReport {
        let parity = self.scheduler.advance(delta);
        self.scheduler.swap_if_drained(parity, self.config.swap_interval);

        let ctx = FlowContext {
            world: &*self.world,
            hook: &*self.hook,
            scheduler: &self.scheduler,
        };
        let mut report = TickReport::default();
        while report.useful < self.config.max_updates_per_tick {
            let Some(pos) = self.scheduler.pop() else {
                break;
            };
            report.processed += 1;
            match self.engine.process(&ctx, pos) {
                Ok(true) => report.useful += 1,
                Ok(false) => {}
                Err(err) => {
                    log::error!("Liquid update at {pos} aborted: {err}");
                    report.errors += 1;
                }
            }
        }

        report.agitated = self.agitator.agitate(&*self.world, &self.scheduler, parity);
        self.ticks += 1;
        report
    }

    /// Runs ticks until the scheduler is idle or `max_ticks` have run.
    ///
    /// The agitator keeps finding work in an open pool, so this only
    /// terminates early for closed or fully settled liquid.
    pub fn run_until_idle(&mut self, delta: f64, max_ticks: u64) -> u64 {
        for ran in 0..max_ticks {
            if self.scheduler.is_idle() {
                return ran;
            }
            self.tick(delta);
        }
        max_ticks
    }
}

#[cfg(test)]
mod tests {
    use rill_registry::BlockConfig;

    use super::*;
    use crate::liquid::{FlowError, LiquidStatus};
    use crate::world::{AllowAll, RamWorld};

    fn system(region: BlockBox) -> (LiquidFlowSystem, Arc<RamWorld>, BlockId) {
        let mut blocks = BlockRegistry::new();
        let water = blocks
            .register("core:water", None, BlockConfig::liquid(1.0))
            .expect("registers");
        let world = Arc::new(RamWorld::with_region(region));
        let config = LiquidConfig {
            seed: Some(1),
            agitation_samples: 0,
            ..LiquidConfig::default()
        };
        let system = LiquidFlowSystem::new(
            config,
            Arc::new(blocks),
            Arc::new(ReactionTable::new()),
            world.clone(),
            Arc::new(AllowAll),
        );
        (system, world, water)
    }

    #[test]
    fn test_place_liquid_schedules_it() {
        let region = BlockBox::new(BlockPos::new(-2, -2, -2), BlockPos::new(2, 2, 2));
        let (system, world, water) = system(region);
        let pos = BlockPos::new(0, 0, 0);
        assert!(system.place_liquid(pos, water));
        assert_eq!(world.block(pos), water);
        assert_eq!(world.raw_status(pos), status::FULL);
        assert!(system.scheduler().is_scheduled(&pos));
        assert_eq!(system.scheduler().pending(), 1);

        assert!(!system.place_liquid(BlockPos::new(9, 9, 9), water));
        assert!(!system.place_liquid(BlockPos::new(1, 0, 0), BlockId::AIR));
    }

    #[test]
    fn test_region_load_schedules_liquid_only() {
        let region = BlockBox::new(BlockPos::new(0, 0, 0), BlockPos::new(3, 0, 0));
        let (system, world, water) = system(region);
        world.set_block(BlockPos::new(1, 0, 0), water);
        world.set_block(BlockPos::new(3, 0, 0), water);
        system.on_region_loaded(region);
        assert_eq!(system.scheduler().pending(), 2);
    }

    #[test]
    fn test_budget_limits_useful_updates() {
        let region = BlockBox::new(BlockPos::new(-8, 0, -8), BlockPos::new(8, 0, 8));
        let (mut system, _, water) = system(region);
        // Even positions only, each with open neighbours to spread into.
        for x in (-8..=8).step_by(2) {
            for z in (-8..=8).step_by(2) {
                system.place_liquid(BlockPos::new(x, 0, z), water);
            }
        }
        let report = system.tick(0.2);
        assert_eq!(report.useful, system.config().max_updates_per_tick);
        assert_eq!(report.errors, 0);
        assert_eq!(system.tick_count(), 1);
    }

    #[test]
    fn test_corrupt_status_is_reported_not_written() {
        let region = BlockBox::new(BlockPos::new(-2, -2, -2), BlockPos::new(2, 2, 2));
        let (mut system, world, water) = system(region);
        let pos = BlockPos::new(0, 0, 0);
        world.set_block(pos, water);
        // Height 1 with a committed outflow of 2.
        let corrupt = status::with_rate(
            status::with_direction(
                status::with_height(0, 1).expect("height"),
                status::FlowDirection::Face(Direction::East),
            ),
            2,
        )
        .expect("encodes");
        world.set_raw_status(pos, corrupt);

        let ctx = FlowContext {
            world: &*world,
            hook: &AllowAll,
            scheduler: &system.scheduler,
        };
        let result = system.engine.process(&ctx, pos);
        assert!(matches!(
            result,
            Err(FlowError::NegativeHeight { height: -1, rate: 2, .. })
        ));
        assert_eq!(world.raw_status(pos), corrupt);
        assert_eq!(LiquidStatus::decode(corrupt).height, 1);

        system.on_block_changed(pos);
        let report = system.tick(0.2);
        assert_eq!(report.errors, 1);
        assert_eq!(world.raw_status(pos), corrupt);
    }
}
