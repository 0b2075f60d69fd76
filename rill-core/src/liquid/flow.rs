//! The per-position liquid transition.
//!
//! Every drained position goes through the same pass:
//!
//! 1. **Settle** - subtract the outflow committed last pass.
//! 2. **Inflow** - collect what neighbours committed towards this cell,
//!    resolving reactions when a different block is in the way.
//! 3. **Emptying** - a cell left with no liquid becomes air.
//! 4. **Outflow** - pick where the remaining liquid goes: straight down if
//!    possible, otherwise the lowest reachable horizontal neighbour.
//! 5. **Hysteresis** - keep the previous rate when the direction holds.
//! 6. **Commit** - write the new status and wake the surroundings.
//!
//! Outflow is committed by the source and only applied when the target runs
//! its own pass, so the scheduler must run a target before the source settles
//! again. The two-colour queues in [`crate::ticks`] give exactly that order.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rill_registry::{BlockId, BlockRegistry, ReactionTable};
use rill_utils::{BlockPos, Direction};
use smallvec::SmallVec;

use super::reaction::{self, ProductOutcome};
use super::status::{self, LiquidStatus, MAX_DOWN_RATE, MAX_HEIGHT, MAX_RATE};
use super::{Cell, FlowError, LiquidRules};
use crate::ticks::LiquidScheduler;
use crate::world::{DestroyHook, DestroyOutcome, WorldGrid};

/// Everything a pass reads from or writes to besides the engine itself.
#[derive(Clone, Copy)]
pub struct FlowContext<'a> {
    /// Block and status storage.
    pub world: &'a dyn WorldGrid,
    /// Asked before a liquid washes a block away.
    pub hook: &'a dyn DestroyHook,
    /// Receives every position the pass disturbs.
    pub scheduler: &'a LiquidScheduler,
}

impl FlowContext<'_> {
    fn schedule(&self, pos: BlockPos) {
        self.scheduler.schedule(self.world, pos);
    }

    fn schedule_around(&self, pos: BlockPos) {
        self.schedule(pos);
        for direction in Direction::ALL {
            self.schedule(direction.relative(pos));
        }
    }
}

/// Chosen outflow of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outflow {
    direction: Option<Direction>,
    rate: u8,
    /// Upper bound for the rate after hysteresis.
    max_rate: u8,
}

impl Outflow {
    const NONE: Outflow = Outflow {
        direction: None,
        rate: 0,
        max_rate: 0,
    };
}

/// Mutable state of the cell under update.
struct Pass {
    pos: BlockPos,
    block: BlockId,
    height: i32,
    smooshed: bool,
    /// Neighbours whose status was rewritten during inflow.
    touched: SmallVec<[BlockPos; 6]>,
}

/// The liquid transition function.
///
/// Owns the random source used for reactions so runs are reproducible from a
/// seed.
pub struct FlowEngine {
    rules: LiquidRules,
    rng: StdRng,
    max_reaction_draws: u32,
}

impl FlowEngine {
    /// Default cap on reaction redraws.
    pub const DEFAULT_REACTION_DRAWS: u32 = 64;

    /// Creates an engine seeded from the operating system.
    #[must_use]
    pub fn new(blocks: Arc<BlockRegistry>, reactions: Arc<ReactionTable>) -> Self {
        Self::with_rng(LiquidRules::new(blocks, reactions), StdRng::from_os_rng())
    }

    /// Creates an engine with a deterministic random source.
    #[must_use]
    pub fn seeded(blocks: Arc<BlockRegistry>, reactions: Arc<ReactionTable>, seed: u64) -> Self {
        Self::with_rng(
            LiquidRules::new(blocks, reactions),
            StdRng::seed_from_u64(seed),
        )
    }

    /// Creates an engine from shared rules and a random source.
    #[must_use]
    pub fn with_rng(rules: LiquidRules, rng: StdRng) -> Self {
        Self {
            rules,
            rng,
            max_reaction_draws: Self::DEFAULT_REACTION_DRAWS,
        }
    }

    /// Sets the cap on reaction redraws.
    #[must_use]
    pub fn with_max_reaction_draws(mut self, draws: u32) -> Self {
        self.max_reaction_draws = draws;
        self
    }

    /// The rules this engine classifies blocks with.
    #[must_use]
    pub fn rules(&self) -> &LiquidRules {
        &self.rules
    }

    /// Runs one pass over `pos`.
    ///
    /// Returns `true` if the pass did useful work: a liquid cell was updated,
    /// a block changed, or a cell that held liquid was drained. A
    /// [`FlowError::NegativeHeight`] is returned before anything is written.
    pub fn process(&mut self, ctx: &FlowContext<'_>, pos: BlockPos) -> Result<bool, FlowError> {
        let original = self.rules.read(ctx.world, pos);
        let height0 = i32::from(original.height);
        let height = height0 - i32::from(original.rate);
        if height < 0 {
            return Err(FlowError::NegativeHeight {
                pos,
                height,
                rate: original.rate,
            });
        }

        let mut pass = Pass {
            pos,
            block: original.block,
            height,
            smooshed: false,
            touched: SmallVec::new(),
        };
        for direction in Direction::ALL {
            self.inflow(ctx, &mut pass, direction)?;
        }
        for neighbour in pass.touched.drain(..) {
            ctx.schedule(neighbour);
        }

        if !self.rules.is_liquid(pass.block) || pass.height == 0 {
            return Ok(self.empty(ctx, &original, &pass));
        }

        let height = pass.height as u8;
        let mut outflow = self.plan_outflow(ctx.world, pos, pass.block, height, &original, pass.smooshed);
        if outflow.direction.is_some() && outflow.direction == original.direction && !pass.smooshed {
            outflow.rate = outflow.rate.max(original.rate);
        }
        outflow.rate = outflow.rate.min(outflow.max_rate).min(height);
        if outflow.rate == 0 {
            outflow.direction = None;
        }

        let new_status = LiquidStatus {
            height,
            direction: outflow.direction,
            rate: outflow.rate,
        }
        .encode()?;

        if pass.block != original.block {
            ctx.world.set_block(pos, pass.block);
        }
        if new_status == original.raw && !pass.smooshed {
            return Ok(false);
        }
        ctx.world.set_raw_status(pos, new_status);
        // Both the new and the old outflow target are face neighbours.
        ctx.schedule_around(pos);
        log::trace!(
            "Liquid at {pos}: height {height}, flow {:?} at {}",
            outflow.direction,
            outflow.rate
        );
        Ok(true)
    }

    /// Applies whatever the neighbour in `direction` is pushing into the cell.
    fn inflow(&mut self, ctx: &FlowContext<'_>, pass: &mut Pass, direction: Direction) -> Result<(), FlowError> {
        let neighbour_pos = direction.relative(pass.pos);
        let neighbour = self.rules.read(ctx.world, neighbour_pos);
        if neighbour.rate == 0 || neighbour.direction != Some(direction.opposite()) {
            return Ok(());
        }

        if neighbour.block == pass.block {
            let space = i32::from(MAX_HEIGHT) - pass.height;
            let accepted = i32::from(neighbour.rate).min(space).max(0);
            pass.height += accepted;
            if accepted < i32::from(neighbour.rate) {
                // Leave the excess with the neighbour.
                Self::set_rate(ctx, neighbour_pos, &neighbour, accepted as u8)?;
                pass.touched.push(neighbour_pos);
            }
            return Ok(());
        }

        if !self.rules.can_displace(neighbour.block, pass.block) {
            Self::block_inflow(ctx, pass, neighbour_pos, &neighbour)?;
            return Ok(());
        }

        let reaction = self.rules.reaction(neighbour.block, pass.block).copied();
        match reaction.and_then(|reaction| reaction.product.map(|product| (reaction, product))) {
            Some((reaction, product)) => {
                let this_height = self
                    .rules
                    .is_liquid(pass.block)
                    .then_some(pass.height.clamp(0, i32::from(MAX_HEIGHT)) as u8);
                let outcome = reaction::resolve_product(
                    &mut self.rng,
                    &reaction,
                    neighbour.rate,
                    this_height,
                    self.max_reaction_draws,
                );
                log::trace!("Reaction at {} gave {outcome:?}", pass.pos);
                match outcome {
                    ProductOutcome::Transform { consume_inflow } => {
                        pass.block = product;
                        pass.height = if self.rules.is_liquid(product) {
                            i32::from(MAX_HEIGHT)
                        } else {
                            0
                        };
                        pass.smooshed = true;
                        if consume_inflow {
                            Self::set_rate(ctx, neighbour_pos, &neighbour, 0)?;
                            pass.touched.push(neighbour_pos);
                        }
                    }
                    ProductOutcome::Drain => {
                        Self::set_rate(ctx, neighbour_pos, &neighbour, 0)?;
                        pass.touched.push(neighbour_pos);
                        pass.block = BlockId::AIR;
                        pass.height = 0;
                        pass.smooshed = true;
                    }
                    ProductOutcome::Absorb => {}
                    ProductOutcome::Inert => Self::block_inflow(ctx, pass, neighbour_pos, &neighbour)?,
                }
            }
            None => {
                if !pass.block.is_air()
                    && ctx.hook.request_destroy(pass.pos, neighbour.block) == DestroyOutcome::Vetoed
                {
                    log::warn!(
                        "Destruction of {:?} at {} by {:?} was vetoed",
                        pass.block,
                        pass.pos,
                        neighbour.block
                    );
                    Self::block_inflow(ctx, pass, neighbour_pos, &neighbour)?;
                    ctx.schedule(pass.pos);
                    return Ok(());
                }
                let consumed = reaction
                    .is_some_and(|reaction| reaction::consumes_inflow(&mut self.rng, &reaction, neighbour.rate));
                pass.smooshed = true;
                if consumed {
                    Self::set_rate(ctx, neighbour_pos, &neighbour, 0)?;
                    pass.touched.push(neighbour_pos);
                    pass.block = BlockId::AIR;
                    pass.height = 0;
                } else {
                    pass.block = neighbour.block;
                    pass.height = i32::from(neighbour.rate);
                }
            }
        }
        Ok(())
    }

    /// Stops a neighbour from pushing into an impenetrable cell.
    fn block_inflow(
        ctx: &FlowContext<'_>,
        pass: &mut Pass,
        neighbour_pos: BlockPos,
        neighbour: &Cell,
    ) -> Result<(), FlowError> {
        Self::set_rate(ctx, neighbour_pos, neighbour, 0)?;
        pass.touched.push(neighbour_pos);
        Ok(())
    }

    fn set_rate(ctx: &FlowContext<'_>, pos: BlockPos, cell: &Cell, rate: u8) -> Result<(), FlowError> {
        ctx.world.set_raw_status(pos, status::with_rate(cell.raw, rate)?);
        Ok(())
    }

    /// Finishes a pass that left no liquid in the cell.
    fn empty(&self, ctx: &FlowContext<'_>, original: &Cell, pass: &Pass) -> bool {
        let block = if self.rules.is_liquid(pass.block) {
            BlockId::AIR
        } else {
            pass.block
        };
        let changed = block != original.block;
        if changed {
            ctx.world.set_block(pass.pos, block);
        }
        if original.is_liquid() {
            ctx.world.set_raw_status(pass.pos, status::FULL);
        }
        if let Some(direction) = original.direction {
            ctx.schedule(direction.relative(pass.pos));
        }
        if changed {
            ctx.schedule_around(pass.pos);
            log::trace!("Cell at {} emptied to {block:?}", pass.pos);
        }
        original.is_liquid() || changed
    }

    /// Decides where the settled liquid goes next.
    fn plan_outflow(
        &self,
        world: &dyn WorldGrid,
        pos: BlockPos,
        liquid: BlockId,
        height: u8,
        original: &Cell,
        smooshed: bool,
    ) -> Outflow {
        let below_pos = pos.below();
        if world.is_loaded(below_pos) {
            let below = self.rules.read(world, below_pos);
            if below.block == liquid {
                let spare = MAX_HEIGHT - below.height;
                if spare > 0 {
                    return Outflow {
                        direction: Some(Direction::Down),
                        rate: spare.min(MAX_DOWN_RATE),
                        max_rate: spare + below.rate,
                    };
                }
            } else if self.rules.can_displace(liquid, below.block) {
                return Outflow {
                    direction: Some(Direction::Down),
                    rate: MAX_DOWN_RATE,
                    max_rate: MAX_DOWN_RATE,
                };
            }
        }

        let mut best: Option<(Direction, i32, u8)> = None;
        for direction in Direction::HORIZONTAL {
            let target_pos = direction.relative(pos);
            let Some(effective) = self.effective_height(world, liquid, target_pos) else {
                continue;
            };
            let keeps_previous = !smooshed && original.direction == Some(direction);
            let better = best.is_none_or(|(_, lowest, _)| {
                effective < lowest || (effective == lowest && keeps_previous)
            });
            if better {
                let target_rate = self.rules.read(world, target_pos).rate;
                best = Some((direction, effective, target_rate));
            }
        }

        let Some((direction, effective, target_rate)) = best else {
            return Outflow::NONE;
        };
        // A draining target makes room even when it is not lower.
        let max_rate = i32::from(height) - effective + i32::from(target_rate);
        if max_rate <= 1 {
            return Outflow::NONE;
        }
        Outflow {
            direction: Some(direction),
            rate: (max_rate - 1).min(i32::from(MAX_RATE)) as u8,
            max_rate: max_rate.min(i32::from(u8::MAX)) as u8,
        }
    }

    /// Height a horizontal neighbour presents to `liquid`, or `None` if the
    /// liquid cannot go there.
    ///
    /// Empty cells above a drop count as -1 so liquid prefers edges it can
    /// keep draining over.
    fn effective_height(&self, world: &dyn WorldGrid, liquid: BlockId, pos: BlockPos) -> Option<i32> {
        if !world.is_loaded(pos) {
            return None;
        }
        let cell = self.rules.read(world, pos);
        if cell.block == liquid {
            return Some(i32::from(cell.height));
        }
        if !self.rules.can_displace(liquid, cell.block) {
            return None;
        }
        let beneath_pos = pos.below();
        if !world.is_loaded(beneath_pos) {
            return Some(0);
        }
        let beneath = self.rules.read(world, beneath_pos);
        let drains = if beneath.block == liquid {
            beneath.height < MAX_HEIGHT
        } else {
            self.rules.can_displace(liquid, beneath.block)
        };
        Some(if drains { -1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use rill_registry::BlockConfig;
    use rill_utils::BlockBox;

    use super::*;
    use crate::world::{AllowAll, RamWorld};

    struct Fixture {
        engine: FlowEngine,
        world: RamWorld,
        scheduler: LiquidScheduler,
        water: BlockId,
        stone: BlockId,
    }

    impl Fixture {
        fn new(region: BlockBox) -> Self {
            let mut blocks = BlockRegistry::new();
            let water = blocks
                .register("core:water", None, BlockConfig::liquid(1.0))
                .expect("registers");
            let stone = blocks
                .register("core:stone", None, BlockConfig::solid())
                .expect("registers");
            Self {
                engine: FlowEngine::seeded(Arc::new(blocks), Arc::new(ReactionTable::new()), 7),
                world: RamWorld::with_region(region),
                scheduler: LiquidScheduler::new(),
                water,
                stone,
            }
        }

        fn water(&self, pos: BlockPos, status: LiquidStatus) {
            self.world.set_block(pos, self.water);
            self.world
                .set_raw_status(pos, status.encode().expect("valid status"));
        }

        fn process(&mut self, pos: BlockPos) -> LiquidStatus {
            let ctx = FlowContext {
                world: &self.world,
                hook: &AllowAll,
                scheduler: &self.scheduler,
            };
            self.engine.process(&ctx, pos).expect("processes");
            LiquidStatus::decode(self.world.raw_status(pos))
        }
    }

    /// A one-block-high strip along x with a stone floor.
    fn strip(min_x: i32, max_x: i32) -> Fixture {
        let fixture = Fixture::new(BlockBox::new(
            BlockPos::new(min_x, -1, 0),
            BlockPos::new(max_x, 0, 0),
        ));
        fixture.world.fill(
            BlockBox::new(BlockPos::new(min_x, -1, 0), BlockPos::new(max_x, -1, 0)),
            fixture.stone,
        );
        fixture
    }

    const ORIGIN: BlockPos = BlockPos::new(0, 0, 0);

    #[test]
    fn test_flows_into_draining_neighbour_of_equal_height() {
        let mut fixture = Fixture::new(BlockBox::new(
            BlockPos::new(0, -1, 0),
            BlockPos::new(1, 0, 0),
        ));
        fixture.world.set_block(BlockPos::new(0, -1, 0), fixture.stone);
        fixture.water(ORIGIN, LiquidStatus::still(10));
        fixture.water(
            BlockPos::new(1, 0, 0),
            LiquidStatus::flowing(10, Direction::Down, 4),
        );

        let after = fixture.process(ORIGIN);
        assert_eq!(after, LiquidStatus::flowing(10, Direction::East, 2));
        assert!(fixture.scheduler.is_scheduled(&BlockPos::new(1, 0, 0)));
    }

    #[test]
    fn test_equal_still_neighbour_gets_nothing() {
        let mut fixture = strip(0, 1);
        fixture.water(ORIGIN, LiquidStatus::still(10));
        fixture.water(BlockPos::new(1, 0, 0), LiquidStatus::still(9));

        // A deficit of one is not worth moving.
        assert_eq!(fixture.process(ORIGIN), LiquidStatus::still(10));
    }

    #[test]
    fn test_prefers_down_over_open_sides() {
        let region = BlockBox::new(BlockPos::new(-1, -1, -1), BlockPos::new(1, 0, 1));
        let mut fixture = Fixture::new(region);
        fixture.water(ORIGIN, LiquidStatus::FULL);

        let after = fixture.process(ORIGIN);
        assert_eq!(after, LiquidStatus::flowing(16, Direction::Down, MAX_DOWN_RATE));
        assert_eq!(
            status::direction(fixture.world.raw_status(ORIGIN)),
            status::FlowDirection::QuickDown
        );
    }

    #[test]
    fn test_prefers_neighbour_over_a_drop() {
        // West sits on the floor, east is open air over more air.
        let mut fixture = Fixture::new(BlockBox::new(
            BlockPos::new(-1, -1, 0),
            BlockPos::new(1, 0, 0),
        ));
        fixture.world.set_block(BlockPos::new(-1, -1, 0), fixture.stone);
        fixture.world.set_block(BlockPos::new(0, -1, 0), fixture.stone);
        fixture.water(ORIGIN, LiquidStatus::still(4));

        assert_eq!(
            fixture.process(ORIGIN),
            LiquidStatus::flowing(4, Direction::East, MAX_RATE)
        );
    }

    #[test]
    fn test_tie_keeps_previous_direction() {
        let mut fixture = strip(-1, 1);
        // Settles to 9 with both sides empty.
        fixture.water(ORIGIN, LiquidStatus::flowing(10, Direction::East, 1));

        assert_eq!(
            fixture.process(ORIGIN),
            LiquidStatus::flowing(9, Direction::East, MAX_RATE)
        );
    }

    #[test]
    fn test_lower_neighbour_beats_previous_direction() {
        let mut fixture = strip(-1, 1);
        fixture.water(ORIGIN, LiquidStatus::flowing(10, Direction::East, 1));
        fixture.water(BlockPos::new(1, 0, 0), LiquidStatus::still(3));

        assert_eq!(
            fixture.process(ORIGIN),
            LiquidStatus::flowing(9, Direction::West, MAX_RATE)
        );
    }

    #[test]
    fn test_rate_holds_while_direction_holds() {
        let mut fixture = strip(0, 1);
        fixture.water(ORIGIN, LiquidStatus::flowing(10, Direction::East, 2));
        fixture.water(BlockPos::new(1, 0, 0), LiquidStatus::still(6));

        // The planned rate is 1, the previous 2 still fits under maxRate.
        assert_eq!(
            fixture.process(ORIGIN),
            LiquidStatus::flowing(8, Direction::East, 2)
        );
    }

    #[test]
    fn test_held_rate_is_capped_by_max_rate() {
        let column = BlockBox::new(BlockPos::new(0, -1, 0), BlockPos::new(0, 1, 0));
        let mut fixture = Fixture::new(column);
        fixture.world.set_block(BlockPos::new(0, -1, 0), fixture.stone);
        let top = BlockPos::new(0, 1, 0);
        fixture.water(top, LiquidStatus::flowing(16, Direction::Down, 4));
        fixture.water(ORIGIN, LiquidStatus::still(14));

        assert_eq!(
            fixture.process(top),
            LiquidStatus::flowing(12, Direction::Down, 2)
        );
    }

    #[test]
    fn test_rate_is_capped_by_height() {
        let column = BlockBox::new(BlockPos::new(0, -1, 0), BlockPos::new(0, 0, 0));
        let mut fixture = Fixture::new(column);
        fixture.water(ORIGIN, LiquidStatus::still(1));

        assert_eq!(
            fixture.process(ORIGIN),
            LiquidStatus::flowing(1, Direction::Down, 1)
        );
    }
}
