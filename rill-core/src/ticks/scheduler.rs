//! Two-colour, double-buffered scheduler for dirty liquid positions.

use std::mem;

use parking_lot::Mutex;
use rill_registry::BlockRegistry;
use rill_utils::{BlockPos, Parity};

use super::DirtyQueue;
use crate::world::WorldGrid;

/// Slack for accumulated floating point error in scheduler time.
const SWAP_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct ParityQueues {
    /// Positions drained while this parity is active.
    current: DirtyQueue,
    /// Positions scheduled since the last swap.
    next: DirtyQueue,
    /// Scheduler time of the last swap.
    last_swap: f64,
}

impl ParityQueues {
    fn new() -> Self {
        Self {
            current: DirtyQueue::new(),
            next: DirtyQueue::new(),
            last_swap: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug)]
struct Clock {
    elapsed: f64,
    active: Parity,
}

/// Work queues for the flow engine.
///
/// Positions are split by [`Parity`]: face neighbours never share a parity, so
/// while one colour is drained its neighbours hold still. Each parity owns a
/// `current` queue that is drained and a `next` queue that receives new work;
/// they swap once `current` runs dry.
///
/// Producers may schedule from any thread. Each parity has its own lock, so a
/// producer only ever contends with the tick thread on one of them.
#[derive(Debug)]
pub struct LiquidScheduler {
    queues: [Mutex<ParityQueues>; 2],
    clock: Mutex<Clock>,
}

impl LiquidScheduler {
    /// Creates an empty scheduler. The first [`advance`](Self::advance)
    /// activates [`Parity::Even`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: [Mutex::new(ParityQueues::new()), Mutex::new(ParityQueues::new())],
            clock: Mutex::new(Clock {
                elapsed: 0.0,
                active: Parity::Odd,
            }),
        }
    }

    /// Queues a position for the next pass of its parity.
    ///
    /// Unloaded positions are ignored. Returns `true` if the position was not
    /// queued yet.
    pub fn schedule(&self, world: &dyn WorldGrid, pos: BlockPos) -> bool {
        if !world.is_loaded(pos) {
            return false;
        }
        let added = self.queues[pos.parity().index()].lock().next.push(pos);
        if added {
            log::trace!("Scheduled liquid update at {pos}");
        }
        added
    }

    /// Like [`schedule`](Self::schedule), but only for positions holding a
    /// liquid.
    pub fn schedule_if_liquid(
        &self,
        world: &dyn WorldGrid,
        blocks: &BlockRegistry,
        pos: BlockPos,
    ) -> bool {
        blocks.is_liquid(world.block(pos)) && self.schedule(world, pos)
    }

    /// Advances scheduler time and flips the active parity.
    ///
    /// Returns the parity that is now active.
    pub fn advance(&self, delta: f64) -> Parity {
        let mut clock = self.clock.lock();
        clock.elapsed += delta;
        clock.active = clock.active.flip();
        clock.active
    }

    /// Parity currently being drained.
    #[must_use]
    pub fn active(&self) -> Parity {
        self.clock.lock().active
    }

    /// Total scheduler time.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.clock.lock().elapsed
    }

    /// Removes the oldest position from the active parity's current queue.
    pub fn pop(&self) -> Option<BlockPos> {
        let active = self.active();
        self.queues[active.index()].lock().current.pop()
    }

    /// Removes up to `max` positions from the active parity's current queue,
    /// in insertion order.
    pub fn drain(&self, max: usize) -> Vec<BlockPos> {
        let active = self.active();
        let mut queues = self.queues[active.index()].lock();
        let count = max.min(queues.current.len());
        let mut drained = Vec::with_capacity(count);
        while drained.len() < count {
            match queues.current.pop() {
                Some(pos) => drained.push(pos),
                None => break,
            }
        }
        drained
    }

    /// Swaps `current` and `next` of `parity` if its `current` queue is
    /// empty and at least `interval / 2` has passed since it last swapped.
    ///
    /// Called for the active parity right before it is drained, so work
    /// scheduled for a parity during the other parity's pass is picked up
    /// on its very next pass.
    pub fn swap_if_drained(&self, parity: Parity, interval: f64) -> bool {
        let elapsed = self.elapsed();
        let mut guard = self.queues[parity.index()].lock();
        let queues = &mut *guard;
        if !queues.current.is_empty()
            || queues.next.is_empty()
            || elapsed - queues.last_swap + SWAP_EPSILON < interval / 2.0
        {
            return false;
        }
        mem::swap(&mut queues.current, &mut queues.next);
        queues.last_swap = elapsed;
        log::trace!(
            "Swapped {parity:?} liquid queue, {} positions ready",
            queues.current.len()
        );
        true
    }

    /// Returns `true` if the position is waiting in any queue.
    #[must_use]
    pub fn is_scheduled(&self, pos: &BlockPos) -> bool {
        let queues = self.queues[pos.parity().index()].lock();
        queues.current.contains(pos) || queues.next.contains(pos)
    }

    /// Number of queued positions across all queues.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queues
            .iter()
            .map(|queues| {
                let queues = queues.lock();
                queues.current.len() + queues.next.len()
            })
            .sum()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for LiquidScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rill_registry::BlockConfig;
    use rill_utils::BlockBox;

    use super::*;
    use crate::world::RamWorld;

    fn world() -> RamWorld {
        RamWorld::with_region(BlockBox::new(
            BlockPos::new(-8, -8, -8),
            BlockPos::new(8, 8, 8),
        ))
    }

    #[test]
    fn test_first_advance_is_even() {
        let scheduler = LiquidScheduler::new();
        assert_eq!(scheduler.advance(0.05), Parity::Even);
        assert_eq!(scheduler.advance(0.05), Parity::Odd);
        assert!((scheduler.elapsed() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_schedule_twice_processes_once() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        let pos = BlockPos::new(2, 0, 0);
        assert!(scheduler.schedule(&world, pos));
        assert!(!scheduler.schedule(&world, pos));
        assert_eq!(scheduler.pending(), 1);

        let parity = scheduler.advance(0.2);
        assert!(scheduler.swap_if_drained(parity, 0.2));
        assert_eq!(scheduler.drain(10), vec![pos]);
        assert!(scheduler.drain(10).is_empty());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_unloaded_positions_ignored() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        assert!(!scheduler.schedule(&world, BlockPos::new(100, 0, 0)));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_schedule_if_liquid_filters() {
        let world = world();
        let mut blocks = BlockRegistry::new();
        let water = blocks
            .register("core:water", None, BlockConfig::liquid(1.0))
            .expect("registers");
        let wet = BlockPos::new(0, 0, 0);
        world.set_block(wet, water);

        let scheduler = LiquidScheduler::new();
        assert!(scheduler.schedule_if_liquid(&world, &blocks, wet));
        assert!(!scheduler.schedule_if_liquid(&world, &blocks, BlockPos::new(1, 0, 0)));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_only_active_parity_drains() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        let even = BlockPos::new(0, 0, 0);
        let odd = BlockPos::new(1, 0, 0);
        scheduler.schedule(&world, odd);
        scheduler.schedule(&world, even);

        assert_eq!(scheduler.advance(0.2), Parity::Even);
        assert!(scheduler.swap_if_drained(Parity::Even, 0.2));
        assert_eq!(scheduler.drain(10), vec![even]);
        assert_eq!(scheduler.advance(0.2), Parity::Odd);
        assert_eq!(scheduler.pop(), None);
        assert!(scheduler.swap_if_drained(Parity::Odd, 0.2));
        assert_eq!(scheduler.pop(), Some(odd));
        assert_eq!(scheduler.pop(), None);
    }

    #[test]
    fn test_work_scheduled_mid_pass_waits_for_swap() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(2, 0, 0);
        scheduler.schedule(&world, a);
        let parity = scheduler.advance(0.2);
        scheduler.swap_if_drained(parity, 0.2);

        assert_eq!(scheduler.pop(), Some(a));
        scheduler.schedule(&world, a);
        scheduler.schedule(&world, b);
        assert_eq!(scheduler.pop(), None);
        assert_eq!(scheduler.pending(), 2);
    }

    #[test]
    fn test_swap_waits_for_half_interval() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        let a = BlockPos::new(0, 0, 0);
        scheduler.schedule(&world, a);
        scheduler.advance(0.05);
        assert!(scheduler.swap_if_drained(Parity::Even, 0.2));
        assert_eq!(scheduler.pop(), Some(a));

        scheduler.schedule(&world, a);
        scheduler.advance(0.05);
        assert!(!scheduler.swap_if_drained(Parity::Even, 0.2));
        scheduler.advance(0.05);
        assert!(scheduler.swap_if_drained(Parity::Even, 0.2));
    }

    #[test]
    fn test_swap_waits_for_drain() {
        let world = world();
        let scheduler = LiquidScheduler::new();
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(2, 0, 0);
        scheduler.schedule(&world, a);
        assert!(scheduler.swap_if_drained(Parity::Even, 0.2));
        scheduler.schedule(&world, b);
        assert!(!scheduler.swap_if_drained(Parity::Even, 0.2));
        assert!(!scheduler.swap_if_drained(Parity::Odd, 0.2));
        assert_eq!(scheduler.pending(), 2);
    }

    #[test]
    fn test_concurrent_producers() {
        let world = Arc::new(world());
        let scheduler = Arc::new(LiquidScheduler::new());
        crossbeam::scope(|scope| {
            for thread in 0..4 {
                let world = Arc::clone(&world);
                let scheduler = Arc::clone(&scheduler);
                scope.spawn(move |_| {
                    for x in -8..=8 {
                        for z in -8..=8 {
                            scheduler.schedule(&*world, BlockPos::new(x, thread, z));
                            scheduler.schedule(&*world, BlockPos::new(x, 0, z));
                        }
                    }
                });
            }
        })
        .expect("producer threads");
        // Four layers of 17x17, y = 0 shared by every thread.
        assert_eq!(scheduler.pending(), 4 * 17 * 17);
    }
}
