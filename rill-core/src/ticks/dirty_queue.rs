//! Deduplicating insertion-ordered queue of positions.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use rill_utils::BlockPos;

/// FIFO of positions where every position appears at most once.
///
/// Re-inserting a queued position is a no-op and keeps its original place.
#[derive(Debug, Default)]
pub struct DirtyQueue {
    order: VecDeque<BlockPos>,
    members: FxHashSet<BlockPos>,
}

impl DirtyQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a position unless it is already queued.
    ///
    /// Returns `true` if the position was added.
    pub fn push(&mut self, pos: BlockPos) -> bool {
        if self.members.insert(pos) {
            self.order.push_back(pos);
            true
        } else {
            false
        }
    }

    /// Removes and returns the oldest position.
    pub fn pop(&mut self) -> Option<BlockPos> {
        let pos = self.order.pop_front()?;
        self.members.remove(&pos);
        Some(pos)
    }

    /// Returns `true` if the position is queued.
    #[must_use]
    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.members.contains(pos)
    }

    /// Number of queued positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates queued positions oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &BlockPos> {
        self.order.iter()
    }
}
