//! Checkerboard scheduling of dirty liquid positions.
//!
//! # Architecture
//!
//! - [`DirtyQueue`] - Deduplicating FIFO of positions
//! - [`LiquidScheduler`] - Current/next queues per parity, the active parity
//!   flag and the swap timer
//!
//! Positions scheduled while a parity is being drained land in its `next`
//! queue, so nothing is processed twice within one pass.

mod dirty_queue;
mod scheduler;

pub use dirty_queue::DirtyQueue;
pub use scheduler::LiquidScheduler;
