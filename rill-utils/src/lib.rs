//! Shared value types for the rill liquid simulation.
//!
//! Positions, boxes, the six face directions and the checkerboard parity used
//! by the scheduler all live here so the registry and the core crate agree on
//! them.

pub mod direction;
pub mod logger;
pub mod math;
pub mod types;

pub use direction::Direction;
pub use types::{BlockBox, BlockPos, Parity};
