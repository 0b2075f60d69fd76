pub mod block;
pub mod registry;

pub use block::*;
pub use registry::*;
