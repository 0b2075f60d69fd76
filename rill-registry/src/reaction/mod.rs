//! Liquid "smooshing" reactions.
//!
//! A reaction describes what happens when a liquid flows into a block of a
//! given family: the block is destroyed, optionally leaving a product behind.

pub mod definition;
pub mod table;

pub use definition::ReactionDefinition;
pub use table::{Reaction, ReactionTable};
