//! Block and reaction registries for the rill liquid simulation.
//!
//! Content is registered once at startup and frozen; the simulation only ever
//! reads from these tables.

pub mod blocks;
pub mod reaction;

use thiserror::Error;

pub use blocks::{BlockConfig, BlockDefinition, BlockEntry, BlockId, BlockRegistry, FamilyId};
pub use reaction::{Reaction, ReactionDefinition, ReactionTable};

/// Registry lifecycle hooks.
pub trait RegistryExt {
    /// Disallows further registration.
    fn freeze(&mut self);
}

/// Errors raised while loading content.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two blocks were registered under the same name.
    #[error("block `{0}` is already registered")]
    DuplicateBlock(String),
    /// The registry ran out of 16-bit block ids.
    #[error("block id space exhausted while registering `{0}`")]
    IdsExhausted(String),
    /// Content definitions could not be parsed.
    #[error("malformed content definitions: {0}")]
    Json(#[from] serde_json::Error),
}
