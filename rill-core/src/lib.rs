//! # Rill Core
//!
//! A cellular-automaton liquid simulation over a voxel grid.
//!
//! Each liquid voxel stores a single status byte: its height in sixteenths of a
//! block and the direction and rate it is flowing at. Once per tick a bounded
//! number of dirty positions is taken from a two-colour scheduler and run
//! through the flow engine, which moves liquid between face neighbours,
//! resolves reactions between liquids and the blocks they meet, and schedules
//! whatever it disturbed.
//!
//! - [`liquid`] - status codec, flow engine and random agitator
//! - [`ticks`] - the dirty-position scheduler
//! - [`world`] - the grid the simulation runs on
//! - [`system`] - the tick driver tying everything together
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::cargo_common_metadata
)]

pub mod config;
pub mod liquid;
pub mod system;
pub mod ticks;
pub mod view;
pub mod world;

pub use config::{ConfigError, LiquidConfig};
pub use liquid::{FlowError, LiquidStatus, StatusError};
pub use system::{LiquidFlowSystem, TickReport};
pub use ticks::LiquidScheduler;
pub use view::{LiquidSample, LiquidView};
pub use world::{AllowAll, DestroyHook, DestroyOutcome, RamWorld, VetoAll, WorldGrid};
