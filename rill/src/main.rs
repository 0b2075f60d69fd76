//! # Rill
//!
//! Command-line driver for the liquid simulation: loads the configuration and
//! content definitions, pours water and lava into a stone basin and runs the
//! requested number of ticks.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(clippy::single_call_fn, clippy::cargo_common_metadata)]

use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

use anyhow::{Context, bail};
use rill_core::{AllowAll, LiquidConfig, LiquidFlowSystem, LiquidView, RamWorld, WorldGrid};
use rill_registry::{
    BlockDefinition, BlockId, BlockRegistry, ReactionDefinition, ReactionTable, RegistryExt,
};
use rill_utils::{BlockBox, BlockPos};
use serde::Deserialize;

const DEFAULT_CONTENT: &str = include_str!("../package-content/default_content.json");
const DEFAULT_CONFIG_PATH: &str = "config/rill_config.json5";
const DEFAULT_TICKS: u64 = 600;
/// Seconds per tick.
const TICK_DELTA: f64 = 0.05;
/// Inner width of the demo basin.
const BASIN_SIZE: i32 = 8;
const BASIN_DEPTH: i32 = 6;

struct Args {
    config: PathBuf,
    ticks: u64,
    content: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            ticks: DEFAULT_TICKS,
            content: None,
        };
        while let Some(flag) = args.next() {
            let Some(value) = args.next() else {
                bail!("`{flag}` expects a value");
            };
            match flag.as_str() {
                "--config" => parsed.config = PathBuf::from(value),
                "--ticks" => {
                    parsed.ticks = value
                        .parse()
                        .with_context(|| format!("invalid tick count `{value}`"))?;
                }
                "--content" => parsed.content = Some(PathBuf::from(value)),
                _ => bail!("unknown argument `{flag}`"),
            }
        }
        Ok(parsed)
    }
}

/// Block and reaction definitions shipped together.
#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    blocks: Vec<BlockDefinition>,
    #[serde(default)]
    reactions: Vec<ReactionDefinition>,
}

fn load_content(path: Option<&PathBuf>) -> anyhow::Result<(BlockRegistry, ReactionTable)> {
    let source = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read content from {}", path.display()))?,
        None => DEFAULT_CONTENT.to_owned(),
    };
    let content: Content = serde_json::from_str(&source).context("malformed content file")?;

    let mut blocks = BlockRegistry::new();
    blocks.register_all(&content.blocks)?;
    blocks.freeze();
    let reactions = ReactionTable::build(&blocks, &content.reactions);
    log::info!(
        "Loaded {} blocks and {} reactions",
        blocks.len(),
        reactions.len()
    );
    Ok((blocks, reactions))
}

fn block(blocks: &BlockRegistry, name: &str) -> anyhow::Result<BlockId> {
    blocks
        .get_by_name(name)
        .with_context(|| format!("content does not define `{name}`"))
}

/// Walls and floor of stone around an empty box, water in one corner and
/// lava in the opposite one.
fn build_basin(
    world: &RamWorld,
    system: &LiquidFlowSystem,
    blocks: &BlockRegistry,
) -> anyhow::Result<()> {
    let stone = block(blocks, "core:stone")?;
    let water = block(blocks, "core:water")?;
    let lava = block(blocks, "core:lava")?;

    let inner_max = BASIN_SIZE - 1;
    world.fill(
        BlockBox::new(
            BlockPos::new(-1, -1, -1),
            BlockPos::new(BASIN_SIZE, -1, BASIN_SIZE),
        ),
        stone,
    );
    for y in 0..BASIN_DEPTH {
        for i in -1..=BASIN_SIZE {
            for pos in [
                BlockPos::new(i, y, -1),
                BlockPos::new(i, y, BASIN_SIZE),
                BlockPos::new(-1, y, i),
                BlockPos::new(BASIN_SIZE, y, i),
            ] {
                world.set_block(pos, stone);
            }
        }
    }
    for y in 0..BASIN_DEPTH {
        system.place_liquid(BlockPos::new(0, y, 0), water);
        system.place_liquid(BlockPos::new(inner_max, y, inner_max), lava);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    rill_utils::logger::init()?;
    let args = Args::parse(env::args().skip(1))?;

    let config = LiquidConfig::load_or_create(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let (blocks, reactions) = load_content(args.content.as_ref())?;
    let blocks = Arc::new(blocks);

    let region = BlockBox::new(
        BlockPos::new(-1, -1, -1),
        BlockPos::new(BASIN_SIZE, BASIN_DEPTH, BASIN_SIZE),
    );
    let world = Arc::new(RamWorld::with_region(region));
    let mut system = LiquidFlowSystem::new(
        config,
        Arc::clone(&blocks),
        Arc::new(reactions),
        world.clone(),
        Arc::new(AllowAll),
    );
    build_basin(&world, &system, &blocks)?;
    log::info!("Running {} ticks over {region:?}", args.ticks);

    let mut errors = 0;
    for tick in 0..args.ticks {
        let report = system.tick(TICK_DELTA);
        errors += report.errors;
        log::debug!("Tick {tick}: {report:?}");
        if system.scheduler().is_idle() {
            log::info!("Liquid settled after {} ticks", tick + 1);
            break;
        }
    }

    let view = LiquidView::new(&*world, &blocks);
    let obsidian = blocks.get_by_name("core:obsidian");
    let solidified = region
        .positions()
        .filter(|pos| Some(world.block(*pos)) == obsidian)
        .count();
    log::info!(
        "Done after {} ticks: {} positions pending, water volume {}, lava volume {}, {solidified} obsidian, {errors} errors",
        system.tick_count(),
        system.scheduler().pending(),
        view.volume(&region, blocks.get_by_name("core:water")),
        view.volume(&region, blocks.get_by_name("core:lava")),
    );
    Ok(())
}
