use serde::Deserialize;

/// Block id - index into the [`BlockRegistry`](super::BlockRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Empty space. Always registered first.
    pub const AIR: BlockId = BlockId(0);

    /// Returns true if this is empty space.
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Block family id. Reactions are keyed by the family of the displaced block
/// so one definition covers every variant of that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyId(pub u16);

/// Static behaviour flags of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockConfig {
    /// Empty space.
    pub is_air: bool,
    /// The block is a liquid and carries a status byte.
    pub liquid: bool,
    /// A liquid may flow into the block, destroying it.
    pub penetrable: bool,
    /// Mass per block, used by consumers of flow data.
    pub mass: f32,
}

impl BlockConfig {
    /// Config for empty space.
    pub const AIR: BlockConfig = BlockConfig {
        is_air: true,
        liquid: false,
        penetrable: true,
        mass: 0.0,
    };

    /// A solid block liquids cannot enter.
    #[must_use]
    pub const fn solid() -> Self {
        Self {
            is_air: false,
            liquid: false,
            penetrable: false,
            mass: 1.0,
        }
    }

    /// A non-liquid block liquids wash away (plants, torches, ...).
    #[must_use]
    pub const fn penetrable() -> Self {
        Self {
            is_air: false,
            liquid: false,
            penetrable: true,
            mass: 0.1,
        }
    }

    /// A liquid with the given mass.
    #[must_use]
    pub const fn liquid(mass: f32) -> Self {
        Self {
            is_air: false,
            liquid: true,
            penetrable: false,
            mass,
        }
    }
}

/// A registered block.
#[derive(Debug, Clone)]
pub struct BlockEntry {
    /// Registry id.
    pub id: BlockId,
    /// Unique name, e.g. `core:water`.
    pub name: String,
    /// Family this block belongs to.
    pub family: FamilyId,
    /// Behaviour flags.
    pub config: BlockConfig,
}

/// Declarative block description, as found in content files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Unique block name.
    pub name: String,
    /// Family name; defaults to the block name.
    #[serde(default)]
    pub family: Option<String>,
    /// Whether the block is a liquid.
    #[serde(default)]
    pub liquid: bool,
    /// Whether liquids may wash the block away.
    #[serde(default)]
    pub penetrable: bool,
    /// Mass per block.
    #[serde(default = "default_mass")]
    pub mass: f32,
}

fn default_mass() -> f32 {
    1.0
}

impl BlockDefinition {
    /// Behaviour flags described by this definition.
    #[must_use]
    pub fn config(&self) -> BlockConfig {
        BlockConfig {
            is_air: false,
            liquid: self.liquid,
            penetrable: self.penetrable && !self.liquid,
            mass: self.mass,
        }
    }
}
