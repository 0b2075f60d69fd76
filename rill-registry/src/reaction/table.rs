use rustc_hash::FxHashMap;

use super::ReactionDefinition;
use crate::blocks::{BlockId, BlockRegistry, FamilyId};

/// A resolved reaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reaction {
    /// Block left behind, `None` if the displaced block is only destroyed.
    pub product: Option<BlockId>,
    /// Whole blocks of the flowing liquid needed per reaction.
    pub liquid_required: f32,
    /// Whole blocks of the displaced liquid needed per reaction.
    pub other_liquid_required: f32,
    /// Whether this entry was declared reversible.
    pub reversible: bool,
}

impl Reaction {
    /// The entry for the opposite flow: roles and thresholds swapped.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            product: self.product,
            liquid_required: self.other_liquid_required,
            other_liquid_required: self.liquid_required,
            reversible: self.reversible,
        }
    }
}

/// Reactions keyed by concrete liquid block, then by displaced block family.
///
/// Built once from content definitions and never mutated afterwards.
#[derive(Debug, Default)]
pub struct ReactionTable {
    by_liquid: FxHashMap<BlockId, FxHashMap<FamilyId, Reaction>>,
}

impl ReactionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every definition against the registry.
    ///
    /// Definitions naming a block that is not registered are skipped: the
    /// content module defining it may simply not be loaded.
    #[must_use]
    pub fn build(blocks: &BlockRegistry, definitions: &[ReactionDefinition]) -> Self {
        let mut table = Self::new();
        for definition in definitions {
            let Some(liquid) = blocks.get_by_name(&definition.liquid) else {
                log::debug!(
                    "Skipping reaction {} -> {}: liquid not loaded",
                    definition.liquid,
                    definition.block
                );
                continue;
            };
            let Some(block) = blocks.get_by_name(&definition.block) else {
                log::debug!(
                    "Skipping reaction {} -> {}: block not loaded",
                    definition.liquid,
                    definition.block
                );
                continue;
            };
            let product = match &definition.product {
                Some(name) => match blocks.get_by_name(name) {
                    Some(id) => Some(id),
                    None => {
                        log::debug!(
                            "Skipping reaction {} -> {}: product {name} not loaded",
                            definition.liquid,
                            definition.block
                        );
                        continue;
                    }
                },
                None => None,
            };

            let reaction = Reaction {
                product,
                liquid_required: definition.liquid_required,
                other_liquid_required: definition.other_liquid_required,
                reversible: definition.reversible,
            };
            table.insert(liquid, blocks.family_of(block), reaction);
            if definition.reversible {
                table.insert(block, blocks.family_of(liquid), reaction.mirrored());
            }
        }
        log::debug!("Loaded {} liquid reactions", table.len());
        table
    }

    fn insert(&mut self, liquid: BlockId, family: FamilyId, reaction: Reaction) {
        self.by_liquid
            .entry(liquid)
            .or_default()
            .insert(family, reaction);
    }

    /// Looks up the reaction of `liquid` flowing into a block of `family`.
    #[must_use]
    pub fn get(&self, liquid: BlockId, family: FamilyId) -> Option<&Reaction> {
        self.by_liquid.get(&liquid)?.get(&family)
    }

    /// Looks up the reaction of `liquid` flowing into `block`.
    #[must_use]
    pub fn get_for_block(
        &self,
        blocks: &BlockRegistry,
        liquid: BlockId,
        block: BlockId,
    ) -> Option<&Reaction> {
        self.get(liquid, blocks.family_of(block))
    }

    /// Total number of entries, mirrored ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_liquid.values().map(FxHashMap::len).sum()
    }

    /// Returns true if no reaction is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
