use rustc_hash::FxHashMap;

use super::{BlockConfig, BlockDefinition, BlockEntry, BlockId, FamilyId};
use crate::{RegistryError, RegistryExt};

/// Name of the always-present empty block.
pub const AIR_NAME: &str = "core:air";

/// All known blocks, indexed by id and by name.
///
/// Ids are handed out densely in registration order; [`BlockId::AIR`] is
/// registered by [`BlockRegistry::new`].
pub struct BlockRegistry {
    by_id: Vec<BlockEntry>,
    by_name: FxHashMap<String, BlockId>,
    families: FxHashMap<String, FamilyId>,
    allows_registering: bool,
}

impl BlockRegistry {
    /// Creates a registry holding only air.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            by_id: Vec::new(),
            by_name: FxHashMap::default(),
            families: FxHashMap::default(),
            allows_registering: true,
        };
        let air_family = FamilyId(0);
        registry.families.insert(AIR_NAME.to_owned(), air_family);
        registry.by_name.insert(AIR_NAME.to_owned(), BlockId::AIR);
        registry.by_id.push(BlockEntry {
            id: BlockId::AIR,
            name: AIR_NAME.to_owned(),
            family: air_family,
            config: BlockConfig::AIR,
        });
        registry
    }

    /// Registers a block and returns its id.
    ///
    /// # Panics
    /// Panics if the registry has been frozen.
    pub fn register(
        &mut self,
        name: &str,
        family: Option<&str>,
        config: BlockConfig,
    ) -> Result<BlockId, RegistryError> {
        assert!(
            self.allows_registering,
            "Cannot register block after registry is frozen"
        );
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateBlock(name.to_owned()));
        }
        let id = u16::try_from(self.by_id.len())
            .map(BlockId)
            .map_err(|_| RegistryError::IdsExhausted(name.to_owned()))?;
        let family = self.intern_family(family.unwrap_or(name), name)?;

        self.by_name.insert(name.to_owned(), id);
        self.by_id.push(BlockEntry {
            id,
            name: name.to_owned(),
            family,
            config,
        });
        log::trace!("Registered block {name} as {id:?} in {family:?}");
        Ok(id)
    }

    /// Registers every definition in order.
    pub fn register_all(&mut self, definitions: &[BlockDefinition]) -> Result<(), RegistryError> {
        for definition in definitions {
            self.register(
                &definition.name,
                definition.family.as_deref(),
                definition.config(),
            )?;
        }
        Ok(())
    }

    /// Parses a JSON array of [`BlockDefinition`]s and registers them.
    pub fn register_json(&mut self, json: &str) -> Result<(), RegistryError> {
        let definitions: Vec<BlockDefinition> = serde_json::from_str(json)?;
        self.register_all(&definitions)
    }

    fn intern_family(&mut self, name: &str, block: &str) -> Result<FamilyId, RegistryError> {
        if let Some(id) = self.families.get(name) {
            return Ok(*id);
        }
        let id = u16::try_from(self.families.len())
            .map(FamilyId)
            .map_err(|_| RegistryError::IdsExhausted(block.to_owned()))?;
        self.families.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Looks up a block by id.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&BlockEntry> {
        self.by_id.get(usize::from(id.0))
    }

    /// Looks up a block id by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a family id by name.
    #[must_use]
    pub fn family_by_name(&self, name: &str) -> Option<FamilyId> {
        self.families.get(name).copied()
    }

    /// Family of a block. Unknown ids fall back to the air family.
    #[must_use]
    pub fn family_of(&self, id: BlockId) -> FamilyId {
        self.get(id).map_or(self.by_id[0].family, |entry| entry.family)
    }

    /// Returns true if the block is a registered liquid.
    #[must_use]
    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|entry| entry.config.liquid)
    }

    /// Returns true for air and for non-liquid blocks liquids wash away.
    #[must_use]
    pub fn is_penetrable(&self, id: BlockId) -> bool {
        self.get(id)
            .is_none_or(|entry| entry.config.is_air || (entry.config.penetrable && !entry.config.liquid))
    }

    /// Mass of a block, 0 for unknown ids.
    #[must_use]
    pub fn mass(&self, id: BlockId) -> f32 {
        self.get(id).map_or(0.0, |entry| entry.config.mass)
    }

    /// Number of registered blocks, air included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Always false, air is registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates all registered blocks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockEntry> {
        self.by_id.iter()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryExt for BlockRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_is_preregistered() {
        let registry = BlockRegistry::new();
        assert_eq!(registry.get_by_name(AIR_NAME), Some(BlockId::AIR));
        assert!(registry.is_penetrable(BlockId::AIR));
        assert!(!registry.is_liquid(BlockId::AIR));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_assigns_dense_ids() {
        let mut registry = BlockRegistry::new();
        let water = registry
            .register("core:water", None, BlockConfig::liquid(1.0))
            .expect("water registers");
        let stone = registry
            .register("core:stone", None, BlockConfig::solid())
            .expect("stone registers");
        assert_eq!(water, BlockId(1));
        assert_eq!(stone, BlockId(2));
        assert!(registry.is_liquid(water));
        assert!(!registry.is_penetrable(stone));
        assert!(!registry.is_penetrable(water));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = BlockRegistry::new();
        registry
            .register("core:stone", None, BlockConfig::solid())
            .expect("first registration");
        let err = registry
            .register("core:stone", None, BlockConfig::solid())
            .expect_err("duplicate");
        assert!(matches!(err, RegistryError::DuplicateBlock(name) if name == "core:stone"));
    }

    #[test]
    fn test_id_space_exhaustion() {
        let mut registry = BlockRegistry::new();
        for i in 1..=u16::MAX {
            registry
                .register(&format!("test:block_{i}"), None, BlockConfig::solid())
                .expect("fits in 16 bits");
        }
        let last = registry.get_by_name("test:block_65535").expect("registered");
        assert_ne!(registry.family_of(last), registry.family_of(BlockId::AIR));

        let err = registry
            .register("test:one_too_many", None, BlockConfig::solid())
            .expect_err("out of ids");
        assert!(matches!(err, RegistryError::IdsExhausted(name) if name == "test:one_too_many"));
        assert!(registry.family_by_name("test:one_too_many").is_none());
    }

    #[test]
    fn test_families_are_shared() {
        let mut registry = BlockRegistry::new();
        let north = registry
            .register("core:torch_north", Some("core:torch"), BlockConfig::penetrable())
            .expect("registers");
        let south = registry
            .register("core:torch_south", Some("core:torch"), BlockConfig::penetrable())
            .expect("registers");
        assert_eq!(registry.family_of(north), registry.family_of(south));
        assert_eq!(
            registry.family_by_name("core:torch"),
            Some(registry.family_of(north))
        );
    }

    #[test]
    fn test_register_json() {
        let mut registry = BlockRegistry::new();
        registry
            .register_json(
                r#"[
                    {"name": "core:water", "liquid": true, "mass": 1.0},
                    {"name": "core:tall_grass", "penetrable": true, "mass": 0.1}
                ]"#,
            )
            .expect("valid json");
        let water = registry.get_by_name("core:water").expect("water");
        let grass = registry.get_by_name("core:tall_grass").expect("grass");
        assert!(registry.is_liquid(water));
        assert!(registry.is_penetrable(grass));
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn test_register_after_freeze_panics() {
        let mut registry = BlockRegistry::new();
        registry.freeze();
        let _ = registry.register("core:stone", None, BlockConfig::solid());
    }
}
