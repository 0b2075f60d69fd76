use serde::Deserialize;

use crate::RegistryError;

/// Declarative reaction, as found in content files.
///
/// Blocks are referenced by name and resolved when the
/// [`ReactionTable`](super::ReactionTable) is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDefinition {
    /// The flowing liquid.
    pub liquid: String,
    /// The block being flowed into. Its family keys the reaction.
    pub block: String,
    /// Block left behind, or `None` if the block is simply destroyed.
    #[serde(default)]
    pub product: Option<String>,
    /// Whole blocks of `liquid` needed, on average, per reaction.
    #[serde(default = "one")]
    pub liquid_required: f32,
    /// Whole blocks of `block` needed per reaction when it is itself a liquid.
    #[serde(default = "one")]
    pub other_liquid_required: f32,
    /// Whether `block` flowing into `liquid` reacts the same way.
    #[serde(default)]
    pub reversible: bool,
}

fn one() -> f32 {
    1.0
}

impl ReactionDefinition {
    /// A plain destroy reaction with default thresholds.
    #[must_use]
    pub fn destroys(liquid: &str, block: &str) -> Self {
        Self {
            liquid: liquid.to_owned(),
            block: block.to_owned(),
            product: None,
            liquid_required: 1.0,
            other_liquid_required: 1.0,
            reversible: false,
        }
    }

    /// Parses a JSON array of definitions.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }
}
