//! Probabilistic resolution of reaction entries.
//!
//! Amounts are compared as fractions of a full block: a rate-2 inflow meeting
//! a reaction that needs one whole block has sufficiency `2/16`.

use rand::Rng;
use rill_registry::Reaction;

use super::MAX_HEIGHT;

/// What a product reaction did to the cell and its inflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProductOutcome {
    /// Both sides reacted: the cell becomes the product. The inflow is
    /// stopped if `consume_inflow`.
    Transform { consume_inflow: bool },
    /// Only the inflow reacted: the inflow stops and the cell is emptied.
    Drain,
    /// Only this side reacted: the inflow is absorbed without a trace.
    Absorb,
    /// Neither side can ever react; the inflow is blocked.
    Inert,
}

/// Fraction of the required amount present. Unbounded when nothing is
/// required.
pub(crate) fn sufficiency(amount: u8, required: f32) -> f32 {
    if required <= 0.0 {
        return f32::INFINITY;
    }
    (f32::from(amount) / f32::from(MAX_HEIGHT)) / required
}

/// Chance that a reaction stops the inflow feeding it: `min(1, 1/sufficiency)`.
pub(crate) fn consume_chance(sufficiency: f32) -> f64 {
    if sufficiency <= 0.0 {
        1.0
    } else {
        f64::from((1.0 / sufficiency).min(1.0))
    }
}

fn chance(sufficiency: f32) -> f64 {
    f64::from(sufficiency.clamp(0.0, 1.0))
}

/// Returns `true` if a no-product reaction also swallows the inflow.
pub(crate) fn consumes_inflow<R: Rng + ?Sized>(
    rng: &mut R,
    reaction: &Reaction,
    inflow_rate: u8,
) -> bool {
    let other = sufficiency(inflow_rate, reaction.liquid_required);
    rng.random_bool(consume_chance(other))
}

/// Resolves a reaction with a product by rejection sampling two Bernoulli
/// draws until at least one succeeds.
///
/// `this_height` is the height of the displaced liquid, `None` if the cell is
/// not a liquid. After `max_draws` failed rounds the outcome is
/// [`ProductOutcome::Absorb`].
pub(crate) fn resolve_product<R: Rng + ?Sized>(
    rng: &mut R,
    reaction: &Reaction,
    inflow_rate: u8,
    this_height: Option<u8>,
    max_draws: u32,
) -> ProductOutcome {
    let other = sufficiency(inflow_rate, reaction.liquid_required);
    let this = this_height.map_or(1.0, |height| {
        sufficiency(height, reaction.other_liquid_required)
    });
    if other <= 0.0 && this <= 0.0 {
        return ProductOutcome::Inert;
    }

    let (other_chance, this_chance) = (chance(other), chance(this));
    for _ in 0..max_draws {
        let other_reacts = rng.random_bool(other_chance);
        let this_reacts = rng.random_bool(this_chance);
        match (other_reacts, this_reacts) {
            (true, true) => {
                return ProductOutcome::Transform {
                    consume_inflow: rng.random_bool(consume_chance(other)),
                };
            }
            (true, false) => return ProductOutcome::Drain,
            (false, true) => return ProductOutcome::Absorb,
            (false, false) => {}
        }
    }
    ProductOutcome::Absorb
}
