use crate::error::{Error, Result};
use crate::population::Population;
use rand::prelude::*;
use rand_distr::weighted::WeightedIndex;

/// Select the agent that initiates this tick's interaction.
///
/// Each agent is chosen with probability proportional to its current attention.
///
/// # Errors
/// Returns [`Error::Arithmetic`] if the total attention is zero or if any
/// attention is negative or not finite.
pub fn select_active<R: Rng + ?Sized>(pop: &Population, rng: &mut R) -> Result<usize> {
    let total = pop.total_attention();
    if total == 0.0 {
        return Err(Error::Arithmetic(
            "total attention is zero, no agent can be selected".into(),
        ));
    }

    let dist = WeightedIndex::new(pop.iter().map(|agt| agt.attention)).map_err(|err| {
        Error::Arithmetic(format!("invalid attention weights (total {total}): {err}"))
    })?;

    Ok(dist.sample(rng))
}
