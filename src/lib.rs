mod random_type;

pub mod error;
pub mod experiment;
pub mod generation_result;
pub mod generator;
pub mod latin_square;
pub mod permutation;
pub mod storage;

pub use error::CounterbalanceError;
pub use experiment::{Block, ExperimentDefinition, ExperimentVersion, Trial};
pub use generation_result::GenerationResult;
pub use generator::{LatinSquareGenerator, LatinSquareGeneratorBuilder};
pub use latin_square::LatinSquare;
pub use random_type::RandomType;

use anyhow::Error;
use tracing::{info, warn};


/// Generates Latin squares sized to the experiment and expands them into counterbalanced versions.
///
/// # Arguments
///
/// * `definition` - The experiment to counterbalance
/// * `generator` - Builder holding the search settings (`max_iterations`, `target_count`, `random_type`, ...). Its `order` is set from the definition
/// * `on_update` - Callback called after each accepted square with the current iteration number and the number of squares found so far
///
/// # Returns
///
/// Returns a tuple containing:
/// * The generated versions, N per square found
/// * The search result, including any shortfall against the requested square count
///
/// # Errors
///
/// Returns an error if N cannot be determined from the definition, if the generator settings are
/// incomplete, or if a non-practice block's trial count differs from N. A shortfall of squares
/// is logged but is not an error, even when no squares (and so no versions) were produced.
pub fn counterbalance<F>(definition: &ExperimentDefinition, generator: &mut LatinSquareGeneratorBuilder, on_update: F) -> Result<(Vec<ExperimentVersion>, GenerationResult), Error>
    where
        F: FnMut(usize, usize),
{
    let n = definition.trial_count()?;
    let generator = generator.order(n).build()?;
    let result = generator.generate_with(on_update)?;

    if let Some(shortfall) = result.shortfall() {
        warn!("{}", shortfall);
    }

    let versions = permutation::apply(definition, &result.squares)?;
    if versions.is_empty() {
        warn!("no experiment versions were generated");
    } else {
        info!(versions = versions.len(), squares = result.squares.len(), "generated experiment versions");
    }
    Ok((versions, result))
}

/// Expands the cyclic square of order N into exactly N versions, skipping the search.
pub fn counterbalance_cyclic(definition: &ExperimentDefinition) -> Result<Vec<ExperimentVersion>, CounterbalanceError> {
    let n = definition.trial_count()?;
    let versions = permutation::apply(definition, &[LatinSquare::cyclic(n)])?;
    info!(versions = versions.len(), "generated cyclic experiment versions");
    Ok(versions)
}
