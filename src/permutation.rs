use tracing::debug;

use crate::error::CounterbalanceError;
use crate::experiment::{Block, ExperimentDefinition, ExperimentVersion};
use crate::latin_square::LatinSquare;

/// Expands every row of every square into one experiment version.
///
/// Squares are taken in order, and rows within a square in row order, so the output holds
/// `squares.len() * N` versions. Inputs are not modified; every trial in the output is a copy.
///
/// # Errors
///
/// `CounterbalanceError::IndexOutOfRange` if any non-practice block does not hold exactly as
/// many trials as a permutation row addresses. No versions are returned in that case.
pub fn apply(
    definition: &ExperimentDefinition,
    squares: &[LatinSquare],
) -> Result<Vec<ExperimentVersion>, CounterbalanceError> {
    let mut versions = Vec::with_capacity(squares.iter().map(LatinSquare::order).sum());
    for square in squares {
        for permutation in square.rows() {
            versions.push(apply_permutation(definition, &permutation)?);
        }
    }
    Ok(versions)
}

/// Builds a single version, where output position `k` of each non-practice block receives
/// the trial at input index `permutation[k]` and the id `"{block}_{k + 1}"`.
/// Practice blocks are copied as they are, so their trials carry no `trialID` unless the
/// source already had one.
pub fn apply_permutation(
    definition: &ExperimentDefinition,
    permutation: &[usize],
) -> Result<ExperimentVersion, CounterbalanceError> {
    debug!(?permutation, "applying permutation");
    let blocks = definition
        .blocks()
        .iter()
        .enumerate()
        .map(|(index, block)| permute_block(index, block, permutation))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExperimentVersion::new(blocks))
}

fn permute_block(index: usize, block: &Block, permutation: &[usize]) -> Result<Block, CounterbalanceError> {
    if block.is_practice {
        return Ok(block.clone());
    }

    let out_of_range = CounterbalanceError::IndexOutOfRange {
        block: index,
        expected: permutation.len(),
        found: block.trials.len(),
    };
    // a longer block would otherwise be silently truncated
    if block.trials.len() != permutation.len() {
        return Err(out_of_range);
    }

    let trials = permutation
        .iter()
        .enumerate()
        .map(|(position, &source)| {
            block
                .trials
                .get(source)
                .map(|trial| trial.with_id(format!("{}_{}", index, position + 1)))
                .ok_or_else(|| out_of_range.clone())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(block.with_trials(trials))
}
