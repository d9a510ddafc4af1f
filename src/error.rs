use thiserror::Error;

/// Errors raised while generating Latin squares or applying them to an experiment.
///
/// `GenerationShortfall` is informational: the search hands back whatever it found
/// and callers decide how loudly to report it (see `GenerationResult::shortfall`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterbalanceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("found {found} of {target} requested Latin squares within {iterations} iterations")]
    GenerationShortfall {
        found: usize,
        target: usize,
        iterations: usize,
    },

    #[error("block {block}: permutation addresses {expected} trials but the block holds {found}")]
    IndexOutOfRange {
        block: usize,
        expected: usize,
        found: usize,
    },

    #[error("malformed square: {0}")]
    MalformedSquare(String),
}
