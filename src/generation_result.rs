use crate::error::CounterbalanceError;
use crate::latin_square::LatinSquare;

/// Represents the outcome of a Latin square search.
///
/// The search may stop before reaching its target. That is not an error: the squares found
/// are still usable, and `shortfall` reports the gap.
///
/// # Fields
///
/// * `squares` - The accepted squares, in acceptance order
/// * `iterations` - The number of mutation attempts made
/// * `target_count` - The number of squares that was requested
#[derive(Debug, Default, Clone)]
pub struct GenerationResult {
    pub squares: Vec<LatinSquare>,
    pub iterations: usize,
    pub target_count: usize,
}

impl GenerationResult {
    pub fn is_complete(&self) -> bool {
        self.squares.len() >= self.target_count
    }

    pub fn shortfall(&self) -> Option<CounterbalanceError> {
        if self.is_complete() {
            return None;
        }
        Some(CounterbalanceError::GenerationShortfall {
            found: self.squares.len(),
            target: self.target_count,
            iterations: self.iterations,
        })
    }
}
