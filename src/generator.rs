/**
 * generator.rs - Randomised search for Latin squares
 * Starts from the cyclic square and walks by swapping whole rows or columns,
 * re-checking the Latin property of every candidate before accepting it.
 */

use derive_builder::Builder;
use rand::seq::index::sample;
use rand::Rng;
use tracing::{debug, info};

use crate::error::CounterbalanceError;
use crate::generation_result::GenerationResult;
use crate::latin_square::LatinSquare;
use crate::random_type::RandomType;

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(error = "anyhow::Error"))]
pub struct LatinSquareGenerator {

    /* order is N, the number of trials in each non-practice block */
    order: usize,

    /* max_iterations bounds the number of mutation attempts */
    #[builder(default = "1000")]
    max_iterations: usize,

    /* target_count is the number of squares to collect before stopping */
    #[builder(default = "1")]
    target_count: usize,

    #[builder(default = "RandomType::Uniform")]
    random_type: RandomType, // random_type is the source of randomness for mutations

    /* when set, a square equal to one already collected is walked through but not collected again */
    #[builder(default = "false")]
    distinct: bool,
}

impl LatinSquareGeneratorBuilder {

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.random_type = Some(RandomType::Seeded(seed));
        self
    }
}

impl LatinSquareGenerator {

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn generate(&self) -> Result<GenerationResult, CounterbalanceError> {
        self.generate_with(|_, _| {})
    }

    /// Runs the search, calling `on_update(iteration, squares_found)` after every accepted square.
    ///
    /// # Errors
    ///
    /// Returns `CounterbalanceError::Configuration` if the order is zero. Running out of
    /// iterations is not an error; see [`GenerationResult::shortfall`].
    pub fn generate_with<F>(&self, mut on_update: F) -> Result<GenerationResult, CounterbalanceError>
        where
            F: FnMut(usize, usize),
    {
        if self.order == 0 {
            return Err(CounterbalanceError::Configuration(
                "Latin square order must be at least 1".to_string(),
            ));
        }

        let mut rng = self.random_type.rng();
        let mut current = LatinSquare::cyclic(self.order);
        let mut squares: Vec<LatinSquare> = Vec::with_capacity(self.target_count.min(self.max_iterations));
        let mut iterations = 0;

        while squares.len() < self.target_count && iterations < self.max_iterations {
            iterations += 1;
            let candidate = mutate(&current, &mut rng);
            if !candidate.is_valid() {
                debug!(iteration = iterations, "rejected candidate square");
                continue;
            }

            if self.distinct && squares.contains(&candidate) {
                debug!(iteration = iterations, "candidate repeats a collected square");
                current = candidate;
                continue;
            }

            squares.push(candidate.clone());
            current = candidate;
            debug!(iteration = iterations, found = squares.len(), "accepted square");
            on_update(iterations, squares.len());
        }

        info!(
            order = self.order,
            found = squares.len(),
            target = self.target_count,
            iterations,
            "Latin square search finished"
        );

        Ok(GenerationResult {
            squares,
            iterations,
            target_count: self.target_count,
        })
    }
}

/// Returns a neighbour of `square`: with equal probability two distinct rows or two distinct
/// columns are swapped. The result is not guaranteed to be valid.
///
/// A dimension with fewer than two lines has nothing to swap and the copy is returned as is.
pub fn mutate<R: Rng + ?Sized>(square: &LatinSquare, rng: &mut R) -> LatinSquare {
    let mut candidate = square.clone();
    let swap_rows = rng.gen_bool(0.5);
    let len = if swap_rows { candidate.order() } else { candidate.ncols() };
    if len < 2 {
        return candidate;
    }

    let picked = sample(rng, len, 2);
    let (a, b) = (picked.index(0), picked.index(1));
    if swap_rows {
        candidate.swap_rows(a, b);
    } else {
        candidate.swap_columns(a, b);
    }
    candidate
}
