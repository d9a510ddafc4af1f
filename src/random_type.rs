use rand::rngs::StdRng;
use rand::SeedableRng;

/// Source of randomness for the square search. `Seeded` makes a run repeatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomType {
    Uniform,
    Seeded(u64)
}

impl RandomType {
    pub fn rng(&self) -> StdRng {
        match self {
            RandomType::Uniform => StdRng::from_entropy(),
            RandomType::Seeded(seed) => StdRng::seed_from_u64(*seed)
        }
    }
}
