//! Convergence-aware point mutation
//!
//! When the average fitness of a generation approaches its best, the
//! population has converged and crossover children receive close to the full
//! base mutation count. A diverse population mutates its children less.

use physarum_core::Genome;
use rand::Rng;

/// Ratio `average / best` clamped to `[0, 1]`
///
/// A non-positive or non-finite best fitness gives 1, which leaves the base
/// count untouched.
pub fn similarity_punishment(average: f32, best: f32) -> f32 {
    if !best.is_finite() || best <= 0.0 || !average.is_finite() {
        return 1.0;
    }
    (average / best).clamp(0.0, 1.0)
}

/// Scales the base mutation count by population convergence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveMutation {
    pub base_count: usize,
}

impl AdaptiveMutation {
    pub fn new(base_count: usize) -> Self {
        Self { base_count }
    }

    /// `round(base_count * similarity_punishment(average, best))`
    pub fn adjusted_count(&self, average: f32, best: f32) -> usize {
        (self.base_count as f32 * similarity_punishment(average, best)).round() as usize
    }
}

/// Mutate `genes` rules in each of `individuals` randomly chosen genomes
///
/// Both counts are clamped to what is available. Returns the indices of the
/// genomes that were mutated.
pub fn mutate_population<R: Rng + ?Sized>(
    genomes: &mut [Genome],
    individuals: usize,
    genes: usize,
    rng: &mut R,
) -> Vec<usize> {
    let individuals = individuals.min(genomes.len());
    let targets = rand::seq::index::sample(rng, genomes.len(), individuals).into_vec();
    for &index in &targets {
        genomes[index].mutate(rng, genes);
    }
    targets
}
