//! Rank selection

use physarum_core::{Genome, World};

/// A genome with the fitness its world earned
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub genome: Genome,
    pub fitness: f32,
}

impl Scored {
    pub fn new(genome: Genome, fitness: f32) -> Self {
        Self { genome, fitness }
    }

    /// Take the genome out of an evaluated world
    ///
    /// A world that was never scored ranks below every scored one.
    pub fn from_world(world: World) -> Self {
        let fitness = world.fitness().unwrap_or(f32::NEG_INFINITY);
        Self::new(world.into_genome(), fitness)
    }
}

/// Ranked population split into crossover parents and the rest
#[derive(Debug, Clone)]
pub struct Selection {
    /// Highest fitness first
    pub fittest: Vec<Scored>,
    /// Remaining individuals, still in descending order
    pub least_fit: Vec<Scored>,
}

/// Sort by descending fitness; equal scores keep their previous order
pub fn rank(population: &mut [Scored]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// Rank `population` and split off the top `fittest_count`
pub fn select(mut population: Vec<Scored>, fittest_count: usize) -> Selection {
    rank(&mut population);
    let least_fit = population.split_off(fittest_count.min(population.len()));
    Selection {
        fittest: population,
        least_fit,
    }
}

/// Best and mean fitness; `None` for an empty population
pub fn fitness_stats(population: &[Scored]) -> Option<(f32, f32)> {
    let best = population
        .iter()
        .map(|s| s.fitness)
        .max_by(|a, b| a.total_cmp(b))?;
    let average = population.iter().map(|s| s.fitness).sum::<f32>() / population.len() as f32;
    Some((best, average))
}
