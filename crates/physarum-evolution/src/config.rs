//! Evolution parameters

use physarum_core::{NUM_DIRS, Scenario, SimParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fitness::FitnessTerm;

/// Rejected evolution parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    EmptyPopulation,
    #[error("at least one generation is required")]
    NoGenerations,
    #[error("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f32 },
    #[error("no fitness terms configured")]
    NoFitnessTerms,
    #[error("fitness term {0} has a non-finite weight")]
    InvalidFitnessWeight(String),
    #[error("action weights must be finite, non-negative and not all zero")]
    InvalidActionWeights,
}

/// Configuration for a genetic algorithm run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Individuals evaluated per generation
    pub population_size: usize,
    /// Number of generations to evolve
    pub generations: usize,
    /// Simulation steps per individual
    pub steps: usize,
    /// Share of the ranked population used as crossover parents
    pub fittest_rate: f32,
    /// Mutation reaches `round(population_size / 2 * mutated_rate)` individuals
    pub mutated_rate: f32,
    /// Genes changed per mutated individual before convergence scaling
    pub base_mutation_count: usize,
    /// Top individuals carried into the next generation unmodified
    pub elite_count: usize,
    /// RNG seed; random when absent
    pub seed: Option<u64>,
    pub fitness: Vec<FitnessTerm>,
    /// Per-direction growth weights for initial genomes
    pub growth_weights: [f32; NUM_DIRS],
    /// Per-direction energy weights for initial genomes
    pub energy_weights: [f32; NUM_DIRS],
    pub params: SimParams,
    pub scenario: Scenario,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 100,
            steps: 200,
            fittest_rate: 0.5,
            mutated_rate: 0.8,
            base_mutation_count: 230,
            elite_count: 2,
            seed: None,
            fitness: FitnessTerm::default_terms(),
            growth_weights: [1.0; NUM_DIRS],
            energy_weights: [1.0; NUM_DIRS],
            params: SimParams::default(),
            scenario: Scenario::default(),
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        for (name, value) in [
            ("fittest_rate", self.fittest_rate),
            ("mutated_rate", self.mutated_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }

        if self.fitness.is_empty() {
            return Err(ConfigError::NoFitnessTerms);
        }
        if let Some(term) = self.fitness.iter().find(|t| !t.weight.is_finite()) {
            return Err(ConfigError::InvalidFitnessWeight(term.kind.to_string()));
        }

        let valid = |weights: &[f32; NUM_DIRS]| {
            weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().any(|w| *w > 0.0)
        };
        if !valid(&self.growth_weights) || !valid(&self.energy_weights) {
            return Err(ConfigError::InvalidActionWeights);
        }
        Ok(())
    }

    /// Parents taken from the top of the ranking, at least one
    pub fn fittest_count(&self) -> usize {
        let count = (self.population_size as f32 * self.fittest_rate).round() as usize;
        count.clamp(1, self.population_size.max(1))
    }

    /// Individuals mutated per mutation pass
    pub fn mutated_count(&self) -> usize {
        ((self.population_size / 2) as f32 * self.mutated_rate).round() as usize
    }
}
