//! Genetic algorithm for Physarum rule tables
//!
//! This crate provides:
//! - Fitness functions scoring a finished colony, selectable by name
//! - Rank selection, uniform-partition crossover and adaptive point mutation
//! - The generation loop with parallel evaluation and collaborator hooks

pub mod config;
pub mod evolution;
pub mod fitness;
pub mod mutation;
pub mod selection;

pub use config::{ConfigError, EvolutionConfig};
pub use evolution::{Evolution, EvolutionOutcome, GenerationRecord, GenerationSink, NoopSink};
pub use fitness::{FitnessFunction, FitnessKind, FitnessTerm, build_fitness};
pub use mutation::AdaptiveMutation;
pub use selection::{Scored, Selection};
