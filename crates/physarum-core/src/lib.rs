//! Cellular automaton engine for Physarum colonies
//!
//! This crate implements:
//! - The state/action codec that turns a cell's local observation into a rule index
//! - Rule-table genomes (random construction, crossover and mutation with `evolution`)
//! - Validated starting scenarios (cells + food layouts)
//! - The synchronous three-phase world update (growth, food, energy transfer)

pub mod codec;
pub mod genome;
pub mod params;
pub mod scenario;
pub mod world;

// Re-export main types for convenience
pub use codec::{Action, Direction, NUM_ACTIONS, NUM_DIRS, NUM_STATES, Observation};
pub use genome::{Genome, GenomeError};
pub use params::SimParams;
pub use scenario::{Scenario, ScenarioError, ScenarioLayout};
pub use world::{Cell, Food, Phase, World, WorldSnapshot};
