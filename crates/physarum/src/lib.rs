//! # Physarum - evolving slime mould colonies
//!
//! Command-line front end around the simulation and genetic algorithm crates:
//! layered configuration, persistence of genomes and run history, the final
//! run summary, and phase-by-phase replays for external animation.

pub mod config;
pub mod persistence;
pub mod recorder;
pub mod replay;
pub mod report;

pub use config::{AppConfig, OutputConfig, ScatterConfig, ScenarioPreset};
pub use recorder::RunRecorder;
