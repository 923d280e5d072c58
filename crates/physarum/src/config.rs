//! Application configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `physarum.ron` in the working directory, or the file given with `--config`
//! 3. Environment variables prefixed with `PHYSARUM_`
//! 4. Command-line flags (applied by the binary)
//!
//! Example environment variable: `PHYSARUM_EVOLUTION__POPULATION_SIZE=50`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use physarum_core::Scenario;
use physarum_evolution::EvolutionConfig;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Top-level configuration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Replaces `evolution.scenario` with a built-in layout when set
    #[serde(default)]
    pub preset: Option<ScenarioPreset>,

    /// Layout parameters for [`ScenarioPreset::Scattered`]
    #[serde(default)]
    pub scatter: ScatterConfig,
}

/// Built-in starting layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPreset {
    /// One cell surrounded by five food sources
    Colony,
    /// One cell with a single distant food source
    SingleFood,
    /// One cell at the origin with randomly scattered food
    Scattered,
}

/// Parameters of the scattered food layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub count: usize,
    pub food_energy: f32,
    /// Smallest per-axis offset from the starting cell
    pub min_dist: i32,
    /// Largest per-axis offset from the starting cell
    pub max_dist: i32,
    /// Layout seed; falls back to the evolution seed, then to a random one
    pub seed: Option<u64>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            count: 20,
            food_energy: 80.0,
            min_dist: 3,
            max_dist: 25,
            seed: None,
        }
    }
}

impl ScenarioPreset {
    pub fn build(self, scatter: &ScatterConfig, fallback_seed: Option<u64>) -> Scenario {
        match self {
            ScenarioPreset::Colony => Scenario::colony(),
            ScenarioPreset::SingleFood => Scenario::single_food(),
            ScenarioPreset::Scattered => {
                let seed = scatter
                    .seed
                    .or(fallback_seed)
                    .unwrap_or_else(rand::random);
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                Scenario::scattered(
                    &mut rng,
                    scatter.count,
                    scatter.food_energy,
                    scatter.min_dist,
                    scatter.max_dist,
                )
            }
        }
    }
}

/// Where and how often results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving genomes, history, checkpoints and the summary
    pub dir: PathBuf,
    /// Save a bincode checkpoint every N generations (0 disables)
    pub checkpoint_interval: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("physarum_output"),
            checkpoint_interval: 10,
        }
    }
}

impl AppConfig {
    /// Load defaults, the config file and `PHYSARUM_` environment variables
    ///
    /// Without `file`, an optional `physarum.ron` in the working directory is
    /// used. An explicitly named file must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, Self::environment())
    }

    /// Install the selected preset as the evolution scenario
    pub fn resolve_scenario(&mut self) {
        if let Some(preset) = self.preset {
            log::info!("Using {preset:?} scenario preset");
            self.evolution.scenario = preset.build(&self.scatter, self.evolution.seed);
        }
    }

    fn environment() -> Environment {
        Environment::with_prefix("PHYSARUM")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with_env(file: Option<&Path>, env: Environment) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("physarum")
                .format(FileFormat::Ron)
                .required(false),
        };

        // Compiled defaults come from the serde defaults of every section
        let config = Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        let mut app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.resolve_scenario();
        app.evolution
            .validate()
            .context("Invalid evolution configuration")?;
        Ok(app)
    }
}
