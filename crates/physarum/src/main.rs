use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use physarum::persistence::load_genome;
use physarum::replay::{replay, write_frames};
use physarum::{AppConfig, RunRecorder, ScenarioPreset};
use physarum_evolution::{Evolution, FitnessTerm};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (RON); defaults to ./physarum.ron when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations to evolve
    #[arg(long)]
    generations: Option<usize>,

    /// Population size per generation
    #[arg(long)]
    population: Option<usize>,

    /// Simulation steps per individual
    #[arg(long)]
    steps: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Built-in starting layout, replacing the configured scenario
    #[arg(long, value_enum)]
    scenario: Option<ScenarioPreset>,

    /// Fitness terms, e.g. "total_energy,cell_count:-1,area"
    #[arg(long)]
    fitness: Option<String>,

    /// Output directory for genomes, history and reports
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save a checkpoint every N generations (0 disables)
    #[arg(long)]
    checkpoint_interval: Option<usize>,

    /// Start the population from a saved genome
    #[arg(long)]
    seed_genome: Option<PathBuf>,

    /// Replay a saved genome and write frames.csv instead of evolving
    #[arg(long, conflicts_with = "seed_genome")]
    replay: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

impl Args {
    /// Command-line flags take priority over every loaded layer
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        let evolution = &mut config.evolution;
        if let Some(generations) = self.generations {
            evolution.generations = generations;
        }
        if let Some(population) = self.population {
            evolution.population_size = population;
        }
        if let Some(steps) = self.steps {
            evolution.steps = steps;
        }
        if let Some(seed) = self.seed {
            evolution.seed = Some(seed);
        }
        if let Some(fitness) = &self.fitness {
            evolution.fitness =
                FitnessTerm::parse_list(fitness).context("Invalid --fitness expression")?;
        }
        if let Some(preset) = self.scenario {
            config.preset = Some(preset);
        }
        // Re-resolve so a scattered layout follows the final seed
        config.resolve_scenario();
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if let Some(interval) = self.checkpoint_interval {
            config.output.checkpoint_interval = interval;
        }
        config
            .evolution
            .validate()
            .context("Invalid evolution configuration")
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    if let Some(path) = &args.replay {
        return run_replay(path, &config);
    }
    run_evolution(&args, config)
}

fn run_evolution(args: &Args, config: AppConfig) -> Result<()> {
    let evolution_config = config.evolution.clone();
    let mut evolution = match &args.seed_genome {
        Some(path) => {
            let genome = load_genome(path).context("Failed to load seed genome")?;
            log::info!("Seeding population from {}", path.display());
            Evolution::with_seed_genome(evolution_config, genome)?
        }
        None => Evolution::new(evolution_config)?,
    };

    let mut recorder = RunRecorder::new(&config.output, &config.evolution)?;
    if !args.quiet {
        recorder = recorder.with_progress();
    }

    let outcome = evolution.run(&mut recorder)?;
    log::info!(
        "Best fitness {:.2}; results in {}",
        outcome.best_fitness,
        recorder.output_dir().display()
    );
    Ok(())
}

fn run_replay(path: &std::path::Path, config: &AppConfig) -> Result<()> {
    let genome = load_genome(path).context("Failed to load replay genome")?;
    let evolution = &config.evolution;
    let rows = replay(genome, &evolution.scenario, evolution.params, evolution.steps);

    std::fs::create_dir_all(&config.output.dir).context("Failed to create output directory")?;
    let frames = config.output.dir.join("frames.csv");
    write_frames(&frames, &rows)?;
    log::info!("Wrote {} frame rows to {}", rows.len(), frames.display());
    Ok(())
}
