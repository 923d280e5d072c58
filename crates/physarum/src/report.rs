//! Run summary written when evolution finishes

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use physarum_evolution::{EvolutionConfig, EvolutionOutcome, GenerationRecord};
use serde::{Deserialize, Serialize};

/// Contents of `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub config: EvolutionConfig,
    pub generations: usize,
    pub best_fitness: f32,
    /// Action codes of the best genome, indexed by state
    pub best_genome: Vec<u8>,
    pub history: Vec<GenerationRecord>,
}

impl RunSummary {
    pub fn new(started_at: String, config: &EvolutionConfig, outcome: &EvolutionOutcome) -> Self {
        Self {
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            config: config.clone(),
            generations: outcome.history.len(),
            best_fitness: outcome.best_fitness,
            best_genome: outcome.best_genome.rules().to_vec(),
            history: outcome.history.clone(),
        }
    }
}

/// Writes the summary of a finished run
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Write `summary.json` and return its path
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).context("Failed to create output directory")?;

        let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        let path = self.output_dir.join("summary.json");
        fs::write(&path, json).context("Failed to write summary JSON")?;

        log::info!("Summary written: {}", path.display());
        Ok(path)
    }
}
