//! Persists evolution results at generation boundaries

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use physarum_core::Genome;
use physarum_evolution::{EvolutionConfig, EvolutionOutcome, GenerationRecord, GenerationSink};

use crate::config::OutputConfig;
use crate::persistence::{HistoryWriter, save_checkpoint, save_genome};
use crate::report::{ReportGenerator, RunSummary};

/// File names inside the output directory
pub const BEST_GENOME_FILE: &str = "best_genome.ron";
pub const HISTORY_FILE: &str = "fitness_history.csv";
pub const CHECKPOINT_DIR: &str = "checkpoints";

/// Writes the best genome, history rows, checkpoints and the final summary
pub struct RunRecorder {
    output_dir: PathBuf,
    checkpoint_interval: usize,
    history: HistoryWriter,
    config: EvolutionConfig,
    started_at: String,
    progress: Option<ProgressBar>,
}

impl RunRecorder {
    /// Prepare the output directory and start a fresh history file
    pub fn new(output: &OutputConfig, config: &EvolutionConfig) -> Result<Self> {
        fs::create_dir_all(&output.dir).context("Failed to create output directory")?;
        let history = HistoryWriter::create(&output.dir.join(HISTORY_FILE))?;

        Ok(Self {
            output_dir: output.dir.clone(),
            checkpoint_interval: output.checkpoint_interval,
            history,
            config: config.clone(),
            started_at: chrono::Utc::now().to_rfc3339(),
            progress: None,
        })
    }

    /// Show a progress bar over the configured generations
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new(self.config.generations as u64);
        pb.set_style(Self::progress_style());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.println(format!(
            "Starting evolution: {} generations, {} individuals, {} steps each",
            self.config.generations, self.config.population_size, self.config.steps
        ));
        self.progress = Some(pb);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn progress_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("progress template is valid")
            .progress_chars("=>-")
    }

    fn println(&self, message: String) {
        match &self.progress {
            Some(pb) => pb.println(message),
            None => log::info!("{message}"),
        }
    }
}

impl GenerationSink for RunRecorder {
    fn on_generation(&mut self, record: &GenerationRecord, best: &Genome) -> Result<()> {
        save_genome(&self.output_dir.join(BEST_GENOME_FILE), best)?;
        self.history.append(record)?;

        if self.checkpoint_interval > 0 && record.generation % self.checkpoint_interval == 0 {
            let path = save_checkpoint(
                &self.output_dir.join(CHECKPOINT_DIR),
                record.generation,
                best,
            )?;
            self.println(format!(
                "Saved checkpoint at generation {}: {}",
                record.generation,
                path.display()
            ));
        }

        self.println(format!(
            "Generation {}: best {:.2}, average {:.2}, mutation count {}",
            record.generation,
            record.best_fitness,
            record.average_fitness,
            record.adjusted_mutation_count
        ));
        if let Some(pb) = &self.progress {
            pb.set_message(format!("best {:.2}", record.best_fitness));
            pb.inc(1);
        }
        Ok(())
    }

    fn on_finish(&mut self, outcome: &EvolutionOutcome) -> Result<()> {
        let summary = RunSummary::new(self.started_at.clone(), &self.config, outcome);
        ReportGenerator::new(&self.output_dir).write_summary(&summary)?;

        if let Some(pb) = self.progress.take() {
            pb.finish_with_message(format!("Evolution complete, best {:.2}", outcome.best_fitness));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{load_checkpoint, load_genome, read_history};

    fn record(generation: usize, best: f32) -> GenerationRecord {
        GenerationRecord {
            generation,
            best_fitness: best,
            average_fitness: best / 2.0,
            adjusted_mutation_count: 100,
        }
    }

    #[test]
    fn test_recorder_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            dir: dir.path().join("run"),
            checkpoint_interval: 2,
        };
        let config = EvolutionConfig::default();
        let mut recorder = RunRecorder::new(&output, &config).unwrap();

        let genome = Genome::inert();
        let records: Vec<_> = (0..3).map(|g| record(g, g as f32)).collect();
        for record in &records {
            recorder.on_generation(record, &genome).unwrap();
        }
        recorder
            .on_finish(&EvolutionOutcome {
                best_genome: genome.clone(),
                best_fitness: 2.0,
                history: records.clone(),
            })
            .unwrap();

        let run = output.dir;
        assert_eq!(load_genome(&run.join(BEST_GENOME_FILE)).unwrap(), genome);
        assert_eq!(read_history(&run.join(HISTORY_FILE)).unwrap(), records);

        let checkpoints = run.join(CHECKPOINT_DIR);
        assert!(load_checkpoint(&checkpoints.join("gen_0000_best.genome")).is_ok());
        assert!(!checkpoints.join("gen_0001_best.genome").exists());
        assert!(checkpoints.join("gen_0002_best.genome").exists());
        assert!(run.join("summary.json").exists());
    }

    #[test]
    fn test_checkpoints_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            dir: dir.path().to_path_buf(),
            checkpoint_interval: 0,
        };
        let mut recorder = RunRecorder::new(&output, &EvolutionConfig::default()).unwrap();
        recorder.on_generation(&record(0, 1.0), &Genome::inert()).unwrap();
        assert!(!dir.path().join(CHECKPOINT_DIR).exists());
    }
}
