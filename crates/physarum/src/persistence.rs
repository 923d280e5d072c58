//! Genome files, bincode checkpoints and the fitness history log

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use physarum_core::Genome;
use physarum_evolution::GenerationRecord;

/// Header row of the fitness history file
pub const HISTORY_HEADER: &str = "generation;best;average;adjusted_mutation_count";

/// Write a genome as a RON list of action codes
pub fn save_genome(path: &Path, genome: &Genome) -> Result<()> {
    let text = ron::to_string(genome).context("Failed to serialize genome")?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write genome file {}", path.display()))
}

/// Read and validate a RON genome
pub fn load_genome(path: &Path) -> Result<Genome> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read genome file {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("Invalid genome in {}", path.display()))
}

/// Path of the checkpoint for `generation` inside `dir`
pub fn checkpoint_path(dir: &Path, generation: usize) -> PathBuf {
    dir.join(format!("gen_{generation:04}_best.genome"))
}

/// Save the generation's best genome as bincode, creating `dir` if needed
pub fn save_checkpoint(dir: &Path, generation: usize, genome: &Genome) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create checkpoint directory")?;
    let path = checkpoint_path(dir, generation);
    let data = bincode_next::serde::encode_to_vec(genome, bincode_next::config::standard())
        .context("Failed to serialize genome")?;
    fs::write(&path, data).context("Failed to write checkpoint file")?;
    Ok(path)
}

pub fn load_checkpoint(path: &Path) -> Result<Genome> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
    let (genome, _) =
        bincode_next::serde::decode_from_slice(&data, bincode_next::config::standard())
            .with_context(|| format!("Invalid checkpoint {}", path.display()))?;
    Ok(genome)
}

/// Appends one `;`-separated row per generation
pub struct HistoryWriter {
    out: BufWriter<File>,
}

impl HistoryWriter {
    /// Create (or truncate) the history file and write its header
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create history file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{HISTORY_HEADER}").context("Failed to write history header")?;
        Ok(Self { out })
    }

    /// Append a record and flush, so the file is complete after every generation
    pub fn append(&mut self, record: &GenerationRecord) -> Result<()> {
        writeln!(
            self.out,
            "{};{};{};{}",
            record.generation,
            record.best_fitness,
            record.average_fitness,
            record.adjusted_mutation_count
        )
        .context("Failed to append history row")?;
        self.out.flush().context("Failed to flush history file")
    }
}

/// Parse a history file written by [`HistoryWriter`]
pub fn read_history(path: &Path) -> Result<Vec<GenerationRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;

    text.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(row, line)| {
            let fields: Vec<&str> = line.split(';').collect();
            let [generation, best, average, adjusted] = fields[..] else {
                anyhow::bail!("History row {} has {} fields", row + 1, fields.len());
            };
            Ok(GenerationRecord {
                generation: generation.parse().context("Invalid generation")?,
                best_fitness: best.parse().context("Invalid best fitness")?,
                average_fitness: average.parse().context("Invalid average fitness")?,
                adjusted_mutation_count: adjusted
                    .parse()
                    .context("Invalid adjusted mutation count")?,
            })
        })
        .collect()
}
