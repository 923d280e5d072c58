//! Phase-by-phase replay of a single genome
//!
//! Produces `frames.csv` for external animation: one block of rows per
//! snapshot, taken at the start and after every phase of every step.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use physarum_core::{Genome, Phase, Scenario, SimParams, World};

pub const FRAMES_HEADER: &str = "step;phase;kind;x;y;energy";

/// Label of the snapshot taken before the first step
pub const START_PHASE: &str = "start";

/// One entity in one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub step: usize,
    pub phase: &'static str,
    pub kind: &'static str,
    pub x: i32,
    pub y: i32,
    pub energy: f32,
}

fn snapshot_rows(rows: &mut Vec<FrameRow>, step: usize, phase: &'static str, world: &World) {
    let snapshot = world.snapshot();
    let cells = snapshot.cells.iter().map(|&(x, y, e)| ("cell", x, y, e));
    let food = snapshot.food.iter().map(|&(x, y, e)| ("food", x, y, e));
    rows.extend(cells.chain(food).map(|(kind, x, y, energy)| FrameRow {
        step,
        phase,
        kind,
        x,
        y,
        energy,
    }));
}

/// Run `genome` on `scenario` for `steps` steps, recording every phase
pub fn replay(genome: Genome, scenario: &Scenario, params: SimParams, steps: usize) -> Vec<FrameRow> {
    let mut world = World::new(scenario, genome, params, steps);
    let mut rows = Vec::new();
    snapshot_rows(&mut rows, 0, START_PHASE, &world);

    world.run_observed(|step, phase: Phase, world| {
        snapshot_rows(&mut rows, step, phase.name(), world);
    });
    rows
}

/// Write rows as `;`-separated CSV
pub fn write_frames(path: &Path, rows: &[FrameRow]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create frames file {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{FRAMES_HEADER}").context("Failed to write frames header")?;
    for row in rows {
        writeln!(
            out,
            "{};{};{};{};{};{}",
            row.step, row.phase, row.kind, row.x, row.y, row.energy
        )
        .context("Failed to write frame row")?;
    }
    out.flush().context("Failed to flush frames file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use physarum_core::{Action, Cell, Direction, Food};

    fn scenario() -> Scenario {
        Scenario::new(
            vec![Cell::new(IVec2::new(0, 0), 10.0)],
            vec![Food::new(IVec2::new(1, 1), 5.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_replay_records_every_phase() {
        let rows = replay(Genome::inert(), &scenario(), SimParams::default(), 2);

        // start + 2 steps * 3 phases; food survives both steps
        let frames: Vec<(usize, &str)> = rows
            .iter()
            .filter(|r| r.kind == "cell")
            .map(|r| (r.step, r.phase))
            .collect();
        assert_eq!(
            frames,
            vec![
                (0, "start"),
                (0, "growth"),
                (0, "food"),
                (0, "energy"),
                (1, "growth"),
                (1, "food"),
                (1, "energy"),
            ]
        );

        let last = rows.last().unwrap();
        assert_eq!((last.kind, last.energy), ("food", 1.0));
    }

    #[test]
    fn test_replay_shows_growth() {
        let genome = Genome::uniform(Action::new(Direction::Right, Direction::None));
        let rows = replay(genome, &scenario(), SimParams::default(), 1);
        let grown: Vec<&FrameRow> = rows
            .iter()
            .filter(|r| r.phase == "growth" && r.kind == "cell")
            .collect();
        assert_eq!(grown.len(), 2);
        assert_eq!((grown[1].x, grown[1].y), (1, 0));
    }

    #[test]
    fn test_write_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.csv");
        let rows = replay(Genome::inert(), &scenario(), SimParams::default(), 1);
        write_frames(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(FRAMES_HEADER));
        assert_eq!(lines.next(), Some("0;start;cell;0;0;10"));
        assert_eq!(lines.next(), Some("0;start;food;1;1;5"));
        assert_eq!(text.lines().count(), 1 + rows.len());
    }
}
