//! Colony world - synchronous three-phase update
//!
//! Every phase reads an immutable view of the world as it was when the phase
//! started and writes into a fresh output buffer, so the outcome does not depend
//! on the order cells are visited. The one exception is growth-target
//! arbitration: when two cells grow into the same empty position, the cell that
//! comes first in the (stable, insertion-ordered) cell list wins.
//!
//! Occupancy queries go through a position index instead of scanning the cell
//! list.

use ahash::{AHashMap, AHashSet};
use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::codec::{Action, Direction, Observation};
use crate::genome::Genome;
use crate::params::SimParams;
use crate::scenario::Scenario;

/// A living grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub position: IVec2,
    pub energy: f32,
    /// Direction this cell last pushed energy toward
    #[serde(default)]
    pub energy_dir: Direction,
}

impl Cell {
    pub fn new(position: IVec2, energy: f32) -> Self {
        Self {
            position,
            energy,
            energy_dir: Direction::None,
        }
    }
}

/// A stationary food source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub position: IVec2,
    pub energy: f32,
}

impl Food {
    pub fn new(position: IVec2, energy: f32) -> Self {
        Self { position, energy }
    }
}

/// One sub-step of a simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Growth,
    Food,
    Energy,
}

impl Phase {
    /// Order in which phases run within one step
    pub const ORDER: [Phase; 3] = [Phase::Growth, Phase::Food, Phase::Energy];

    pub fn name(self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Food => "food",
            Self::Energy => "energy",
        }
    }
}

/// Read-only view of the world for renderers: `(x, y, energy)` triples
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub cells: Vec<(i32, i32, f32)>,
    pub food: Vec<(i32, i32, f32)>,
}

/// A colony driven by one genome on one scenario
#[derive(Debug, Clone)]
pub struct World {
    /// Cells in creation order (this order arbitrates growth collisions)
    cells: Vec<Cell>,
    /// Position -> index into `cells`
    cell_index: AHashMap<IVec2, usize>,
    food: Vec<Food>,
    /// Positions holding food (growth may not enter them)
    food_positions: AHashSet<IVec2>,
    genome: Genome,
    params: SimParams,
    /// Configured run length
    steps: usize,
    /// Steps completed so far
    step: usize,
    /// Food energy present at construction
    initial_food_energy: f32,
    /// Score assigned after a completed run
    fitness: Option<f32>,
}

impl World {
    /// Fresh world at the scenario's starting state
    pub fn new(scenario: &Scenario, genome: Genome, params: SimParams, steps: usize) -> Self {
        let cells = scenario.cells().to_vec();
        let food = scenario.food().to_vec();
        let cell_index = index_cells(&cells);
        let food_positions = food.iter().map(|f| f.position).collect();

        Self {
            cells,
            cell_index,
            food,
            food_positions,
            genome,
            params,
            steps,
            step: 0,
            initial_food_energy: scenario.total_food_energy(),
            fitness: None,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn food(&self) -> &[Food] {
        &self.food
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Give up the world, keeping its genome for the next generation
    pub fn into_genome(self) -> Genome {
        self.genome
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Configured number of steps for [`World::run`]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of steps completed
    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.steps
    }

    pub fn initial_food_energy(&self) -> f32 {
        self.initial_food_energy
    }

    /// Fitness assigned by the optimizer, `None` before evaluation
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    pub fn cell_at(&self, position: IVec2) -> Option<&Cell> {
        self.cell_index.get(&position).map(|&i| &self.cells[i])
    }

    pub fn has_food_at(&self, position: IVec2) -> bool {
        self.food_positions.contains(&position)
    }

    pub fn total_cell_energy(&self) -> f32 {
        self.cells.iter().map(|c| c.energy).sum()
    }

    pub fn total_food_energy(&self) -> f32 {
        self.food.iter().map(|f| f.energy).sum()
    }

    /// What `cell` currently sees of its four neighbor slots
    pub fn observe(&self, cell: &Cell) -> Observation {
        let mut observation = Observation::default();
        for (slot, dir) in Direction::NEIGHBORS.into_iter().enumerate() {
            if let Some(neighbor) = self.cell_at(cell.position + dir.offset()) {
                observation.neighbors[slot] = true;
                // The neighbor on our left sends energy to us by pushing right
                observation.incoming[slot] = neighbor.energy_dir == dir.opposite();
            }
        }
        observation
    }

    /// The genome's decision for `cell` in the current state
    pub fn decide(&self, cell: &Cell) -> Action {
        self.genome.action(self.observe(cell).encode())
    }

    /// Growth phase: cells with enough energy split into the chosen direction
    ///
    /// A split needs the target free of cells (including cells grown earlier in
    /// this phase) and free of food. Parent and child each keep half the energy.
    pub fn grow(&mut self) {
        let threshold = self.params.growth_threshold();
        let mut next = self.cells.clone();
        let mut next_index = self.cell_index.clone();

        for (i, cell) in self.cells.iter().enumerate() {
            if cell.energy < threshold {
                continue;
            }
            let growth = self.decide(cell).growth;
            if growth == Direction::None {
                continue;
            }

            let target = cell.position + growth.offset();
            if next_index.contains_key(&target) || self.food_positions.contains(&target) {
                continue;
            }

            let half = cell.energy / 2.0;
            next[i].energy = half;
            next_index.insert(target, next.len());
            next.push(Cell::new(target, half));
        }

        log::trace!(
            "step {}: growth {} -> {} cells",
            self.step,
            self.cells.len(),
            next.len()
        );
        self.cells = next;
        self.cell_index = next_index;
    }

    /// Food phase: each food item feeds the first cell within one tile
    ///
    /// The food loses up to `transferable_food_energy` and disappears once
    /// empty; the cell gains `min(max_energy_portion, its own energy)`. A cell
    /// next to several food items is fed by each of them.
    pub fn consume_food(&mut self) {
        let transfer = self.params.transferable_food_energy;
        let cap = self.params.max_energy_portion;
        let mut next_cells = self.cells.clone();
        let mut next_food = Vec::with_capacity(self.food.len());

        for food in &self.food {
            let mut food = *food;
            if let Some(j) = self.first_cell_near(food.position) {
                food.energy -= transfer.min(food.energy);
                next_cells[j].energy += cap.min(self.cells[j].energy);
                if food.energy <= 0.0 {
                    log::trace!("step {}: food at {} exhausted", self.step, food.position);
                    continue;
                }
            }
            next_food.push(food);
        }

        self.cells = next_cells;
        if next_food.len() != self.food.len() {
            self.food_positions = next_food.iter().map(|f| f.position).collect();
        }
        self.food = next_food;
    }

    /// Energy phase: cells pass a share of their energy to an existing neighbor
    ///
    /// The source keeps at least `min_energy`; the target must be a cell that
    /// existed when the phase began. A successful transfer records its direction
    /// on the source, which neighbors observe afterwards.
    pub fn transfer_energy(&mut self) {
        let min_energy = self.params.min_energy;
        let portion = self.params.max_energy_portion;
        let mut next = self.cells.clone();

        for (i, cell) in self.cells.iter().enumerate() {
            let transferable = cell.energy / portion;
            if cell.energy - transferable < min_energy {
                continue;
            }
            let dir = self.decide(cell).energy;
            if dir == Direction::None {
                continue;
            }

            if let Some(&j) = self.cell_index.get(&(cell.position + dir.offset())) {
                next[i].energy -= transferable;
                next[i].energy_dir = dir;
                next[j].energy += transferable;
            }
        }

        self.cells = next;
    }

    /// Run a single phase
    pub fn apply(&mut self, phase: Phase) {
        match phase {
            Phase::Growth => self.grow(),
            Phase::Food => self.consume_food(),
            Phase::Energy => self.transfer_energy(),
        }
    }

    /// One full step: growth, food, energy transfer
    pub fn step(&mut self) {
        for phase in Phase::ORDER {
            self.apply(phase);
        }
        self.step += 1;
    }

    /// Advance `steps` more steps regardless of the configured run length
    pub fn run_steps(&mut self, steps: usize) -> &Self {
        for _ in 0..steps {
            self.step();
        }
        self
    }

    /// Run the remaining configured steps and return the final state
    pub fn run(&mut self) -> &Self {
        let remaining = self.steps.saturating_sub(self.step);
        self.run_steps(remaining)
    }

    /// Like [`World::run`], calling `observer(step, phase, world)` after every phase
    pub fn run_observed<F>(&mut self, mut observer: F) -> &Self
    where
        F: FnMut(usize, Phase, &World),
    {
        while !self.is_finished() {
            for phase in Phase::ORDER {
                self.apply(phase);
                observer(self.step, phase, self);
            }
            self.step += 1;
        }
        self
    }

    /// Copy of the current cells and food for rendering
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            cells: self
                .cells
                .iter()
                .map(|c| (c.position.x, c.position.y, c.energy))
                .collect(),
            food: self
                .food
                .iter()
                .map(|f| (f.position.x, f.position.y, f.energy))
                .collect(),
        }
    }

    /// Earliest cell (in creation order) within Chebyshev distance 1
    fn first_cell_near(&self, position: IVec2) -> Option<usize> {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| IVec2::new(dx, dy)))
            .filter_map(|offset| self.cell_index.get(&(position + offset)).copied())
            .min()
    }
}

fn index_cells(cells: &[Cell]) -> AHashMap<IVec2, usize> {
    cells
        .iter()
        .enumerate()
        .map(|(i, c)| (c.position, i))
        .collect()
}
