//! Fitness functions scoring a colony after its run
//!
//! Every function tolerates an empty colony and returns 0 for it. Functions
//! are selected by name through [`FitnessKind`] and combined into a weighted
//! sum with [`build_fitness`].

use std::fmt;
use std::str::FromStr;

use glam::{IVec2, Vec2};
use physarum_core::{Cell, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trait for fitness evaluation functions
pub trait FitnessFunction: Send + Sync {
    /// Score a world whose run has completed
    fn evaluate(&self, world: &World) -> f32;

    /// Get the name of this fitness function
    fn name(&self) -> &str;

    /// Get a description of what this fitness measures
    fn description(&self) -> &str;
}

/// Inclusive bounding box of the cell positions
fn bounds(cells: &[Cell]) -> Option<(IVec2, IVec2)> {
    let first = cells.first()?.position;
    Some(cells.iter().fold((first, first), |(min, max), cell| {
        (min.min(cell.position), max.max(cell.position))
    }))
}

/// Number of living cells
pub struct CellCountFitness;

impl FitnessFunction for CellCountFitness {
    fn evaluate(&self, world: &World) -> f32 {
        world.cells().len() as f32
    }

    fn name(&self) -> &str {
        "cell_count"
    }

    fn description(&self) -> &str {
        "Number of cells in the colony"
    }
}

/// Sum of cell energies
pub struct TotalEnergyFitness;

impl FitnessFunction for TotalEnergyFitness {
    fn evaluate(&self, world: &World) -> f32 {
        world.total_cell_energy()
    }

    fn name(&self) -> &str {
        "total_energy"
    }

    fn description(&self) -> &str {
        "Energy held by all cells"
    }
}

/// Bounding-box area `(max_x - min_x) * (max_y - min_y)`
///
/// A colony on a single row or column scores 0.
pub struct AreaFitness;

impl FitnessFunction for AreaFitness {
    fn evaluate(&self, world: &World) -> f32 {
        bounds(world.cells())
            .map(|(min, max)| {
                let size = max - min;
                size.x as f32 * size.y as f32
            })
            .unwrap_or(0.0)
    }

    fn name(&self) -> &str {
        "area"
    }

    fn description(&self) -> &str {
        "Area of the box enclosing all cells"
    }
}

/// Bounding-box half perimeter `(max_x - min_x) + (max_y - min_y)`
pub struct SpreadFitness;

impl FitnessFunction for SpreadFitness {
    fn evaluate(&self, world: &World) -> f32 {
        bounds(world.cells())
            .map(|(min, max)| {
                let size = max - min;
                (size.x + size.y) as f32
            })
            .unwrap_or(0.0)
    }

    fn name(&self) -> &str {
        "spread"
    }

    fn description(&self) -> &str {
        "Width plus height of the box enclosing all cells"
    }
}

/// Negated distance between the closest food item and its nearest cell
///
/// Higher is better: the colony scores by reaching any one food item, not all
/// of them. Without cells or food the score is 0.
pub struct FoodProximityFitness;

impl FitnessFunction for FoodProximityFitness {
    fn evaluate(&self, world: &World) -> f32 {
        let cells = world.cells();
        if cells.is_empty() || world.food().is_empty() {
            return 0.0;
        }

        let closest = world
            .food()
            .iter()
            .map(|food| {
                let target = food.position.as_vec2();
                cells
                    .iter()
                    .map(|cell| cell.position.as_vec2().distance(target))
                    .fold(f32::INFINITY, f32::min)
            })
            .fold(f32::INFINITY, f32::min);

        -closest
    }

    fn name(&self) -> &str {
        "food_proximity"
    }

    fn description(&self) -> &str {
        "Negated distance from the closest food item to its nearest cell"
    }
}

/// Negated largest distance of a cell from the colony's center of mass
pub struct CompactnessFitness;

impl FitnessFunction for CompactnessFitness {
    fn evaluate(&self, world: &World) -> f32 {
        let cells = world.cells();
        if cells.is_empty() {
            return 0.0;
        }

        let centroid = cells
            .iter()
            .map(|c| c.position.as_vec2())
            .sum::<Vec2>()
            / cells.len() as f32;

        let radius = cells
            .iter()
            .map(|c| c.position.as_vec2().distance(centroid))
            .fold(0.0, f32::max);

        -radius
    }

    fn name(&self) -> &str {
        "compactness"
    }

    fn description(&self) -> &str {
        "Negated maximum distance of a cell from the colony centroid"
    }
}

/// Fraction of the scenario's food energy eaten, rounded to two decimals
pub struct AcquiredEnergyFitness;

impl FitnessFunction for AcquiredEnergyFitness {
    fn evaluate(&self, world: &World) -> f32 {
        let initial = world.initial_food_energy();
        if world.cells().is_empty() || initial <= 0.0 {
            return 0.0;
        }
        let eaten = (initial - world.total_food_energy()) / initial;
        (eaten * 100.0).round() / 100.0
    }

    fn name(&self) -> &str {
        "acquired_energy"
    }

    fn description(&self) -> &str {
        "Share of the initial food energy consumed"
    }
}

/// Fraction of cells that still hold enough energy to grow
pub struct DroughtResistanceFitness;

impl FitnessFunction for DroughtResistanceFitness {
    fn evaluate(&self, world: &World) -> f32 {
        let cells = world.cells();
        if cells.is_empty() {
            return 0.0;
        }
        let threshold = world.params().growth_threshold();
        let healthy = cells.iter().filter(|c| c.energy >= threshold).count();
        healthy as f32 / cells.len() as f32
    }

    fn name(&self) -> &str {
        "drought_resistance"
    }

    fn description(&self) -> &str {
        "Share of cells at or above the growth threshold"
    }
}

/// Weighted sum of several fitness functions
///
/// Unlike an average, the weights are not normalized, so a negative weight
/// turns a term into a penalty.
pub struct CompositeFitness {
    /// Component fitness functions with their weights
    pub components: Vec<(Box<dyn FitnessFunction>, f32)>,
}

impl CompositeFitness {
    pub fn new(components: Vec<(Box<dyn FitnessFunction>, f32)>) -> Self {
        Self { components }
    }
}

impl FitnessFunction for CompositeFitness {
    fn evaluate(&self, world: &World) -> f32 {
        self.components
            .iter()
            .map(|(func, weight)| func.evaluate(world) * weight)
            .sum()
    }

    fn name(&self) -> &str {
        "composite"
    }

    fn description(&self) -> &str {
        "Weighted sum of multiple fitness metrics"
    }
}

/// Registry of the standard fitness functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessKind {
    CellCount,
    TotalEnergy,
    Area,
    FoodProximity,
    Compactness,
    Spread,
    AcquiredEnergy,
    DroughtResistance,
}

impl FitnessKind {
    pub const ALL: [FitnessKind; 8] = [
        FitnessKind::CellCount,
        FitnessKind::TotalEnergy,
        FitnessKind::Area,
        FitnessKind::FoodProximity,
        FitnessKind::Compactness,
        FitnessKind::Spread,
        FitnessKind::AcquiredEnergy,
        FitnessKind::DroughtResistance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FitnessKind::CellCount => "cell_count",
            FitnessKind::TotalEnergy => "total_energy",
            FitnessKind::Area => "area",
            FitnessKind::FoodProximity => "food_proximity",
            FitnessKind::Compactness => "compactness",
            FitnessKind::Spread => "spread",
            FitnessKind::AcquiredEnergy => "acquired_energy",
            FitnessKind::DroughtResistance => "drought_resistance",
        }
    }

    /// Instantiate the function this kind names
    pub fn build(self) -> Box<dyn FitnessFunction> {
        match self {
            FitnessKind::CellCount => Box::new(CellCountFitness),
            FitnessKind::TotalEnergy => Box::new(TotalEnergyFitness),
            FitnessKind::Area => Box::new(AreaFitness),
            FitnessKind::FoodProximity => Box::new(FoodProximityFitness),
            FitnessKind::Compactness => Box::new(CompactnessFitness),
            FitnessKind::Spread => Box::new(SpreadFitness),
            FitnessKind::AcquiredEnergy => Box::new(AcquiredEnergyFitness),
            FitnessKind::DroughtResistance => Box::new(DroughtResistanceFitness),
        }
    }
}

impl fmt::Display for FitnessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure to parse a fitness expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitnessParseError {
    #[error("unknown fitness function '{0}'")]
    UnknownKind(String),
    #[error("invalid weight '{0}'")]
    InvalidWeight(String),
    #[error("empty fitness expression")]
    Empty,
}

impl FromStr for FitnessKind {
    type Err = FitnessParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FitnessParseError::UnknownKind(s.to_string()))
    }
}

/// One weighted term of the configured fitness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessTerm {
    pub kind: FitnessKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl FitnessTerm {
    pub fn new(kind: FitnessKind, weight: f32) -> Self {
        Self { kind, weight }
    }

    /// `total_energy - cell_count + area`
    pub fn default_terms() -> Vec<FitnessTerm> {
        vec![
            FitnessTerm::new(FitnessKind::TotalEnergy, 1.0),
            FitnessTerm::new(FitnessKind::CellCount, -1.0),
            FitnessTerm::new(FitnessKind::Area, 1.0),
        ]
    }

    /// Parse a comma separated list of `name` or `name:weight` terms
    ///
    /// `"total_energy,cell_count:-1,area"` yields the default fitness.
    pub fn parse_list(s: &str) -> Result<Vec<FitnessTerm>, FitnessParseError> {
        let terms = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| match part.split_once(':') {
                Some((name, weight)) => {
                    let weight: f32 = weight
                        .trim()
                        .parse()
                        .map_err(|_| FitnessParseError::InvalidWeight(weight.trim().to_string()))?;
                    Ok(FitnessTerm::new(name.parse()?, weight))
                }
                None => Ok(FitnessTerm::new(part.parse()?, 1.0)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if terms.is_empty() {
            return Err(FitnessParseError::Empty);
        }
        Ok(terms)
    }
}

/// Build the evaluator for a list of weighted terms
///
/// A single term of weight 1 is returned as the plain function.
pub fn build_fitness(terms: &[FitnessTerm]) -> Box<dyn FitnessFunction> {
    match terms {
        [term] if term.weight == 1.0 => term.kind.build(),
        _ => Box::new(CompositeFitness::new(
            terms.iter().map(|t| (t.kind.build(), t.weight)).collect(),
        )),
    }
}
