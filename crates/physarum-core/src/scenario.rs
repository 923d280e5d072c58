//! Starting layouts for colony simulations
//!
//! A scenario is the fixed initial state every individual of a population is
//! evaluated on: where the first cells sit and how much energy they carry, and
//! where food lies.

use ahash::AHashSet;
use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{Cell, Food};

/// Reasons a starting layout is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("two starting cells share position {0}")]
    DuplicateCell(IVec2),
    #[error("entity at {position} has negative or non-finite energy {energy}")]
    InvalidEnergy { position: IVec2, energy: f32 },
}

/// Unvalidated layout as written in config files; converts into a [`Scenario`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioLayout {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub food: Vec<Food>,
}

/// Validated initial cells and food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioLayout", into = "ScenarioLayout")]
pub struct Scenario {
    cells: Vec<Cell>,
    food: Vec<Food>,
}

impl Scenario {
    /// Build a scenario, rejecting overlapping cells and invalid energies
    pub fn new(cells: Vec<Cell>, food: Vec<Food>) -> Result<Self, ScenarioError> {
        let mut occupied = AHashSet::with_capacity(cells.len());
        for cell in &cells {
            if !occupied.insert(cell.position) {
                return Err(ScenarioError::DuplicateCell(cell.position));
            }
        }

        let energies = cells
            .iter()
            .map(|c| (c.position, c.energy))
            .chain(food.iter().map(|f| (f.position, f.energy)));
        for (position, energy) in energies {
            if !energy.is_finite() || energy < 0.0 {
                return Err(ScenarioError::InvalidEnergy { position, energy });
            }
        }

        Ok(Self { cells, food })
    }

    /// Single cell surrounded by five food sources
    pub fn colony() -> Self {
        Self {
            cells: vec![Cell::new(IVec2::new(20, 15), 60.0)],
            food: vec![
                Food::new(IVec2::new(23, 18), 80.0),
                Food::new(IVec2::new(35, 25), 80.0),
                Food::new(IVec2::new(10, 30), 80.0),
                Food::new(IVec2::new(40, 10), 80.0),
                Food::new(IVec2::new(5, 5), 80.0),
            ],
        }
    }

    /// Single cell with one distant food source
    pub fn single_food() -> Self {
        Self {
            cells: vec![Cell::new(IVec2::new(20, 15), 40.0)],
            food: vec![Food::new(IVec2::new(40, 25), 50.0)],
        }
    }

    /// One cell at the origin with `count` food items scattered around it
    ///
    /// Each food offset has a per-axis magnitude in `[min_dist, max_dist]` with a
    /// random sign. Positions already taken are redrawn.
    #[cfg(feature = "evolution")]
    pub fn scattered<R: rand::Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        food_energy: f32,
        min_dist: i32,
        max_dist: i32,
    ) -> Self {
        let min_dist = min_dist.max(1);
        let max_dist = max_dist.max(min_dist);
        // Never ask for more spots than the ring holds
        let side = (max_dist - min_dist + 1) as usize;
        let count = count.min(side * side * 4);

        let mut taken = AHashSet::new();
        taken.insert(IVec2::ZERO);
        let mut food = Vec::with_capacity(count);
        while food.len() < count {
            let mut axis = || {
                let magnitude = rng.random_range(min_dist..=max_dist);
                if rng.random_bool(0.5) {
                    magnitude
                } else {
                    -magnitude
                }
            };
            let position = IVec2::new(axis(), axis());
            if taken.insert(position) {
                food.push(Food::new(position, food_energy));
            }
        }

        Self {
            cells: vec![Cell::new(IVec2::ZERO, 100.0)],
            food,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn food(&self) -> &[Food] {
        &self.food
    }

    /// Energy held by all food items at the start
    pub fn total_food_energy(&self) -> f32 {
        self.food.iter().map(|f| f.energy).sum()
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::colony()
    }
}

impl TryFrom<ScenarioLayout> for Scenario {
    type Error = ScenarioError;

    fn try_from(raw: ScenarioLayout) -> Result<Self, Self::Error> {
        Self::new(raw.cells, raw.food)
    }
}

impl From<Scenario> for ScenarioLayout {
    fn from(scenario: Scenario) -> Self {
        Self {
            cells: scenario.cells,
            food: scenario.food,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for scenario in [Scenario::colony(), Scenario::single_food()] {
            let rebuilt = Scenario::new(scenario.cells().to_vec(), scenario.food().to_vec());
            assert_eq!(rebuilt, Ok(scenario));
        }
        assert_eq!(Scenario::colony().total_food_energy(), 400.0);
    }

    #[test]
    fn test_duplicate_cells_rejected() {
        let cells = vec![
            Cell::new(IVec2::new(1, 1), 5.0),
            Cell::new(IVec2::new(1, 1), 7.0),
        ];
        assert_eq!(
            Scenario::new(cells, Vec::new()),
            Err(ScenarioError::DuplicateCell(IVec2::new(1, 1)))
        );
    }

    #[test]
    fn test_negative_energy_rejected() {
        let food = vec![Food::new(IVec2::new(3, 3), -1.0)];
        let result = Scenario::new(vec![Cell::new(IVec2::ZERO, 1.0)], food);
        assert!(matches!(result, Err(ScenarioError::InvalidEnergy { .. })));
    }

    #[test]
    fn test_scenario_deserialization_validates() {
        let text = ron::to_string(&Scenario::colony()).expect("Failed to serialize scenario");
        let restored: Scenario = ron::from_str(&text).expect("Failed to deserialize scenario");
        assert_eq!(restored, Scenario::colony());

        let overlapping = ScenarioLayout {
            cells: vec![Cell::new(IVec2::ZERO, 1.0), Cell::new(IVec2::ZERO, 2.0)],
            food: Vec::new(),
        };
        let text = ron::to_string(&overlapping).expect("Failed to serialize raw scenario");
        assert!(ron::from_str::<Scenario>(&text).is_err());
    }

    #[cfg(feature = "evolution")]
    #[test]
    fn test_scattered_food_layout() {
        use rand::SeedableRng;
        use rand_xoshiro::Xoshiro256PlusPlus;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        let scenario = Scenario::scattered(&mut rng, 50, 10.0, 1, 20);

        assert_eq!(scenario.cells().len(), 1);
        assert_eq!(scenario.food().len(), 50);
        let mut seen = AHashSet::new();
        for food in scenario.food() {
            assert!((1..=20).contains(&food.position.x.abs()));
            assert!((1..=20).contains(&food.position.y.abs()));
            assert!(seen.insert(food.position));
        }
        assert!(Scenario::new(scenario.cells().to_vec(), scenario.food().to_vec()).is_ok());
    }
}
