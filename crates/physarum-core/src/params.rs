//! Tunable simulation constants

use serde::{Deserialize, Serialize};

/// Energy rules shared by every phase of the world update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Energy a cell must keep after passing energy on; growth needs twice this
    pub min_energy: f32,
    /// A transfer moves `energy / max_energy_portion`; also caps food gain per step
    pub max_energy_portion: f32,
    /// Energy a food item loses each time it feeds a cell
    pub transferable_food_energy: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            min_energy: 1.0,
            max_energy_portion: 3.0,
            transferable_food_energy: 2.0,
        }
    }
}

impl SimParams {
    /// Minimum energy a cell needs before it may grow
    pub fn growth_threshold(&self) -> f32 {
        self.min_energy * 2.0
    }
}
