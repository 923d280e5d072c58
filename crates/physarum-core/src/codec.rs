//! State and action codec
//!
//! A cell observes its four axis neighbors: whether each slot is occupied and
//! whether the occupant is pushing energy toward it. Those eight flags pack into
//! a dense state code (`0..NUM_STATES`), which indexes the genome. Each genome
//! entry is an action code (`0..NUM_ACTIONS`) packing a growth direction and an
//! energy direction.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Number of directions a cell can choose (including "none")
pub const NUM_DIRS: usize = 5;
/// Number of distinct (growth, energy) action pairs
pub const NUM_ACTIONS: usize = NUM_DIRS * NUM_DIRS;
/// Number of observation flags (4 occupancy + 4 incoming energy)
pub const STATE_BITS: usize = 8;
/// Number of distinct observations
pub const NUM_STATES: usize = 1 << STATE_BITS;

/// A direction on the grid, or no direction at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions in code order
    pub const ALL: [Direction; NUM_DIRS] = [
        Direction::None,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Neighbor slots in observation order
    pub const NEIGHBORS: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Dense index used by the action codec
    pub fn index(self) -> usize {
        match self {
            Self::None => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Up => 3,
            Self::Down => 4,
        }
    }

    /// Inverse of [`Direction::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Grid offset of one step in this direction (y grows downward)
    pub fn offset(self) -> IVec2 {
        match self {
            Self::None => IVec2::ZERO,
            Self::Left => IVec2::new(-1, 0),
            Self::Right => IVec2::new(1, 0),
            Self::Up => IVec2::new(0, -1),
            Self::Down => IVec2::new(0, 1),
        }
    }

    /// Direction pointing back the other way
    pub fn opposite(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// What a cell sees of its four neighbor slots (left, right, up, down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// A cell occupies the slot
    pub neighbors: [bool; 4],
    /// The occupant's last energy direction points back at the observer
    pub incoming: [bool; 4],
}

impl Observation {
    /// Pack into a state code
    pub fn encode(&self) -> u8 {
        encode_state(self.neighbors, self.incoming)
    }

    /// Unpack a state code
    pub fn decode(code: u8) -> Self {
        let (neighbors, incoming) = decode_state(code);
        Self {
            neighbors,
            incoming,
        }
    }
}

/// Pack the eight observation flags MSB-first (neighbors, then incoming energy)
pub fn encode_state(neighbors: [bool; 4], incoming: [bool; 4]) -> u8 {
    neighbors
        .iter()
        .chain(incoming.iter())
        .fold(0u8, |code, &bit| (code << 1) | u8::from(bit))
}

/// Exact inverse of [`encode_state`]
pub fn decode_state(code: u8) -> ([bool; 4], [bool; 4]) {
    let bit = |i: usize| (code >> (STATE_BITS - 1 - i)) & 1 == 1;
    (
        [bit(0), bit(1), bit(2), bit(3)],
        [bit(4), bit(5), bit(6), bit(7)],
    )
}

/// A (growth direction, energy direction) decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Action {
    pub growth: Direction,
    pub energy: Direction,
}

impl Action {
    /// Neither grow nor pass energy
    pub const INERT: Action = Action {
        growth: Direction::None,
        energy: Direction::None,
    };

    pub fn new(growth: Direction, energy: Direction) -> Self {
        Self { growth, energy }
    }

    /// Pack into an action code: `growth * NUM_DIRS + energy`
    pub fn encode(self) -> u8 {
        (self.growth.index() * NUM_DIRS + self.energy.index()) as u8
    }

    /// Unpack an action code, `None` if out of range
    pub fn decode(code: u8) -> Option<Self> {
        let code = code as usize;
        if code >= NUM_ACTIONS {
            return None;
        }
        Some(Self {
            growth: Direction::from_index(code / NUM_DIRS)?,
            energy: Direction::from_index(code % NUM_DIRS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip_all_codes() {
        for code in 0..NUM_STATES {
            let code = code as u8;
            let (neighbors, incoming) = decode_state(code);
            assert_eq!(encode_state(neighbors, incoming), code);
        }
    }

    #[test]
    fn test_state_encoding_is_msb_first() {
        // Left neighbor present is the most significant bit
        assert_eq!(encode_state([true, false, false, false], [false; 4]), 0b1000_0000);
        // Incoming energy from below is the least significant bit
        assert_eq!(encode_state([false; 4], [false, false, false, true]), 0b0000_0001);
        assert_eq!(encode_state([true; 4], [true; 4]), 255);
        assert_eq!(encode_state([false; 4], [false; 4]), 0);
    }

    #[test]
    fn test_observation_wraps_codec() {
        let obs = Observation {
            neighbors: [false, true, true, false],
            incoming: [false, true, false, false],
        };
        assert_eq!(obs.encode(), 0b0110_0100);
        assert_eq!(Observation::decode(obs.encode()), obs);
    }

    #[test]
    fn test_action_round_trip_all_codes() {
        for code in 0..NUM_ACTIONS as u8 {
            let action = Action::decode(code).expect("code in range");
            assert_eq!(action.encode(), code);
        }
        assert_eq!(Action::decode(NUM_ACTIONS as u8), None);
        assert_eq!(Action::decode(u8::MAX), None);
    }

    #[test]
    fn test_action_layout() {
        assert_eq!(Action::INERT.encode(), 0);
        assert_eq!(Action::new(Direction::None, Direction::Down).encode(), 4);
        assert_eq!(Action::new(Direction::Left, Direction::None).encode(), 5);
        assert_eq!(Action::new(Direction::Down, Direction::Down).encode(), 24);
    }

    #[test]
    fn test_direction_geometry() {
        for dir in Direction::NEIGHBORS {
            assert_eq!(dir.offset() + dir.opposite().offset(), IVec2::ZERO);
            assert_ne!(dir.offset(), IVec2::ZERO);
        }
        assert_eq!(Direction::Up.offset(), IVec2::new(0, -1));
        assert_eq!(Direction::None.opposite(), Direction::None);
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::from_index(i), Some(*dir));
        }
    }
}
