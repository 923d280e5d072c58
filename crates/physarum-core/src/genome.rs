//! Rule-table genome
//!
//! A genome maps every observable state code to an action code. It is the only
//! heritable part of a colony: two worlds with the same genome and scenario
//! evolve identically.
//!
//! With the `evolution` feature the genome also provides the genetic operators
//! used by the optimizer (random construction, uniform-partition crossover and
//! always-changing point mutation).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{Action, NUM_ACTIONS, NUM_STATES};

/// Reasons a rule table is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeError {
    #[error("genome has {found} rules, expected {expected}")]
    InvalidLength { found: usize, expected: usize },
    #[error("rule {index} holds action {action}, expected a value below {limit}")]
    ActionOutOfRange { index: usize, action: u8, limit: usize },
}

/// Lookup table from state code to action code
///
/// Serializes as a plain list of `NUM_STATES` integers. Deserialization goes
/// through [`Genome::from_rules`], so a saved table with a wrong length or an
/// out-of-range action never becomes a `Genome`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Genome {
    rules: Vec<u8>,
}

impl Genome {
    /// Validate a raw rule table
    pub fn from_rules(rules: Vec<u8>) -> Result<Self, GenomeError> {
        if rules.len() != NUM_STATES {
            return Err(GenomeError::InvalidLength {
                found: rules.len(),
                expected: NUM_STATES,
            });
        }
        if let Some((index, &action)) = rules
            .iter()
            .enumerate()
            .find(|(_, &a)| a as usize >= NUM_ACTIONS)
        {
            return Err(GenomeError::ActionOutOfRange {
                index,
                action,
                limit: NUM_ACTIONS,
            });
        }
        Ok(Self { rules })
    }

    /// Genome answering every state with the same action
    pub fn uniform(action: Action) -> Self {
        Self {
            rules: vec![action.encode(); NUM_STATES],
        }
    }

    /// Genome that never grows and never passes energy
    pub fn inert() -> Self {
        Self::uniform(Action::INERT)
    }

    /// Action chosen for a state code
    pub fn action(&self, state: u8) -> Action {
        // Rules are validated on construction, so decoding cannot fail
        Action::decode(self.rules[state as usize]).unwrap_or(Action::INERT)
    }

    /// Raw action code at a state index
    pub fn gene(&self, index: usize) -> u8 {
        self.rules[index]
    }

    /// Overwrite one rule
    pub fn set_action(&mut self, state: u8, action: Action) {
        self.rules[state as usize] = action.encode();
    }

    /// The full rule table
    pub fn rules(&self) -> &[u8] {
        &self.rules
    }

    /// Number of rules whose action differs from `other`
    pub fn hamming_distance(&self, other: &Genome) -> usize {
        self.rules
            .iter()
            .zip(&other.rules)
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl TryFrom<Vec<u8>> for Genome {
    type Error = GenomeError;

    fn try_from(rules: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_rules(rules)
    }
}

impl From<Genome> for Vec<u8> {
    fn from(genome: Genome) -> Self {
        genome.rules
    }
}

// ===== Genetic operators =====

/// Which parent each child draws a rule from; `true` marks the first half
#[cfg(feature = "evolution")]
pub type CrossoverMask = [bool; NUM_STATES];

#[cfg(feature = "evolution")]
impl Genome {
    /// Random genome with per-action weights `growth[g] * energy[e]`
    ///
    /// Returns `None` if the weights cannot form a distribution (all zero,
    /// negative or non-finite).
    pub fn random_weighted<R: rand::Rng + ?Sized>(
        rng: &mut R,
        growth_weights: &[f32; crate::codec::NUM_DIRS],
        energy_weights: &[f32; crate::codec::NUM_DIRS],
    ) -> Option<Self> {
        use rand::distr::Distribution;
        use rand::distr::weighted::WeightedIndex;

        let weights = growth_weights
            .iter()
            .flat_map(|g| energy_weights.iter().map(move |e| g * e));
        let dist = WeightedIndex::new(weights).ok()?;

        Some(Self {
            rules: (0..NUM_STATES)
                .map(|_| dist.sample(rng) as u8)
                .collect(),
        })
    }

    /// Uniformly random genome
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            rules: (0..NUM_STATES)
                .map(|_| rng.random_range(0..NUM_ACTIONS as u8))
                .collect(),
        }
    }

    /// Replace `count` distinct rules (clamped to `NUM_STATES`) with different actions
    ///
    /// Each chosen rule gets an action drawn uniformly from every action except
    /// its current one, so a mutated rule always changes. Returns the number of
    /// rules changed.
    pub fn mutate<R: rand::Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> usize {
        let count = count.min(NUM_STATES);
        for index in rand::seq::index::sample(rng, NUM_STATES, count) {
            let current = self.rules[index];
            // Draw from the other NUM_ACTIONS - 1 actions by skipping over the current one
            let mut replacement = rng.random_range(0..(NUM_ACTIONS - 1) as u8);
            if replacement >= current {
                replacement += 1;
            }
            self.rules[index] = replacement;
        }
        count
    }
}

/// Random split of the state indices into two equal disjoint halves
#[cfg(feature = "evolution")]
pub fn random_partition<R: rand::Rng + ?Sized>(rng: &mut R) -> CrossoverMask {
    use rand::seq::SliceRandom;

    let mut indices: Vec<usize> = (0..NUM_STATES).collect();
    indices.shuffle(rng);

    let mut mask = [false; NUM_STATES];
    for &index in &indices[..NUM_STATES / 2] {
        mask[index] = true;
    }
    mask
}

/// Two complementary children of `parent1` and `parent2`
///
/// The first child takes masked rules from `parent1` and the rest from
/// `parent2`; the second child takes the opposite assignment.
#[cfg(feature = "evolution")]
pub fn crossover_with_mask(
    parent1: &Genome,
    parent2: &Genome,
    mask: &CrossoverMask,
) -> (Genome, Genome) {
    let pick = |first: &Genome, second: &Genome| Genome {
        rules: mask
            .iter()
            .enumerate()
            .map(|(i, &in_first_half)| {
                if in_first_half {
                    first.rules[i]
                } else {
                    second.rules[i]
                }
            })
            .collect(),
    };
    (pick(parent1, parent2), pick(parent2, parent1))
}

/// Crossover with a freshly drawn partition
#[cfg(feature = "evolution")]
pub fn crossover_genome<R: rand::Rng + ?Sized>(
    parent1: &Genome,
    parent2: &Genome,
    rng: &mut R,
) -> (Genome, Genome) {
    let mask = random_partition(rng);
    crossover_with_mask(parent1, parent2, &mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Direction;

    #[test]
    fn test_genome_rejects_wrong_length() {
        assert_eq!(
            Genome::from_rules(vec![0; 10]),
            Err(GenomeError::InvalidLength {
                found: 10,
                expected: NUM_STATES
            })
        );
        assert!(Genome::from_rules(vec![0; NUM_STATES + 1]).is_err());
    }

    #[test]
    fn test_genome_rejects_out_of_range_action() {
        let mut rules = vec![3; NUM_STATES];
        rules[17] = NUM_ACTIONS as u8;
        assert_eq!(
            Genome::from_rules(rules),
            Err(GenomeError::ActionOutOfRange {
                index: 17,
                action: 25,
                limit: NUM_ACTIONS
            })
        );
    }

    #[test]
    fn test_genome_lookup() {
        let mut genome = Genome::inert();
        assert_eq!(genome.action(200), Action::INERT);

        let grow_right = Action::new(Direction::Right, Direction::Up);
        genome.set_action(200, grow_right);
        assert_eq!(genome.action(200), grow_right);
        assert_eq!(genome.gene(200), grow_right.encode());
        assert_eq!(genome.hamming_distance(&Genome::inert()), 1);
    }

    #[test]
    fn test_genome_serialization_validates() {
        let genome = Genome::uniform(Action::new(Direction::Down, Direction::Left));
        let text = ron::to_string(&genome).expect("Failed to serialize genome");
        let restored: Genome = ron::from_str(&text).expect("Failed to deserialize genome");
        assert_eq!(restored, genome);

        // A truncated table must not deserialize
        let short = ron::to_string(&vec![0u8; 12]).expect("Failed to serialize rules");
        assert!(ron::from_str::<Genome>(&short).is_err());
    }

    #[test]
    fn test_genome_bincode_round_trip() {
        let genome = Genome::uniform(Action::new(Direction::Up, Direction::Right));
        let bytes = bincode_next::serde::encode_to_vec(&genome, bincode_next::config::standard())
            .expect("Failed to serialize genome");
        let (restored, _): (Genome, _) =
            bincode_next::serde::decode_from_slice(&bytes, bincode_next::config::standard())
                .expect("Failed to deserialize genome");
        assert_eq!(restored, genome);
    }

    #[cfg(feature = "evolution")]
    mod operators {
        use super::*;
        use rand::SeedableRng;
        use rand_xoshiro::Xoshiro256PlusPlus;

        #[test]
        fn test_random_genome_is_valid() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
            let genome = Genome::random(&mut rng);
            assert!(Genome::from_rules(genome.rules().to_vec()).is_ok());
        }

        #[test]
        fn test_random_weighted_respects_zero_weights() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
            // Only "grow left" is allowed, energy direction is free
            let growth = [0.0, 1.0, 0.0, 0.0, 0.0];
            let energy = [1.0; 5];
            let genome = Genome::random_weighted(&mut rng, &growth, &energy).expect("valid weights");
            for state in 0..NUM_STATES {
                assert_eq!(genome.action(state as u8).growth, Direction::Left);
            }

            assert!(Genome::random_weighted(&mut rng, &[0.0; 5], &energy).is_none());
        }

        #[test]
        fn test_mutation_always_changes_rule() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
            for _ in 0..20 {
                let original = Genome::random(&mut rng);
                let mut mutated = original.clone();
                let changed = mutated.mutate(&mut rng, 40);
                assert_eq!(changed, 40);
                assert_eq!(original.hamming_distance(&mutated), 40);
                assert!(Genome::from_rules(mutated.rules().to_vec()).is_ok());
            }
        }

        #[test]
        fn test_mutation_count_is_clamped() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
            let mut genome = Genome::inert();
            assert_eq!(genome.mutate(&mut rng, NUM_STATES * 4), NUM_STATES);
            assert_eq!(genome.hamming_distance(&Genome::inert()), NUM_STATES);

            let mut untouched = Genome::inert();
            assert_eq!(untouched.mutate(&mut rng, 0), 0);
            assert_eq!(untouched, Genome::inert());
        }

        #[test]
        fn test_partition_is_disjoint_and_complete() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
            let mask = random_partition(&mut rng);
            let first_half = mask.iter().filter(|&&m| m).count();
            assert_eq!(first_half, NUM_STATES / 2);
            assert_eq!(NUM_STATES - first_half, NUM_STATES / 2);
        }

        #[test]
        fn test_crossover_children_trace_to_one_parent() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
            let parent1 = Genome::uniform(Action::new(Direction::Left, Direction::None));
            let parent2 = Genome::uniform(Action::new(Direction::Right, Direction::Down));
            let mask = random_partition(&mut rng);
            let (child1, child2) = crossover_with_mask(&parent1, &parent2, &mask);

            for (i, &in_first_half) in mask.iter().enumerate() {
                if in_first_half {
                    assert_eq!(child1.gene(i), parent1.gene(i));
                    assert_eq!(child2.gene(i), parent2.gene(i));
                } else {
                    assert_eq!(child1.gene(i), parent2.gene(i));
                    assert_eq!(child2.gene(i), parent1.gene(i));
                }
            }
            assert_eq!(child1.hamming_distance(&parent1), NUM_STATES / 2);
            assert_eq!(child2.hamming_distance(&parent2), NUM_STATES / 2);
        }

        #[test]
        fn test_crossover_masks_differ_between_draws() {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
            let a = random_partition(&mut rng);
            let b = random_partition(&mut rng);
            assert_ne!(a, b);
        }
    }
}
