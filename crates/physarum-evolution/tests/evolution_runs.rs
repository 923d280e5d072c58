//! End-to-end runs of the genetic algorithm

use physarum_core::{Genome, NUM_STATES, Scenario};
use physarum_evolution::{
    Evolution, EvolutionConfig, FitnessKind, FitnessTerm, GenerationRecord, GenerationSink,
    NoopSink,
};

// ============================================================================
// Elitism
// ============================================================================

#[test]
fn test_best_fitness_never_decreases_with_elite() {
    for seed in 0..5 {
        let config = EvolutionConfig {
            population_size: 4,
            generations: 5,
            steps: 60,
            elite_count: 1,
            seed: Some(seed),
            ..Default::default()
        };
        let mut evolution = Evolution::new(config).expect("valid config");
        let outcome = evolution.run(&mut NoopSink).expect("run succeeds");

        assert_eq!(outcome.history.len(), 5);
        assert_eq!(outcome.best_genome.rules().len(), NUM_STATES);
        for pair in outcome.history.windows(2) {
            assert!(
                pair[1].best_fitness >= pair[0].best_fitness,
                "seed {seed}: best fell from {} to {}",
                pair[0].best_fitness,
                pair[1].best_fitness
            );
        }
    }
}

#[test]
fn test_elite_kept_when_every_individual_is_a_parent() {
    for seed in 0..5 {
        let config = EvolutionConfig {
            population_size: 4,
            generations: 5,
            steps: 60,
            fittest_rate: 1.0,
            elite_count: 1,
            seed: Some(seed),
            ..Default::default()
        };
        let mut evolution = Evolution::new(config).expect("valid config");
        let outcome = evolution.run(&mut NoopSink).expect("run succeeds");

        for pair in outcome.history.windows(2) {
            assert!(
                pair[1].best_fitness >= pair[0].best_fitness,
                "seed {seed}: best fell from {} to {}",
                pair[0].best_fitness,
                pair[1].best_fitness
            );
        }
    }
}

#[test]
fn test_champion_genome_reproduces_its_fitness() {
    let config = EvolutionConfig {
        population_size: 6,
        generations: 3,
        steps: 40,
        seed: Some(21),
        fitness: vec![
            FitnessTerm::new(FitnessKind::TotalEnergy, 1.0),
            FitnessTerm::new(FitnessKind::Spread, 2.0),
        ],
        ..Default::default()
    };
    let scenario = config.scenario.clone();
    let params = config.params;
    let steps = config.steps;
    let fitness = physarum_evolution::build_fitness(&config.fitness);

    let mut evolution = Evolution::new(config).expect("valid config");
    let outcome = evolution.run(&mut NoopSink).expect("run succeeds");

    let mut world = physarum_core::World::new(&scenario, outcome.best_genome, params, steps);
    world.run();
    assert_eq!(fitness.evaluate(&world), outcome.best_fitness);
}

// ============================================================================
// Collaborator hooks
// ============================================================================

struct StopAfterFirst {
    seen: usize,
}

impl GenerationSink for StopAfterFirst {
    fn on_generation(&mut self, _record: &GenerationRecord, _best: &Genome) -> anyhow::Result<()> {
        self.seen += 1;
        anyhow::bail!("interrupted")
    }
}

#[test]
fn test_sink_error_aborts_run() {
    let config = EvolutionConfig {
        population_size: 4,
        generations: 10,
        steps: 10,
        seed: Some(3),
        scenario: Scenario::single_food(),
        ..Default::default()
    };
    let mut evolution = Evolution::new(config).expect("valid config");
    let mut sink = StopAfterFirst { seen: 0 };

    let err = evolution.run(&mut sink).unwrap_err();
    assert_eq!(err.to_string(), "interrupted");
    assert_eq!(sink.seen, 1);
    assert_eq!(evolution.generation(), 1);
}

#[test]
fn test_manual_stepping_can_stop_early() {
    let config = EvolutionConfig {
        population_size: 4,
        generations: 50,
        steps: 10,
        seed: Some(5),
        ..Default::default()
    };
    let mut evolution = Evolution::new(config).expect("valid config");
    for _ in 0..3 {
        evolution.step_generation().expect("generation available");
    }

    assert!(!evolution.is_finished());
    assert_eq!(evolution.history().len(), 3);
    let (_, best) = evolution.champion().expect("champion after evaluation");
    assert_eq!(best, evolution.history()[2].best_fitness);
    assert_eq!(evolution.population().len(), 4);
}
