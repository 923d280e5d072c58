//! Generation loop
//!
//! Each generation evaluates every world in parallel, ranks the results and
//! assembles the next population from crossover children, an unmodified
//! elite and a mutated sample of the least fit. All randomness comes from one
//! seeded generator consumed on the calling thread, so a seeded run gives the
//! same history for any thread count.

use anyhow::{Result, anyhow};
use physarum_core::{Genome, World, genome::crossover_genome};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EvolutionConfig};
use crate::fitness::{FitnessFunction, build_fitness};
use crate::mutation::{AdaptiveMutation, mutate_population};
use crate::selection::{Scored, Selection, fitness_stats, select};

/// Statistics of one evaluated generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best_fitness: f32,
    pub average_fitness: f32,
    /// Genes changed per mutated crossover child when building the next generation
    pub adjusted_mutation_count: usize,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    pub best_genome: Genome,
    pub best_fitness: f32,
    pub history: Vec<GenerationRecord>,
}

/// Receives results at generation boundaries
///
/// An error aborts the run.
pub trait GenerationSink {
    fn on_generation(&mut self, _record: &GenerationRecord, _best: &Genome) -> Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _outcome: &EvolutionOutcome) -> Result<()> {
        Ok(())
    }
}

/// Sink that ignores everything
pub struct NoopSink;

impl GenerationSink for NoopSink {}

/// Genetic algorithm state between generations
pub struct Evolution {
    config: EvolutionConfig,
    fitness: Box<dyn FitnessFunction>,
    mutation: AdaptiveMutation,
    rng: Xoshiro256PlusPlus,
    /// Worlds awaiting evaluation
    population: Vec<World>,
    generation: usize,
    history: Vec<GenerationRecord>,
    /// Best individual of the latest evaluated generation
    champion: Option<Scored>,
}

impl Evolution {
    /// Start from weighted random genomes
    pub fn new(config: EvolutionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);

        let mut genomes = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            let genome =
                Genome::random_weighted(&mut rng, &config.growth_weights, &config.energy_weights)
                    .ok_or(ConfigError::InvalidActionWeights)?;
            genomes.push(genome);
        }

        Ok(Self::from_parts(config, rng, genomes))
    }

    /// Start from a saved genome
    ///
    /// The first individual carries `genome` unchanged; every other one is a
    /// copy mutated with the base mutation count.
    pub fn with_seed_genome(config: EvolutionConfig, genome: Genome) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);

        let mut genomes = Vec::with_capacity(config.population_size);
        genomes.push(genome.clone());
        for _ in 1..config.population_size {
            let mut copy = genome.clone();
            copy.mutate(&mut rng, config.base_mutation_count);
            genomes.push(copy);
        }

        Ok(Self::from_parts(config, rng, genomes))
    }

    fn from_parts(config: EvolutionConfig, rng: Xoshiro256PlusPlus, genomes: Vec<Genome>) -> Self {
        let fitness = build_fitness(&config.fitness);
        let mutation = AdaptiveMutation::new(config.base_mutation_count);
        log::info!(
            "Evolving {} individuals for {} generations with fitness '{}'",
            config.population_size,
            config.generations,
            fitness.name()
        );

        let mut evolution = Self {
            config,
            fitness,
            mutation,
            rng,
            population: Vec::new(),
            generation: 0,
            history: Vec::new(),
            champion: None,
        };
        evolution.population = evolution.spawn(genomes);
        evolution
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Generations evaluated so far
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }

    /// Worlds of the next generation to evaluate (empty once finished)
    pub fn population(&self) -> &[World] {
        &self.population
    }

    /// Best genome and fitness of the latest evaluated generation
    pub fn champion(&self) -> Option<(&Genome, f32)> {
        self.champion.as_ref().map(|s| (&s.genome, s.fitness))
    }

    pub fn is_finished(&self) -> bool {
        self.generation >= self.config.generations
    }

    /// Evaluate the current population and breed the next one
    ///
    /// Returns `None` once every configured generation has run. Callers may
    /// simply stop stepping to cancel between generations.
    pub fn step_generation(&mut self) -> Option<GenerationRecord> {
        if self.is_finished() {
            return None;
        }

        let ranked = self.evaluate();
        let (best_fitness, average_fitness) = fitness_stats(&ranked)?;
        let adjusted = self.mutation.adjusted_count(average_fitness, best_fitness);

        let record = GenerationRecord {
            generation: self.generation,
            best_fitness,
            average_fitness,
            adjusted_mutation_count: adjusted,
        };
        log::debug!(
            "Generation {}: best {:.2}, average {:.2}, mutation count {}",
            record.generation,
            best_fitness,
            average_fitness,
            adjusted
        );

        let selection = select(ranked, self.config.fittest_count());
        self.champion = selection.fittest.first().cloned();
        self.history.push(record);
        self.generation += 1;

        if !self.is_finished() {
            let genomes = self.breed(selection, adjusted);
            self.population = self.spawn(genomes);
        }
        Some(record)
    }

    /// Run every remaining generation, reporting to `sink` after each
    pub fn run(&mut self, sink: &mut dyn GenerationSink) -> Result<EvolutionOutcome> {
        while let Some(record) = self.step_generation() {
            if let Some(champion) = &self.champion {
                sink.on_generation(&record, &champion.genome)?;
            }
        }

        let outcome = self.outcome().ok_or_else(|| anyhow!("no generation was evaluated"))?;
        log::info!(
            "Evolution finished after {} generations, best fitness {:.2}",
            self.generation,
            outcome.best_fitness
        );
        sink.on_finish(&outcome)?;
        Ok(outcome)
    }

    /// Best genome of the latest generation together with the full history
    pub fn outcome(&self) -> Option<EvolutionOutcome> {
        self.champion.as_ref().map(|champion| EvolutionOutcome {
            best_genome: champion.genome.clone(),
            best_fitness: champion.fitness,
            history: self.history.clone(),
        })
    }

    fn spawn(&self, genomes: Vec<Genome>) -> Vec<World> {
        genomes
            .into_iter()
            .map(|genome| {
                World::new(
                    &self.config.scenario,
                    genome,
                    self.config.params,
                    self.config.steps,
                )
            })
            .collect()
    }

    /// Run all worlds to completion in parallel and score them
    fn evaluate(&mut self) -> Vec<Scored> {
        let fitness = self.fitness.as_ref();
        self.population.par_iter_mut().for_each(|world| {
            world.run();
            let score = fitness.evaluate(world);
            world.set_fitness(score);
        });
        self.population.drain(..).map(Scored::from_world).collect()
    }

    /// Next generation: children, then elite, then the least-fit sample
    ///
    /// The elite slice is reserved first, so crossover never crowds it out.
    fn breed(&mut self, selection: Selection, adjusted: usize) -> Vec<Genome> {
        let size = self.config.population_size;
        let mutated_count = self.config.mutated_count();
        let Selection { fittest, least_fit } = selection;
        let elite_count = self.config.elite_count.min(fittest.len()).min(size);

        // Consecutive parents pair up; an odd last parent pairs with the first
        let mut children = Vec::with_capacity(fittest.len() + 1);
        for (i, parent) in fittest.iter().enumerate().step_by(2) {
            let partner = fittest.get(i + 1).unwrap_or(&fittest[0]);
            let (first, second) = crossover_genome(&parent.genome, &partner.genome, &mut self.rng);
            children.push(first);
            children.push(second);
        }
        children.truncate(size - elite_count);
        mutate_population(&mut children, mutated_count, adjusted, &mut self.rng);

        let remaining = size - elite_count - children.len();
        let mut sample: Vec<Genome> =
            rand::seq::index::sample(&mut self.rng, least_fit.len(), remaining.min(least_fit.len()))
                .into_iter()
                .map(|i| least_fit[i].genome.clone())
                .collect();
        mutate_population(
            &mut sample,
            mutated_count,
            self.config.base_mutation_count,
            &mut self.rng,
        );

        let mut next = children;
        next.extend(fittest[..elite_count].iter().map(|s| s.genome.clone()));
        next.extend(sample);

        // Untruncated children outnumber the parents, so the least fit cover the rest
        debug_assert_eq!(next.len(), size);
        next
    }
}

fn seeded_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("Using RNG seed {seed}");
    Xoshiro256PlusPlus::seed_from_u64(seed)
}
