//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
mod hall_of_fame;
pub mod logging;
mod offspring_factory;
mod species;

use crate::{Evaluation, Genome, InnovationHistory};
pub use config::PopulationConfig;
pub use errors::{ConfigError, EvolutionError};
pub use hall_of_fame::HallOfFame;
use offspring_factory::OffspringFactory;
pub use species::{Species, SpeciesID};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The phase of its life cycle a population is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionState {
    /// Freshly generated, not yet evaluated.
    Initialized,
    /// Genomes are evaluated and awaiting speciation.
    Evaluating,
    /// Genomes are being grouped into species.
    Speciating,
    /// A new generation has been bred and awaits evaluation.
    Reproducing,
    /// A termination condition was met.
    Terminated,
}

/// Why evolution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The best fitness met or exceeded the target.
    TargetFitness,
    /// The configured number of generations was evaluated.
    MaxGenerations,
}

/// The result of a complete evolutionary run.
#[derive(Debug, Clone)]
pub struct RunSummary<G> {
    /// Number of generations evaluated.
    pub generations: usize,
    /// Best genome found during the run.
    pub best: Option<G>,
    pub reason: TerminationReason,
}

/// A population of genomes.
pub struct Population<C, H, G> {
    genomes: Vec<G>,
    species: Vec<Species<G>>,
    history: H,
    hall_of_fame: HallOfFame<G>,
    generation: usize,
    species_born_this_generation: usize,
    compatibility_threshold: f64,
    state: EvolutionState,
    termination: Option<TerminationReason>,
    rng: StdRng,
    population_config: PopulationConfig,
    genetic_config: C,
}

impl<C, H, G> Population<C, H, G>
where
    C: Sync,
    H: InnovationHistory<Config = C>,
    G: Genome<InnovationHistory = H, Config = C>,
{
    /// Creates a new population using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Population, PopulationConfig};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     size: 20,
    ///     seed: Some(1),
    ///     ..PopulationConfig::default()
    /// };
    ///
    /// let population =
    ///     Population::<_, _, ExprGenome>::new(pop_config, GeneticConfig::default()).unwrap();
    /// assert_eq!(population.genomes().count(), 20);
    /// ```
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Result<Population<C, H, G>, ConfigError> {
        population_config.validate()?;
        G::validate_config(&genetic_config).map_err(ConfigError::Genetic)?;

        let mut rng = match population_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let genomes = (0..population_config.size)
            .map(|_| G::new(&genetic_config, &mut rng))
            .collect();

        Ok(Population {
            genomes,
            species: vec![],
            history: H::new(&genetic_config),
            hall_of_fame: HallOfFame::new(population_config.hall_of_fame_size),
            generation: 0,
            species_born_this_generation: 0,
            compatibility_threshold: population_config.compatibility_threshold,
            state: EvolutionState::Initialized,
            termination: None,
            rng,
            population_config,
            genetic_config,
        })
    }

    /// Evaluates every genome of the population using the
    /// passed evaluator, in parallel, then updates the
    /// hall of fame and checks the termination conditions.
    ///
    /// Fitness values that are negative or not finite are
    /// recorded as failed evaluations.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Evaluation, Genome, Population, PopulationConfig};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use neatgp_expr::networks::ExpressionNetwork;
    ///
    /// let mut population = Population::<_, _, ExprGenome>::new(
    ///     PopulationConfig { size: 10, seed: Some(3), ..PopulationConfig::default() },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    ///
    /// population.evaluate_fitness(|g| {
    ///     // Genomes with outputs closer to 0 are given higher scores.
    ///     let output = ExpressionNetwork::from(g).evaluate_at(&[1.0]);
    ///     Evaluation {
    ///         fitness: 1.0 / (1.0 + output.abs()),
    ///         mse: output * output,
    ///         complexity: g.complexity(),
    ///     }
    /// });
    ///
    /// assert!(population.genomes().all(|g| g.fitness() > 0.0));
    /// ```
    pub fn evaluate_fitness<E>(&mut self, evaluator: E)
    where
        E: Fn(&G) -> Evaluation + Sync,
    {
        self.state = EvolutionState::Evaluating;
        self.genomes.par_iter_mut().for_each(|genome| {
            let mut evaluation = evaluator(genome);
            if !(evaluation.fitness.is_finite() && evaluation.fitness >= 0.0) {
                log::trace!("discarding invalid fitness {}", evaluation.fitness);
                evaluation = Evaluation::failed(evaluation.complexity);
            }
            genome.set_evaluation(evaluation);
        });

        let admitted = self.hall_of_fame.update(&self.genomes);
        log::debug!(
            "generation {}: {} genomes admitted to the hall of fame",
            self.generation,
            admitted
        );

        let best = self.hall_of_fame.best().map_or(0.0, |g| g.fitness());
        if best >= self.population_config.target_fitness {
            self.terminate(TerminationReason::TargetFitness);
        } else if self.generation + 1 >= self.population_config.max_generations {
            self.terminate(TerminationReason::MaxGenerations);
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        log::info!(
            "evolution terminated after {} generations: {:?}",
            self.generation + 1,
            reason
        );
        self.termination = Some(reason);
        self.state = EvolutionState::Terminated;
    }

    /// Evolves the population into its next generation:
    /// genomes are speciated, the compatibility threshold
    /// is adjusted, and each species breeds its allotted
    /// offspring.
    ///
    /// # Errors
    /// Returns an error if the current generation has not
    /// been evaluated, or the population has terminated.
    ///
    /// # Panics
    /// Panics if an offspring violates the genome's
    /// structural invariants.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Evaluation, EvolutionState, Population, PopulationConfig};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    ///
    /// let mut population = Population::<_, _, ExprGenome>::new(
    ///     PopulationConfig { size: 10, seed: Some(5), ..PopulationConfig::default() },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    ///
    /// // Evaluation must come first.
    /// assert!(population.evolve().is_err());
    ///
    /// population.evaluate_fitness(|g| Evaluation {
    ///     fitness: 1.0 / g.complexity() as f64,
    ///     mse: 0.0,
    ///     complexity: g.complexity(),
    /// });
    /// population.evolve().unwrap();
    ///
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.state(), EvolutionState::Reproducing);
    /// ```
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        match self.state {
            EvolutionState::Terminated => Err(EvolutionError::Terminated),
            EvolutionState::Evaluating => {
                self.advance();
                Ok(())
            }
            _ => Err(EvolutionError::Unevaluated),
        }
    }

    /// Runs the whole evolutionary loop, evaluating
    /// and evolving until a termination condition is met.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Evaluation, Population, PopulationConfig, TerminationReason};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    ///
    /// let mut population = Population::<_, _, ExprGenome>::new(
    ///     PopulationConfig {
    ///         size: 10,
    ///         max_generations: 3,
    ///         target_fitness: 2.0,
    ///         seed: Some(5),
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    ///
    /// let summary = population.run(|g| Evaluation {
    ///     fitness: 1.0 / g.complexity() as f64,
    ///     mse: 0.0,
    ///     complexity: g.complexity(),
    /// });
    ///
    /// assert_eq!(summary.generations, 3);
    /// assert_eq!(summary.reason, TerminationReason::MaxGenerations);
    /// assert!(summary.best.is_some());
    /// ```
    pub fn run<E>(&mut self, evaluator: E) -> RunSummary<G>
    where
        E: Fn(&G) -> Evaluation + Sync,
    {
        loop {
            self.evaluate_fitness(&evaluator);
            if let Some(reason) = self.termination {
                return RunSummary {
                    generations: self.generation + 1,
                    best: self.hall_of_fame.best().cloned(),
                    reason,
                };
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.state = EvolutionState::Speciating;
        self.speciate();
        self.adjust_compatibility_threshold();

        log::info!(
            "generation {}: best fitness {:.6}, {} species, compatibility threshold {:.3}",
            self.generation,
            self.hall_of_fame.best().map_or(0.0, |g| g.fitness()),
            self.species.len(),
            self.compatibility_threshold
        );

        self.state = EvolutionState::Reproducing;
        let allotted_offspring = self.allot_offspring();
        self.generate_offspring(&allotted_offspring);
        self.remove_extinct_species(&allotted_offspring);

        self.generation += 1;
        self.species_born_this_generation = 0;
    }

    /// Assigns every genome to the first species whose
    /// representative is within the compatibility threshold,
    /// founding new species for unassigned genomes, then
    /// drops empty species and updates the survivors.
    fn speciate(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }

        for (index, genome) in self.genomes.iter().enumerate() {
            match self.species.iter_mut().find(|s| {
                s.genetic_distance(genome, &self.genetic_config) < self.compatibility_threshold
            }) {
                Some(species) => species.add_member(index),
                None => {
                    let id = SpeciesID(self.generation, self.species_born_this_generation);
                    self.species_born_this_generation += 1;
                    self.species.push(Species::new(id, genome.clone(), index));
                }
            }
        }

        self.species.retain(|s| {
            if s.members().is_empty() {
                log::debug!("species {:?} died out", s.id());
            }
            !s.members().is_empty()
        });
        for species in &mut self.species {
            species.update(&self.genomes);
        }
    }

    /// Moves the compatibility threshold toward the value
    /// that yields the target species count.
    fn adjust_compatibility_threshold(&mut self) {
        let error = self.species.len() as f64 - self.population_config.target_species as f64;
        let (lower, upper) = self.population_config.threshold_bounds;
        self.compatibility_threshold = (self.compatibility_threshold
            + self.population_config.threshold_gain * error)
            .clamp(lower, upper);
    }

    /// Allots the number of offspring of each species,
    /// proportionally to the species' total fitness.
    /// Stagnated species receive no offspring, unless
    /// they hold the population champion.
    ///
    /// If every eligible species has zero fitness, offspring
    /// are allotted proportionally to species size instead.
    fn allot_offspring(&self) -> Vec<usize> {
        let best_species = self.best_species_index();
        let eligible: Vec<bool> = self
            .species
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let stagnated =
                    s.time_stagnated() >= self.population_config.stagnation_threshold;
                if stagnated && Some(i) != best_species {
                    log::debug!(
                        "species {:?} stagnated for {} generations",
                        s.id(),
                        s.time_stagnated()
                    );
                }
                !stagnated || Some(i) == best_species
            })
            .collect();

        let fitnesses: Vec<f64> = self
            .species
            .iter()
            .zip(&eligible)
            .map(|(s, &e)| if e { s.total_fitness(&self.genomes) } else { 0.0 })
            .collect();
        let shares = if fitnesses.iter().sum::<f64>() > 0.0 {
            fitnesses
        } else {
            log::warn!(
                "generation {}: degenerate population, allotting offspring by species size",
                self.generation
            );
            self.species
                .iter()
                .zip(&eligible)
                .map(|(s, &e)| if e { s.members().len() as f64 } else { 0.0 })
                .collect()
        };

        let share_sum: f64 = shares.iter().sum();
        let size = self.population_config.size as f64;
        round_retain_sum(
            &shares
                .iter()
                .map(|s| s / share_sum * size)
                .collect::<Vec<_>>(),
        )
    }

    /// Returns the index of the species holding the
    /// current population champion.
    fn best_species_index(&self) -> Option<usize> {
        let champion = (0..self.genomes.len())
            .max_by(|&a, &b| self.genomes[a].fitness().total_cmp(&self.genomes[b].fitness()))?;
        self.species
            .iter()
            .position(|s| s.members().contains(&champion))
    }

    /// Generates each species' assigned offspring,
    /// keeping the [species' elite] and mating the
    /// [top performers].
    ///
    /// Has a [chance] of selecting a partner
    /// from another species.
    ///
    /// [species' elite]: PopulationConfig::elitism
    /// [top performers]: PopulationConfig::survival_threshold
    /// [chance]: PopulationConfig::interspecies_mating_chance
    fn generate_offspring(&mut self, allotted_offspring: &[usize]) {
        for species in &mut self.species {
            species.sort_members(&self.genomes);
        }

        let offspring = OffspringFactory::new(
            &self.genomes,
            &self.species,
            &self.history,
            &self.genetic_config,
            &self.population_config,
            self.generation,
            &mut self.rng,
        )
        .generate_offspring(allotted_offspring);
        self.genomes = offspring;
    }

    /// Removes all extinct (0 assigned offspring)
    /// species from the population.
    fn remove_extinct_species(&mut self, allotted_offspring: &[usize]) {
        let mut allotted = allotted_offspring.iter();
        self.species.retain(|s| {
            let alive = allotted.next().map_or(false, |&n| n > 0);
            if !alive {
                log::debug!("species {:?} went extinct", s.id());
            }
            alive
        });
        // Member indices refer to the previous generation.
        for species in &mut self.species {
            species.members.clear();
        }
    }

    /// Returns the currently best-performing genome.
    pub fn champion(&self) -> Option<&G> {
        self.genomes
            .iter()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.genomes.iter()
    }

    /// Returns an iterator over all current species.
    ///
    /// Species are only formed when the population
    /// evolves; member lists refer to the genomes that
    /// were speciated, and are emptied once they have
    /// bred the next generation.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the hall of fame.
    pub fn hall_of_fame(&self) -> &HallOfFame<G> {
        &self.hall_of_fame
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the current compatibility threshold.
    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    /// Returns the population's life cycle phase.
    pub fn state(&self) -> EvolutionState {
        self.state
    }

    /// Returns the reason evolution stopped, if it has.
    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the genetic configuration.
    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }

    /// Returns the population configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }
}

/// Rounds all values to positive whole numbers
/// while preserving their order and sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f64]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f64>().round() as usize;
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            let e = f - u;
            (i, u as usize, e)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenomeValidationError;

    use rand::Rng;

    /// A single real number, for exercising the population
    /// machinery without any real genetics.
    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        x: f64,
        evaluation: Evaluation,
    }

    struct NoHistory;

    impl InnovationHistory for NoHistory {
        type Config = f64;

        fn new(_: &f64) -> NoHistory {
            NoHistory
        }
    }

    /// The config is the spread of randomly generated points.
    impl Genome for Point {
        type Config = f64;
        type InnovationHistory = NoHistory;

        fn new<R: Rng>(spread: &f64, rng: &mut R) -> Point {
            Point {
                x: rng.gen_range(-*spread..=*spread),
                evaluation: Evaluation::default(),
            }
        }

        fn genetic_distance(first: &Point, second: &Point, _: &f64) -> f64 {
            (first.x - second.x).abs()
        }

        fn mate<R: Rng>(p1: &Point, p2: &Point, _: &NoHistory, _: &f64, rng: &mut R) -> Point {
            Point {
                x: if rng.gen::<bool>() { p1.x } else { p2.x },
                evaluation: Evaluation::default(),
            }
        }

        fn mutate<R: Rng>(&mut self, _: &NoHistory, _: &f64, rng: &mut R) {
            self.x += rng.gen_range(-0.5..=0.5);
        }

        fn check_invariants(&self) -> Result<(), GenomeValidationError> {
            if self.x.is_finite() {
                Ok(())
            } else {
                Err("non-finite point".into())
            }
        }

        fn validate_config(spread: &f64) -> Result<(), GenomeValidationError> {
            if *spread > 0.0 {
                Ok(())
            } else {
                Err("spread must be positive".into())
            }
        }

        fn set_evaluation(&mut self, evaluation: Evaluation) {
            self.evaluation = evaluation;
        }

        fn evaluation(&self) -> &Evaluation {
            &self.evaluation
        }
    }

    fn closeness_to(target: f64) -> impl Fn(&Point) -> Evaluation + Sync {
        move |p| Evaluation {
            fitness: 1.0 / (1.0 + (p.x - target).powi(2)),
            mse: (p.x - target).powi(2),
            complexity: 1,
        }
    }

    fn config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size,
            max_generations: 1000,
            target_fitness: 2.0,
            seed: Some(42),
            ..PopulationConfig::default()
        }
    }

    #[test]
    fn round_retain_sum() {
        let v = [
            5.2,
            9.5,
            2.8,
            1.3,
            2.2,
            2.7,
            6.3,
            1.0000000000001,
            0.9999999999999,
        ];
        let w = super::round_retain_sum(&v);
        assert_eq!(w.iter().sum::<usize>(), 32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
    }

    #[test]
    fn invalid_genetic_config_is_rejected() {
        let result = Population::<_, _, Point>::new(config(10), -1.0);
        assert!(matches!(result, Err(ConfigError::Genetic(_))));
    }

    #[test]
    fn population_size_is_preserved() {
        let mut population = Population::<_, _, Point>::new(config(37), 10.0).unwrap();
        for _ in 0..10 {
            population.evaluate_fitness(closeness_to(3.0));
            population.evolve().unwrap();
            assert_eq!(population.genomes().count(), 37);
        }
    }

    #[test]
    fn seeded_populations_are_reproducible() {
        let run = || {
            let mut population = Population::<_, _, Point>::new(config(20), 10.0).unwrap();
            for _ in 0..5 {
                population.evaluate_fitness(closeness_to(3.0));
                population.evolve().unwrap();
            }
            population.genomes().map(|p| p.x).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn threshold_controller_reaches_target_species_count() {
        const TARGET: usize = 5;
        let mut population = Population::<_, _, Point>::new(
            PopulationConfig {
                target_species: TARGET,
                ..config(100)
            },
            1.0,
        )
        .unwrap();
        // A fixed population of evenly spaced points.
        population.genomes = (0..100)
            .map(|i| Point {
                x: i as f64,
                evaluation: Evaluation::default(),
            })
            .collect();
        population.evaluate_fitness(closeness_to(50.0));

        for _ in 0..50 {
            population.speciate();
            population.adjust_compatibility_threshold();
            population.generation += 1;
            population.species_born_this_generation = 0;
        }
        let count = population.species().count();
        assert!(
            (TARGET - 2..=TARGET + 2).contains(&count),
            "{} species, threshold {}",
            count,
            population.compatibility_threshold()
        );
    }

    #[test]
    fn threshold_stays_within_bounds() {
        let mut population = Population::<_, _, Point>::new(
            PopulationConfig {
                threshold_gain: 100.0,
                threshold_bounds: (0.5, 4.0),
                ..config(50)
            },
            10.0,
        )
        .unwrap();
        for _ in 0..10 {
            population.evaluate_fitness(closeness_to(0.0));
            population.evolve().unwrap();
            let threshold = population.compatibility_threshold();
            assert!((0.5..=4.0).contains(&threshold));
        }
    }

    #[test]
    fn hall_of_fame_best_never_decreases() {
        let mut population = Population::<_, _, Point>::new(config(30), 20.0).unwrap();
        let mut previous_best = 0.0;
        for _ in 0..30 {
            population.evaluate_fitness(closeness_to(7.5));
            let best = population.hall_of_fame().best().unwrap().fitness();
            assert!(best >= previous_best);
            previous_best = best;
            population.evolve().unwrap();
        }
        let hall_of_fame: Vec<_> = population.hall_of_fame().iter().collect();
        assert!(hall_of_fame.len() <= 10);
        assert!(hall_of_fame.windows(2).all(|w| w[0].fitness() >= w[1].fitness()));
    }

    #[test]
    fn run_stops_at_target_fitness() {
        let mut population = Population::<_, _, Point>::new(
            PopulationConfig {
                target_fitness: 0.99,
                ..config(50)
            },
            5.0,
        )
        .unwrap();
        let summary = population.run(closeness_to(1.0));
        assert_eq!(summary.reason, TerminationReason::TargetFitness);
        assert!(summary.best.unwrap().fitness() >= 0.99);
        assert_eq!(population.state(), EvolutionState::Terminated);
        assert_eq!(population.evolve(), Err(EvolutionError::Terminated));
    }

    #[test]
    fn degenerate_population_still_reproduces() {
        let mut population = Population::<_, _, Point>::new(config(25), 5.0).unwrap();
        population.evaluate_fitness(|_| Evaluation::failed(1));
        population.evolve().unwrap();
        assert_eq!(population.genomes().count(), 25);
    }

    #[test]
    fn invalid_fitness_is_recorded_as_failure() {
        let mut population = Population::<_, _, Point>::new(config(5), 5.0).unwrap();
        population.evaluate_fitness(|_| Evaluation {
            fitness: f64::NAN,
            mse: 0.0,
            complexity: 1,
        });
        assert!(population.genomes().all(|g| g.evaluation().is_failure()));
    }
}
