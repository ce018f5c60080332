use rand::Rng;
use serde::{Deserialize, Serialize};

use std::error::Error;

/// Error type returned by genome validation routines.
pub type GenomeValidationError = Box<dyn Error + Send + Sync>;

/// The outcome of evaluating a genome against the
/// problem at hand.
///
/// A failed evaluation (e.g. a numerical integration
/// that diverged) is represented by a fitness of `0.0`
/// and an `mse` of `f64::MAX`; see [`Evaluation::failed`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fitness score, higher is better. Must be ≥0.
    pub fitness: f64,
    /// Mean squared error against the target data.
    pub mse: f64,
    /// Structural complexity of the evaluated genome.
    pub complexity: usize,
}

impl Evaluation {
    /// Returns the evaluation assigned to a genome
    /// whose evaluation could not be completed.
    ///
    /// # Examples
    /// ```
    /// use neatgp::Evaluation;
    ///
    /// let failed = Evaluation::failed(7);
    /// assert_eq!(failed.fitness, 0.0);
    /// assert_eq!(failed.complexity, 7);
    /// assert!(failed.is_failure());
    /// ```
    pub const fn failed(complexity: usize) -> Evaluation {
        Evaluation {
            fitness: 0.0,
            mse: f64::MAX,
            complexity,
        }
    }

    /// Returns `true` if the evaluation carries no fitness.
    pub fn is_failure(&self) -> bool {
        self.fitness == 0.0
    }
}

impl Default for Evaluation {
    fn default() -> Evaluation {
        Evaluation::failed(0)
    }
}

/// An interface for genomes that can be used by NEAT.
///
/// Genomes are evaluated concurrently, so they must
/// be shareable between threads. Equality is used to
/// keep duplicate genomes out of the [`HallOfFame`].
///
/// [`HallOfFame`]: crate::HallOfFame
pub trait Genome: Clone + PartialEq + Send + Sync {
    type Config: Sync;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a randomized genome.
    fn new<R: Rng>(config: &Self::Config, rng: &mut R) -> Self;

    /// Returns the genetic distance between two genomes.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f64;

    /// Combines two genomes and returns a "child" genome.
    ///
    /// The innovation history is shared by the whole
    /// population, and must handle its own synchronization.
    fn mate<R: Rng>(
        parent1: &Self,
        parent2: &Self,
        history: &Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Applies the configured mutation operators to the genome.
    fn mutate<R: Rng>(
        &mut self,
        history: &Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Checks the genome's structural invariants.
    ///
    /// Any error returned here is treated by the population
    /// as a defect in the genetic operators, and aborts
    /// evolution.
    fn check_invariants(&self) -> Result<(), GenomeValidationError>;

    /// Checks that a configuration is usable, before
    /// any genome is generated from it.
    fn validate_config(config: &Self::Config) -> Result<(), GenomeValidationError>;

    /// Stores the genome's evaluation.
    fn set_evaluation(&mut self, evaluation: Evaluation);

    /// Returns the genome's last stored evaluation.
    fn evaluation(&self) -> &Evaluation;

    /// Returns the genome's fitness value.
    fn fitness(&self) -> f64 {
        self.evaluation().fitness
    }
}

/// An Innovation History is used to keep track
/// of genetic innovations throught successive
/// generations of genomes.
///
/// The history is shared (by reference) between
/// all reproduction routines of a population, so
/// implementors needing to record innovations
/// should do so behind a lock.
pub trait InnovationHistory: Sync {
    type Config;

    fn new(config: &Self::Config) -> Self;
}
