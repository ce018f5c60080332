//! # NEAT-GP expressions
//! An expression-graph implementation of the [`neatgp`] crate's `Genome` trait,
//! for evolving the right-hand sides of ordinary differential equations.
//!
//! Provides:
//! - [`ExprGenome`]: a layered, acyclic graph of variables, constants and
//!   guarded arithmetic operations, usable in `neatgp` `Population`s.
//! - [`ExpressionNetwork`]: a compiled evaluator of an [`ExprGenome`].
//! - [`FitnessEvaluator`]: scores genomes by integrating them against
//!   observed time series.
//! - [`Equation`]: plain-text and LaTeX renderings of genomes, with a
//!   parser for the plain-text form.
//!
//! [`ExprGenome`]: crate::genomics::ExprGenome
//! [`ExpressionNetwork`]: crate::networks::ExpressionNetwork
//! [`FitnessEvaluator`]: crate::fitness::FitnessEvaluator
//! [`Equation`]: crate::equations::Equation
//!
//! # Example usage: recovering a first-order decay rate
//! ```
//! use neatgp::{Genome, Population, PopulationConfig};
//! use neatgp_expr::{
//!     equations::Equation,
//!     fitness::{Covariate, FitnessConfig, FitnessEvaluator, TimeSeries},
//!     genomics::{BinaryOp, ExprGenome, GeneticConfig, UnaryOp},
//!     summary::GenomeSummary,
//! };
//!
//! // Exact samples of y' = -0.05·y.
//! let times = vec![0.0, 10.0, 20.0, 30.0];
//! let values = times.iter().map(|t: &f64| 10.0 * (-0.05 * t).exp()).collect();
//! let series = TimeSeries::new(times, values).unwrap();
//!
//! let genetic_config = GeneticConfig {
//!     input_names: vec!["y".to_string()],
//!     constant_count: 0,
//!     unary_operations: vec![UnaryOp::Negate],
//!     binary_operations: vec![BinaryOp::Add, BinaryOp::Multiply],
//!     weight_init_range: 0.1,
//!     ..GeneticConfig::default()
//! };
//! let evaluator =
//!     FitnessEvaluator::new(series, vec![Covariate::State], FitnessConfig::default()).unwrap();
//! evaluator.ensure_inputs(&genetic_config).unwrap();
//!
//! let population_config = PopulationConfig {
//!     size: 50,
//!     max_generations: 10,
//!     seed: Some(7),
//!     ..PopulationConfig::default()
//! };
//! let mut population =
//!     Population::<_, _, ExprGenome>::new(population_config, genetic_config.clone()).unwrap();
//! let summary = population.run(|genome| evaluator.evaluate(genome));
//!
//! let best = summary.best.unwrap();
//! assert!(best.evaluation().fitness > 0.0);
//! println!("dy/dt = {}", Equation::from_genome(&best, &genetic_config.input_names));
//!
//! let ranking = GenomeSummary::rank_all(population.hall_of_fame().iter(), &genetic_config.input_names);
//! assert_eq!(ranking[0].fitness, best.evaluation().fitness);
//! ```

pub mod equations;
pub mod fitness;
pub mod genomics;
pub mod networks;
pub mod summary;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
