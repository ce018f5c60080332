//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>,
//! geared toward genetic programming and symbolic regression.
//!
//! It is designed to be highly-configurable, allowing arbitrary user-defined
//! genomic structures via the `Genome` trait. Populations are evaluated in
//! parallel, speciated with a self-adjusting compatibility threshold, and keep
//! a hall of fame of the best genomes found. Generational population logging
//! is also supported. An expression-graph genome representation, whose
//! fitness is measured by integrating the expression as an ordinary
//! differential equation, is supplied via the `neatgp-expr` crate.
//!
//! Diagnostic output goes through the [`log`](https://docs.rs/log) facade;
//! install any logger implementation to see it.
//!
//! # Example usage: discovering a decay law, using `neatgp-expr`
//! ```no_run
//! use neatgp::{Population, PopulationConfig};
//! use neatgp_expr::equations::Equation;
//! use neatgp_expr::fitness::{Covariate, FitnessConfig, FitnessEvaluator, TimeSeries};
//! use neatgp_expr::genomics::{BinaryOp, ExprGenome, GeneticConfig, UnaryOp};
//!
//! let series = TimeSeries::new(
//!     vec![0.0, 30.0, 60.0, 90.0],
//!     vec![51.285, 25.447, 18.313, 7.904],
//! )
//! .unwrap();
//! let evaluator =
//!     FitnessEvaluator::new(series, vec![Covariate::State], FitnessConfig::default()).unwrap();
//!
//! let genetic_config = GeneticConfig {
//!     input_names: vec!["Mn".to_string()],
//!     constant_count: 0,
//!     unary_operations: vec![UnaryOp::Negate],
//!     binary_operations: vec![BinaryOp::Add, BinaryOp::Subtract, BinaryOp::Multiply],
//!     ..GeneticConfig::default()
//! };
//! let population_config = PopulationConfig {
//!     size: 100,
//!     max_generations: 50,
//!     seed: Some(2024),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population =
//!     Population::<_, _, ExprGenome>::new(population_config, genetic_config.clone()).unwrap();
//! let summary = population.run(|g| evaluator.evaluate(g));
//!
//! if let Some(best) = summary.best {
//!     let equation = Equation::from_genome(&best, &genetic_config.input_names);
//!     println!("dMn/dt = {}", equation);
//! }
//! ```

mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
