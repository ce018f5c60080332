//! Compiled, reusable evaluators of expression genomes.
mod expression_network;

pub use expression_network::ExpressionNetwork;
