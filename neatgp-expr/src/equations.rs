//! Human-readable renderings of expression genomes.
//!
//! An [`Equation`] holds the plain-text and LaTeX forms
//! of a genome's expression. The plain form can be read
//! back with [`parse`], and evaluates to the same value
//! as the genome's [`ExpressionNetwork`], since both use
//! the same guarded operations.
//!
//! [`ExpressionNetwork`]: crate::networks::ExpressionNetwork
mod decoder;
mod parser;

pub use decoder::Equation;
pub use parser::{parse, Expression, ParseError};
