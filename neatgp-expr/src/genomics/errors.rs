use crate::Innovation;

use thiserror::Error;

/// An error type indicating an unusable genetic configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneticConfigError {
    #[error("at least one input name is required")]
    NoInputs,
    #[error("input name {0:?} is not a valid identifier")]
    InvalidInputName(String),
    #[error("input name {0:?} is used more than once")]
    DuplicateInputName(String),
    #[error("no unary or binary operations are allowed")]
    NoOperations,
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} exceeds its corresponding bound")]
    RangeExceedsBound { name: &'static str },
}

/// An error type indicating a structurally invalid
/// genome, or a failed structural operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenomeError {
    #[error("no node with id {0}")]
    UnknownNode(Innovation),
    #[error("duplicate node with id {0}")]
    DuplicateNode(Innovation),
    #[error("no connection with innovation {0}")]
    UnknownConnection(Innovation),
    #[error("connection {0} is disabled")]
    DisabledConnection(Innovation),
    #[error("duplicate connection with innovation {0}")]
    DuplicateConnection(Innovation),
    #[error("a connection from node {input} into slot {slot} of node {output} already exists")]
    DuplicateEndpoints {
        input: Innovation,
        output: Innovation,
        slot: usize,
    },
    #[error("output node {0} is missing or takes no operands")]
    InvalidOutput(Innovation),
    #[error("output node {0} is used as a connection input")]
    OutputAsInput(Innovation),
    #[error("slot {slot} is out of range for node {node} with arity {arity}")]
    SlotOutOfRange {
        node: Innovation,
        slot: usize,
        arity: usize,
    },
    #[error("slot {slot} of node {node} has more than one enabled connection")]
    SlotConflict { node: Innovation, slot: usize },
    #[error("connection {input} -> {output} closes a cycle")]
    Cycle { input: Innovation, output: Innovation },
    #[error("layers of connection {input} -> {output} are not increasing")]
    LayerOrder { input: Innovation, output: Innovation },
    #[error("node {node} reads variable {index}, but only {inputs} inputs exist")]
    UnknownVariable {
        node: Innovation,
        index: usize,
        inputs: usize,
    },
    #[error("node {0} holds a non-finite value")]
    NonFinite(Innovation),
    #[error("genome has no enabled connections to split")]
    NoEnabledConnection,
    #[error("no viable node pair found for a new connection")]
    NoConnectionFound,
    #[error("no operation available for a new node")]
    NoOperationAvailable,
}
