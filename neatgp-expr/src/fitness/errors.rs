use thiserror::Error;

/// An error type indicating unusable observations,
/// covariates or fitness configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitnessError {
    #[error("at least 2 observations are required, got {0}")]
    TooFewPoints(usize),
    #[error("{times} observation times but {values} values")]
    LengthMismatch { times: usize, values: usize },
    #[error("observation time {0} is not finite")]
    NonFiniteTime(usize),
    #[error("observed value {0} is not finite")]
    NonFiniteValue(usize),
    #[error("observation time {0} does not follow its predecessor")]
    NonIncreasingTime(usize),
    #[error("the initial observed value must be nonzero")]
    ZeroInitialValue,
    #[error("{name} is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("expected {expected} point weights, got {found}")]
    WeightCount { expected: usize, found: usize },
    #[error("point weight {0} is negative or not finite")]
    InvalidWeight(usize),
    #[error("point weights sum to zero")]
    ZeroWeights,
    #[error("at least one covariate is required")]
    NoCovariates,
    #[error("{covariates} covariates are supplied to genomes with {inputs} inputs")]
    InputMismatch { covariates: usize, inputs: usize },
}
