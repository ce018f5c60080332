use crate::GenomeValidationError;

/// Errors detected while validating the configuration
/// of a [`Population`](crate::Population).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("population size must be positive")]
    EmptyPopulation,
    #[error("maximum generation count must be positive")]
    NoGenerations,
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("survival threshold of 0 leaves no parents to mate")]
    NoSurvivors,
    #[error("tournament size must be positive")]
    EmptyTournament,
    #[error("target fitness must be finite, got {0}")]
    InvalidTargetFitness(f64),
    #[error("invalid compatibility threshold bounds [{lower}, {upper}]")]
    InvalidThresholdBounds { lower: f64, upper: f64 },
    #[error("initial compatibility threshold {0} lies outside its bounds")]
    ThresholdOutOfBounds(f64),
    #[error("threshold gain must be finite and non-negative, got {0}")]
    InvalidThresholdGain(f64),
    #[error("target species count must be positive")]
    NoTargetSpecies,
    #[error("stagnation threshold must be positive")]
    NoStagnationAllowance,
    #[error("hall of fame size must be positive")]
    EmptyHallOfFame,
    #[error("invalid genetic configuration: {0}")]
    Genetic(#[source] GenomeValidationError),
}

/// Errors returned when attempting to evolve a population
/// in the wrong phase of its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EvolutionError {
    #[error("attempted evolution of a population that has not been evaluated")]
    Unevaluated,
    #[error("attempted evolution of a terminated population")]
    Terminated,
}
