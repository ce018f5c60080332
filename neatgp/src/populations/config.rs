use super::errors::ConfigError;

use serde::{Deserialize, Serialize};

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; this is
/// checked by [`validate`], which is called when
/// a [`Population`] is created.
///
/// [`validate`]: PopulationConfig::validate
/// [`Population`]: crate::Population
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: usize,
    /// Number of generations after which evolution stops.
    pub max_generations: usize,
    /// Fitness at or above which evolution stops.
    pub target_fitness: f64,
    /// Seed for the population's random number generator.
    /// If `None`, the generator is seeded from system entropy.
    pub seed: Option<u64>,
    /// Top n of each species which is copied
    /// as-is to the next generation.
    pub elitism: usize,
    /// Top % of each species which can participate
    /// in mating.
    pub survival_threshold: f64,
    /// Number of contestants in each parent selection tournament.
    pub tournament_size: usize,
    /// Chance that offspring will be the result of crossover
    /// (as opposed to mutation of a single parent).
    pub crossover_chance: f64,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f64,
    /// Initial genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub compatibility_threshold: f64,
    /// Desired amount of species in the population.
    pub target_species: usize,
    /// Proportional gain of the threshold controller: after
    /// each speciation the threshold moves by
    /// `threshold_gain × (species count - target_species)`.
    pub threshold_gain: f64,
    /// Lower and upper bounds of the compatibility threshold.
    pub threshold_bounds: (f64, f64),
    /// Number of generations without a fitness increase
    /// after which a species stops receiving offspring.
    pub stagnation_threshold: usize,
    /// Number of genomes kept in the hall of fame.
    pub hall_of_fame_size: usize,
}

impl Default for PopulationConfig {
    /// # Examples
    /// ```
    /// use neatgp::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     size: 100,
    ///     max_generations: 50,
    ///     seed: Some(7),
    ///     ..PopulationConfig::default()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: 150,
            max_generations: 100,
            target_fitness: 0.999,
            seed: None,
            elitism: 1,
            survival_threshold: 0.5,
            tournament_size: 3,
            crossover_chance: 0.75,
            interspecies_mating_chance: 0.001,
            compatibility_threshold: 3.0,
            target_species: 5,
            threshold_gain: 0.1,
            threshold_bounds: (0.1, 100.0),
            stagnation_threshold: 15,
            hall_of_fame_size: 10,
        }
    }
}

impl PopulationConfig {
    /// Checks that every parameter is within its valid range.
    ///
    /// # Errors
    /// Returns the first offending parameter found.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{ConfigError, PopulationConfig};
    ///
    /// let config = PopulationConfig {
    ///     size: 0,
    ///     ..PopulationConfig::default()
    /// };
    /// assert!(matches!(config.validate(), Err(ConfigError::EmptyPopulation)));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        for (name, value) in [
            ("survival_threshold", self.survival_threshold),
            ("crossover_chance", self.crossover_chance),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if self.survival_threshold == 0.0 {
            return Err(ConfigError::NoSurvivors);
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::EmptyTournament);
        }
        if !self.target_fitness.is_finite() {
            return Err(ConfigError::InvalidTargetFitness(self.target_fitness));
        }
        let (lower, upper) = self.threshold_bounds;
        if !(lower > 0.0 && lower <= upper && upper.is_finite()) {
            return Err(ConfigError::InvalidThresholdBounds { lower, upper });
        }
        if !(lower..=upper).contains(&self.compatibility_threshold) {
            return Err(ConfigError::ThresholdOutOfBounds(self.compatibility_threshold));
        }
        if !(self.threshold_gain >= 0.0 && self.threshold_gain.is_finite()) {
            return Err(ConfigError::InvalidThresholdGain(self.threshold_gain));
        }
        if self.target_species == 0 {
            return Err(ConfigError::NoTargetSpecies);
        }
        if self.stagnation_threshold == 0 {
            return Err(ConfigError::NoStagnationAllowance);
        }
        if self.hall_of_fame_size == 0 {
            return Err(ConfigError::EmptyHallOfFame);
        }
        Ok(())
    }
}
