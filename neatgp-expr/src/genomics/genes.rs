use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Connections are the genes of an expression genome.
/// Each one feeds the (weighted) value of its input
/// node into one operand slot of its output node.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    innovation: Innovation,
    input: Innovation,
    output: Innovation,
    slot: usize,
    weight: f64,
    enabled: bool,
}

impl Connection {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::Connection;
    ///
    /// let connection = Connection::new(42, 0, 3, 1, -0.5);
    /// assert_eq!(connection.innovation(), 42);
    /// assert_eq!(connection.endpoints(), (0, 3));
    /// assert_eq!(connection.slot(), 1);
    /// assert!(connection.enabled());
    /// ```
    pub fn new(
        innovation: Innovation,
        input: Innovation,
        output: Innovation,
        slot: usize,
        weight: f64,
    ) -> Connection {
        Connection {
            innovation,
            input,
            output,
            slot,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight, uniform over
    /// ±[`weight_init_range`].
    ///
    /// [`weight_init_range`]: GeneticConfig::weight_init_range
    pub(super) fn random_weight<R: Rng>(config: &GeneticConfig, rng: &mut R) -> f64 {
        rng.gen_range(-config.weight_init_range..=config.weight_init_range)
    }

    /// Mutates the weight with probability [`weight_mutation_chance`]:
    /// either redrawn ([`weight_reset_chance`]) or perturbed by
    /// gaussian noise of deviation [`weight_mutation_power`],
    /// then clamped to ±[`weight_bound`].
    ///
    /// [`weight_mutation_chance`]: GeneticConfig::weight_mutation_chance
    /// [`weight_reset_chance`]: GeneticConfig::weight_reset_chance
    /// [`weight_mutation_power`]: GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: GeneticConfig::weight_bound
    pub(super) fn mutate_weight<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        if rng.gen::<f64>() >= config.weight_mutation_chance {
            return;
        }
        if rng.gen::<f64>() < config.weight_reset_chance {
            self.weight = Self::random_weight(config, rng);
        } else {
            let noise: f64 = rng.sample(StandardNormal);
            self.weight += noise * config.weight_mutation_power;
        }
        self.weight = self.weight.clamp(-config.weight_bound, config.weight_bound);
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn input(&self) -> Innovation {
        self.input
    }

    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the operand slot of the output node this connection feeds.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Disabled connections contribute nothing to
    /// evaluation, but are kept for crossover alignment.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the input and output node ids.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}.{}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.input,
            self.output,
            self.slot,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn weight_mutation_stays_bounded() {
        let config = GeneticConfig {
            weight_mutation_chance: 1.0,
            weight_mutation_power: 50.0,
            weight_bound: 2.0,
            ..GeneticConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut connection = Connection::new(0, 0, 1, 0, 1.9);
        for _ in 0..100 {
            connection.mutate_weight(&config, &mut rng);
            assert!(connection.weight().abs() <= 2.0);
        }
    }

    #[test]
    fn no_mutation_without_chance() {
        let config = GeneticConfig {
            weight_mutation_chance: 0.0,
            ..GeneticConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut connection = Connection::new(0, 0, 1, 0, 0.3);
        connection.mutate_weight(&config, &mut rng);
        assert_eq!(connection.weight(), 0.3);
    }

    #[test]
    fn display_marks_disabled() {
        let mut connection = Connection::new(5, 0, 2, 1, 1.0);
        assert_eq!(connection.to_string(), "5[0->2.1, 1.000]");
        connection.set_enabled(false);
        assert_eq!(connection.to_string(), "(5[0->2.1, 1.000])");
    }
}
