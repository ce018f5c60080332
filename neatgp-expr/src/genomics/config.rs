use crate::genomics::{BinaryOp, GeneticConfigError, UnaryOp};
use crate::Innovation;

use serde::{Deserialize, Serialize};

/// Names the expression parser reserves for functions.
const RESERVED_NAMES: [&str; 3] = ["exp", "log", "sqrt"];

/// Configuration data for expression genome generation
/// and inter-genome operations.
///
/// All quantities expressing probabilities must be in
/// the range [0.0, 1.0]; [`validate`] checks this and the
/// remaining constraints.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Names of the input variables, in the order their
    /// values are passed to evaluation. Must be distinct
    /// identifiers.
    pub input_names: Vec<String>,
    /// Number of constant nodes in every genome.
    pub constant_count: usize,
    /// Constants are initialized uniformly over ±this range.
    pub constant_init_range: f64,
    /// Operations available to single-operand nodes.
    pub unary_operations: Vec<UnaryOp>,
    /// Operations available to two-operand nodes.
    pub binary_operations: Vec<BinaryOp>,
    /// Initial operation of the output node.
    pub output_operation: BinaryOp,
    /// Chance that each operand slot of the output node is
    /// connected to a random variable or constant during
    /// initial genome generation.
    pub initial_expression_chance: f64,
    /// Connection weights are initialized uniformly over ±this range.
    pub weight_init_range: f64,
    /// Maximum magnitude of a connection weight.
    pub weight_bound: f64,
    /// Chance of each connection weight being mutated.
    pub weight_mutation_chance: f64,
    /// Standard deviation of weight perturbations.
    pub weight_mutation_power: f64,
    /// Chance of a mutated weight being redrawn instead of perturbed.
    pub weight_reset_chance: f64,
    /// Chance of each constant being mutated.
    pub constant_mutation_chance: f64,
    /// Standard deviation of constant perturbations.
    pub constant_mutation_power: f64,
    /// Chance of a mutated constant being redrawn instead of perturbed.
    pub constant_reset_chance: f64,
    /// Maximum magnitude of a constant.
    pub constant_bound: f64,
    /// Chance of a node addition mutation.
    pub add_node_chance: f64,
    /// Chance that an added node is binary, if binary
    /// operations are available. Always 1 if no unary
    /// operations are.
    pub binary_node_chance: f64,
    /// Chance of a connection addition mutation.
    pub add_connection_chance: f64,
    /// Maximum number of attempts at finding a viable
    /// pair of nodes for a connection addition.
    pub max_add_connection_attempts: usize,
    /// Chance of each operator node changing its operation.
    pub change_operation_chance: f64,
    /// Chance that a connection disabled in the offspring,
    /// but enabled in a parent, is re-enabled.
    pub reenable_chance: f64,
    /// Weight of unmatched connections in genetic distance.
    pub disjoint_coefficient: f64,
    /// Weight of the mean matching-weight difference in genetic distance.
    pub weight_coefficient: f64,
}

impl Default for GeneticConfig {
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_names: vec!["x".to_string()],
            constant_count: 1,
            constant_init_range: 1.0,
            unary_operations: UnaryOp::ALL.to_vec(),
            binary_operations: BinaryOp::ALL.to_vec(),
            output_operation: BinaryOp::Add,
            initial_expression_chance: 1.0,
            weight_init_range: 1.0,
            weight_bound: 10.0,
            weight_mutation_chance: 0.8,
            weight_mutation_power: 0.1,
            weight_reset_chance: 0.1,
            constant_mutation_chance: 0.8,
            constant_mutation_power: 0.1,
            constant_reset_chance: 0.1,
            constant_bound: 10.0,
            add_node_chance: 0.03,
            binary_node_chance: 0.25,
            add_connection_chance: 0.05,
            max_add_connection_attempts: 20,
            change_operation_chance: 0.02,
            reenable_chance: 0.25,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
        }
    }
}

impl GeneticConfig {
    /// Returns the number of variable and constant nodes.
    pub fn source_count(&self) -> usize {
        self.input_names.len() + self.constant_count
    }

    /// Returns the id of the output node.
    pub fn output_id(&self) -> Innovation {
        self.source_count()
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    ///
    /// let config = GeneticConfig {
    ///     input_names: vec!["exp".into()],
    ///     ..GeneticConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), GeneticConfigError> {
        if self.input_names.is_empty() {
            return Err(GeneticConfigError::NoInputs);
        }
        for (i, name) in self.input_names.iter().enumerate() {
            if !is_identifier(name) || RESERVED_NAMES.contains(&name.as_str()) {
                return Err(GeneticConfigError::InvalidInputName(name.clone()));
            }
            if self.input_names[..i].contains(name) {
                return Err(GeneticConfigError::DuplicateInputName(name.clone()));
            }
        }
        if self.unary_operations.is_empty() && self.binary_operations.is_empty() {
            return Err(GeneticConfigError::NoOperations);
        }

        for (name, value) in [
            ("initial_expression_chance", self.initial_expression_chance),
            ("weight_mutation_chance", self.weight_mutation_chance),
            ("weight_reset_chance", self.weight_reset_chance),
            ("constant_mutation_chance", self.constant_mutation_chance),
            ("constant_reset_chance", self.constant_reset_chance),
            ("add_node_chance", self.add_node_chance),
            ("binary_node_chance", self.binary_node_chance),
            ("add_connection_chance", self.add_connection_chance),
            ("change_operation_chance", self.change_operation_chance),
            ("reenable_chance", self.reenable_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GeneticConfigError::InvalidProbability { name, value });
            }
        }

        for (name, value) in [
            ("weight_init_range", self.weight_init_range),
            ("weight_bound", self.weight_bound),
            ("constant_init_range", self.constant_init_range),
            ("constant_bound", self.constant_bound),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeneticConfigError::NonPositive { name, value });
            }
        }
        if self.weight_init_range > self.weight_bound {
            return Err(GeneticConfigError::RangeExceedsBound {
                name: "weight_init_range",
            });
        }
        if self.constant_init_range > self.constant_bound {
            return Err(GeneticConfigError::RangeExceedsBound {
                name: "constant_init_range",
            });
        }

        for (name, value) in [
            ("weight_mutation_power", self.weight_mutation_power),
            ("constant_mutation_power", self.constant_mutation_power),
            ("disjoint_coefficient", self.disjoint_coefficient),
            ("weight_coefficient", self.weight_coefficient),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GeneticConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("Mn"));
        assert!(is_identifier("_t0"));
        assert!(!is_identifier("0t"));
        assert!(!is_identifier("acid concentration"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn input_names_must_be_parseable() {
        for name in ["acid concentration", "sqrt", "2t"] {
            let config = GeneticConfig {
                input_names: vec![name.into()],
                ..GeneticConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(GeneticConfigError::InvalidInputName(name.into()))
            );
        }
    }

    #[test]
    fn duplicate_inputs_are_rejected() {
        let config = GeneticConfig {
            input_names: vec!["Mn".into(), "t".into(), "Mn".into()],
            ..GeneticConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(GeneticConfigError::DuplicateInputName("Mn".into()))
        );
    }

    #[test]
    fn empty_operation_sets_are_rejected() {
        let config = GeneticConfig {
            unary_operations: vec![],
            binary_operations: vec![],
            ..GeneticConfig::default()
        };
        assert_eq!(config.validate(), Err(GeneticConfigError::NoOperations));

        let config = GeneticConfig {
            unary_operations: vec![],
            ..GeneticConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn probabilities_are_checked() {
        let config = GeneticConfig {
            reenable_chance: 1.5,
            ..GeneticConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GeneticConfigError::InvalidProbability {
                name: "reenable_chance",
                ..
            })
        ));
    }

    #[test]
    fn init_range_within_bound() {
        let config = GeneticConfig {
            weight_init_range: 20.0,
            ..GeneticConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn node_layout() {
        let config = GeneticConfig {
            input_names: vec!["Mn".into(), "Xc".into()],
            constant_count: 3,
            ..GeneticConfig::default()
        };
        assert_eq!(config.source_count(), 5);
        assert_eq!(config.output_id(), 5);
    }
}
