use crate::genomics::{ExprGenome, Operation};

use ahash::RandomState;

use std::collections::HashMap;

/// A single node evaluation.
#[derive(Clone, Debug)]
struct Step {
    operation: Operation,
    /// Value index and weight of each operand slot's source.
    operands: [Option<(usize, f64)>; 2],
}

/// An expression genome compiled into a flat list of
/// evaluation steps, in ascending layer order.
///
/// Disabled connections are dropped at compilation.
/// Building the network once and reusing it for every
/// evaluation avoids repeated graph traversal.
#[derive(Clone, Debug)]
pub struct ExpressionNetwork {
    steps: Vec<Step>,
    values: Vec<f64>,
    output: usize,
}

impl From<&ExprGenome> for ExpressionNetwork {
    /// Compiles the passed genome.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use neatgp_expr::networks::ExpressionNetwork;
    /// use rand::SeedableRng;
    ///
    /// let genome = ExprGenome::new(&GeneticConfig::default(), &mut rand::rngs::StdRng::seed_from_u64(1));
    /// let mut network = ExpressionNetwork::from(&genome);
    /// assert!(network.evaluate_at(&[2.0]).is_finite());
    /// ```
    fn from(genome: &ExprGenome) -> ExpressionNetwork {
        let mut order: Vec<_> = genome.nodes().collect();
        order.sort_by(|a, b| a.layer().total_cmp(&b.layer()).then(a.id().cmp(&b.id())));

        let positions: HashMap<_, _, RandomState> = order
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id(), position))
            .collect();

        let mut steps: Vec<Step> = order
            .iter()
            .map(|node| Step {
                operation: node.operation(),
                operands: [None, None],
            })
            .collect();
        for c in genome.connections().filter(|c| c.enabled()) {
            if let (Some(&input), Some(&output)) =
                (positions.get(&c.input()), positions.get(&c.output()))
            {
                if let Some(operand) = steps[output].operands.get_mut(c.slot()) {
                    *operand = Some((input, c.weight()));
                }
            }
        }

        ExpressionNetwork {
            values: vec![0.0; steps.len()],
            output: positions.get(&genome.output()).copied().unwrap_or(0),
            steps,
        }
    }
}

impl ExpressionNetwork {
    /// Evaluates the expression with the given input
    /// variable values. Variables without a value
    /// read as 0.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{
    ///     ExprGenome, GeneticConfig, InnovationTracker, UnaryOp,
    /// };
    /// use neatgp_expr::networks::ExpressionNetwork;
    /// use rand::SeedableRng;
    ///
    /// // Output node adds its operands.
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 0.0,
    ///     ..GeneticConfig::default()
    /// };
    /// let tracker = InnovationTracker::new(&config);
    /// let mut genome = ExprGenome::new(&config, &mut rand::rngs::StdRng::seed_from_u64(0));
    /// genome.add_connection(&tracker, 0, 2, 0, -0.5).unwrap();
    /// let split = genome.connections().next().unwrap().innovation();
    /// genome.split_connection(&tracker, split, UnaryOp::Square).unwrap();
    ///
    /// // -0.5 * x², with slot 1 empty.
    /// let mut network = ExpressionNetwork::from(&genome);
    /// assert_eq!(network.evaluate_at(&[3.0]), -4.5);
    /// assert_eq!(network.evaluate_at(&[]), 0.0);
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f64]) -> f64 {
        for (i, step) in self.steps.iter().enumerate() {
            let operand = |slot: usize| {
                step.operands[slot].map_or(0.0, |(source, weight)| weight * self.values[source])
            };
            let value = match step.operation {
                Operation::Variable(index) => inputs.get(index).copied().unwrap_or(0.0),
                Operation::Constant(value) => value,
                Operation::Unary(op) => op.apply(operand(0)),
                Operation::Binary(op) => op.apply(operand(0), operand(1)),
            };
            self.values[i] = value;
        }
        self.values.get(self.output).copied().unwrap_or(0.0)
    }

    /// Returns the number of evaluation steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{
        BinaryOp, Connection, GeneticConfig, GraphDescription, InnovationTracker, UnaryOp,
    };

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genome(nodes: Vec<(usize, Operation)>, output: usize, connections: Vec<Connection>) -> ExprGenome {
        ExprGenome::from_description(&GraphDescription {
            inputs: vec!["x".into(), "y".into()],
            output,
            nodes,
            connections,
        })
        .unwrap()
    }

    #[test]
    fn slots_are_ordered() {
        let genome = genome(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Variable(1)),
                (2, Operation::Binary(BinaryOp::Subtract)),
            ],
            2,
            vec![
                Connection::new(0, 1, 2, 0, 1.0),
                Connection::new(1, 0, 2, 1, 2.0),
            ],
        );
        let mut network = ExpressionNetwork::from(&genome);
        assert_eq!(network.evaluate_at(&[1.0, 10.0]), 10.0 - 2.0);
    }

    #[test]
    fn disabled_connections_read_zero() {
        let mut disabled = Connection::new(1, 0, 2, 1, 5.0);
        disabled.set_enabled(false);
        let genome = genome(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Constant(3.0)),
                (2, Operation::Binary(BinaryOp::Add)),
            ],
            2,
            vec![Connection::new(0, 1, 2, 0, 1.0), disabled],
        );
        let mut network = ExpressionNetwork::from(&genome);
        assert_eq!(network.evaluate_at(&[100.0]), 3.0);
    }

    #[test]
    fn guarded_division() {
        let genome = genome(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Variable(1)),
                (2, Operation::Binary(BinaryOp::Divide)),
                (3, Operation::Unary(UnaryOp::Log)),
            ],
            2,
            vec![
                Connection::new(0, 0, 3, 0, 1.0),
                Connection::new(1, 3, 2, 0, 1.0),
                Connection::new(2, 1, 2, 1, 1.0),
            ],
        );
        let mut network = ExpressionNetwork::from(&genome);
        assert_eq!(network.evaluate_at(&[-1.0, 2.0]), 0.0);
        assert_eq!(network.evaluate_at(&[1.0, 0.0]), 0.0);
        assert!((network.evaluate_at(&[std::f64::consts::E, 2.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reuse_gives_identical_results() {
        let config = GeneticConfig {
            input_names: vec!["x".into(), "y".into()],
            ..GeneticConfig::default()
        };
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(12);
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..10 {
            let _ = genome.mutate_add_node(&tracker, &config, &mut rng);
        }
        let mut network = ExpressionNetwork::from(&genome);
        let first = network.evaluate_at(&[0.3, -1.2]);
        network.evaluate_at(&[5.0, 5.0]);
        let again = network.evaluate_at(&[0.3, -1.2]);
        assert!(first == again || (first.is_nan() && again.is_nan()));
        assert_eq!(network.len(), genome.nodes().count());
    }
}
