use crate::genomics::{Connection, ExprGenome, GenomeError, Node, Operation};
use crate::Innovation;

use neatgp::Evaluation;
use serde::{Deserialize, Serialize};

/// A serializable, self-contained description of a
/// genome's computation graph, without evaluation data.
///
/// Node ids, operations and connection genes are kept
/// verbatim, so that a description can be turned back
/// into an identical genome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Input variable names, indexed by [`Operation::Variable`].
    pub inputs: Vec<String>,
    /// Id of the output node.
    pub output: Innovation,
    /// Every node, as `(id, operation)`.
    pub nodes: Vec<(Innovation, Operation)>,
    pub connections: Vec<Connection>,
}

impl ExprGenome {
    /// Describes the genome's graph, naming its
    /// variables with `input_names`.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = ExprGenome::new(&config, &mut rand::rngs::StdRng::seed_from_u64(3));
    ///
    /// let description = genome.describe(&config.input_names);
    /// let json = serde_json::to_string(&description).unwrap();
    /// let restored = ExprGenome::from_description(&serde_json::from_str(&json).unwrap()).unwrap();
    ///
    /// let ids = |g: &ExprGenome| g.nodes().map(|n| (n.id(), n.layer())).collect::<Vec<_>>();
    /// assert_eq!(ids(&restored), ids(&genome));
    /// assert_eq!(restored.connections().count(), genome.connections().count());
    /// ```
    pub fn describe(&self, input_names: &[String]) -> GraphDescription {
        GraphDescription {
            inputs: input_names.to_vec(),
            output: self.output,
            nodes: self.nodes.iter().map(|n| (n.id(), n.operation())).collect(),
            connections: self.connections.clone(),
        }
    }

    /// Rebuilds a genome from its description.
    ///
    /// # Errors
    /// Returns an error if the described graph breaks any
    /// structural invariant, or reads an undeclared variable.
    pub fn from_description(description: &GraphDescription) -> Result<ExprGenome, GenomeError> {
        let mut nodes: Vec<Node> = description
            .nodes
            .iter()
            .map(|&(id, operation)| Node::new(id, operation))
            .collect();
        nodes.sort_by_key(Node::id);
        for node in &nodes {
            if let Operation::Variable(index) = node.operation() {
                if index >= description.inputs.len() {
                    return Err(GenomeError::UnknownVariable {
                        node: node.id(),
                        index,
                        inputs: description.inputs.len(),
                    });
                }
            }
        }

        let mut connections = description.connections.clone();
        connections.sort_by_key(Connection::innovation);

        let mut genome = ExprGenome {
            nodes,
            connections,
            output: description.output,
            evaluation: Evaluation::default(),
        };
        genome.refresh_layers()?;
        genome.check_invariants()?;
        Ok(genome)
    }
}
