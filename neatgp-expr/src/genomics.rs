//! Expression genomes: layered computation graphs of
//! [`Node`]s joined by weighted [`Connection`]s.
mod config;
mod description;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use description::GraphDescription;
pub use errors::{GeneticConfigError, GenomeError};
pub use genes::Connection;
pub use history::{InnovationTracker, SplitRecord};
pub use nodes::{BinaryOp, Node, Operation, UnaryOp, DIVISION_EPSILON, EXP_ARGUMENT_BOUND};

use crate::Innovation;

use ahash::RandomState;
use neatgp::{Evaluation, Genome, GenomeValidationError};
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A candidate right-hand side of an ODE, encoded as
/// a directed acyclic graph.
///
/// Every genome holds one [`Variable`] node per input and
/// one [`Constant`] node per configured constant, plus a
/// single binary output node. Further nodes are added by
/// splitting connections. Nodes are kept sorted by id, and
/// connections by innovation number.
///
/// [`Variable`]: Operation::Variable
/// [`Constant`]: Operation::Constant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExprGenome {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    output: Innovation,
    evaluation: Evaluation,
}

impl ExprGenome {
    /// Creates a new genome according to the specified configuration.
    ///
    /// Each operand slot of the output node is connected to a random
    /// variable or constant with probability
    /// [`initial_expression_chance`].
    ///
    /// [`initial_expression_chance`]: GeneticConfig::initial_expression_chance
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     input_names: vec!["Mn".into(), "t".into()],
    ///     constant_count: 2,
    ///     ..GeneticConfig::default()
    /// };
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let genome = ExprGenome::new(&config, &mut rng);
    ///
    /// // 2 variables, 2 constants and the output node.
    /// assert_eq!(genome.nodes().count(), 5);
    /// assert_eq!(genome.output(), 4);
    /// assert_eq!(genome.connections().count(), 2);
    /// ```
    pub fn new<R: Rng>(config: &GeneticConfig, rng: &mut R) -> ExprGenome {
        let inputs = config.input_names.len();
        let output = config.output_id();

        let mut nodes = Vec::with_capacity(output + 1);
        for index in 0..inputs {
            nodes.push(Node::new(index, Operation::Variable(index)));
        }
        for constant in 0..config.constant_count {
            let value = random_constant(config, rng);
            nodes.push(Node::new(inputs + constant, Operation::Constant(value)));
        }
        nodes.push(Node::new(
            output,
            Operation::Binary(config.output_operation),
        ));

        let mut connections = vec![];
        for slot in 0..2 {
            if output > 0 && rng.gen::<f64>() < config.initial_expression_chance {
                let input = rng.gen_range(0..output);
                connections.push(Connection::new(
                    history::initial_innovation(input, slot),
                    input,
                    output,
                    slot,
                    Connection::random_weight(config, rng),
                ));
            }
        }
        connections.sort_by_key(Connection::innovation);

        let mut genome = ExprGenome {
            nodes,
            connections,
            output,
            evaluation: Evaluation::default(),
        };
        genome.relayer();
        genome
    }

    /// Returns the genome's structural complexity: the
    /// number of nodes plus the number of enabled connections.
    pub fn complexity(&self) -> usize {
        self.nodes.len() + self.connections.iter().filter(|c| c.enabled()).count()
    }

    /// Returns an iterator over the genome's nodes, sorted by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns an iterator over the genome's connections,
    /// sorted by innovation number.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: Innovation) -> Option<&Node> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    /// Returns the id of the output node.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the enabled connection feeding `slot` of node `id`.
    pub fn operand(&self, id: Innovation, slot: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.enabled() && c.output() == id && c.slot() == slot)
    }

    fn node_index(&self, id: Innovation) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, Node::id).ok()
    }

    fn has_node(&self, id: Innovation) -> bool {
        self.node_index(id).is_some()
    }

    fn slot_occupied(&self, id: Innovation, slot: usize) -> bool {
        self.operand(id, slot).is_some()
    }

    /// Returns `true` if a path of connections, enabled
    /// or not, leads from `from` to `to`.
    fn reaches(&self, from: Innovation, to: Innovation) -> bool {
        let mut pending = vec![from];
        let mut visited = HashSet::with_hasher(RandomState::new());
        while let Some(id) = pending.pop() {
            if id == to {
                return true;
            }
            if visited.insert(id) {
                pending.extend(
                    self.connections
                        .iter()
                        .filter(|c| c.input() == id)
                        .map(Connection::output),
                );
            }
        }
        false
    }

    /// Computes the layer of every node by topological sort
    /// over all connections, enabled or not.
    ///
    /// # Errors
    /// Returns an error if a connection refers to a missing
    /// node, the graph has a cycle, or the output is missing.
    fn compute_layers(&self) -> Result<Vec<usize>, GenomeError> {
        let count = self.nodes.len();
        let mut successors = vec![vec![]; count];
        let mut pending_inputs = vec![0usize; count];
        for c in &self.connections {
            let input = self
                .node_index(c.input())
                .ok_or(GenomeError::UnknownNode(c.input()))?;
            let output = self
                .node_index(c.output())
                .ok_or(GenomeError::UnknownNode(c.output()))?;
            successors[input].push(output);
            pending_inputs[output] += 1;
        }

        let mut layers = vec![0; count];
        let mut sorted = vec![false; count];
        let mut ready: Vec<usize> = (0..count).filter(|&i| pending_inputs[i] == 0).collect();
        while let Some(i) = ready.pop() {
            sorted[i] = true;
            if !self.nodes[i].operation().is_source() {
                layers[i] = layers[i].max(1);
            }
            for &j in &successors[i] {
                layers[j] = layers[j].max(layers[i] + 1);
                pending_inputs[j] -= 1;
                if pending_inputs[j] == 0 {
                    ready.push(j);
                }
            }
        }

        if let Some(c) = self.connections.iter().find(|c| {
            self.node_index(c.input()).map_or(false, |i| !sorted[i])
                && self.node_index(c.output()).map_or(false, |o| !sorted[o])
        }) {
            return Err(GenomeError::Cycle {
                input: c.input(),
                output: c.output(),
            });
        }

        let output = self
            .node_index(self.output)
            .ok_or(GenomeError::InvalidOutput(self.output))?;
        let deepest = layers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != output)
            .map(|(_, &l)| l)
            .max()
            .unwrap_or(0);
        layers[output] = layers[output].max(deepest + 1);
        Ok(layers)
    }

    fn refresh_layers(&mut self) -> Result<(), GenomeError> {
        let layers = self.compute_layers()?;
        for (node, layer) in self.nodes.iter_mut().zip(layers) {
            node.set_layer(layer as f64);
        }
        Ok(())
    }

    /// Recomputes layers after a structural change. Failures
    /// are left for [`check_invariants`](Self::check_invariants)
    /// to report.
    fn relayer(&mut self) {
        if let Err(e) = self.refresh_layers() {
            log::error!("cannot assign layers: {}", e);
        }
    }

    fn insert_node(&mut self, node: Node) {
        let position = self.nodes.partition_point(|n| n.id() < node.id());
        self.nodes.insert(position, node);
    }

    fn insert_connection(&mut self, connection: Connection) -> usize {
        let position = self
            .connections
            .partition_point(|c| c.innovation() < connection.innovation());
        self.connections.insert(position, connection);
        position
    }

    /// Adds a connection from node `input` into slot `slot`
    /// of node `output`, with the innovation number assigned
    /// by `tracker`.
    ///
    /// # Errors
    /// Returns an error if either node is missing, the slot is
    /// out of range or already fed, an identical connection
    /// exists, or the connection would close a cycle.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig, InnovationTracker};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 0.0,
    ///     ..GeneticConfig::default()
    /// };
    /// let tracker = InnovationTracker::new(&config);
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mut genome = ExprGenome::new(&config, &mut rng);
    ///
    /// // Variable 0 and constant 1 into output node 2.
    /// genome.add_connection(&tracker, 0, 2, 0, 0.5).unwrap();
    /// genome.add_connection(&tracker, 1, 2, 1, 2.0).unwrap();
    ///
    /// // Both slots are now taken.
    /// assert!(genome.add_connection(&tracker, 0, 2, 1, 1.0).is_err());
    /// ```
    pub fn add_connection(
        &mut self,
        tracker: &InnovationTracker,
        input: Innovation,
        output: Innovation,
        slot: usize,
        weight: f64,
    ) -> Result<&Connection, GenomeError> {
        self.check_connection_viability(input, output, slot)?;
        let innovation = tracker.connection_innovation(input, output, slot);
        if self.connections.iter().any(|c| c.innovation() == innovation) {
            return Err(GenomeError::DuplicateConnection(innovation));
        }
        let position =
            self.insert_connection(Connection::new(innovation, input, output, slot, weight));
        self.relayer();
        Ok(&self.connections[position])
    }

    fn check_connection_viability(
        &self,
        input: Innovation,
        output: Innovation,
        slot: usize,
    ) -> Result<(), GenomeError> {
        let target = self.node(output).ok_or(GenomeError::UnknownNode(output))?;
        if !self.has_node(input) {
            return Err(GenomeError::UnknownNode(input));
        }
        if input == self.output {
            return Err(GenomeError::OutputAsInput(input));
        }
        if slot >= target.arity() {
            return Err(GenomeError::SlotOutOfRange {
                node: output,
                slot,
                arity: target.arity(),
            });
        }
        if self
            .connections
            .iter()
            .any(|c| c.endpoints() == (input, output) && c.slot() == slot)
        {
            return Err(GenomeError::DuplicateEndpoints {
                input,
                output,
                slot,
            });
        }
        if self.slot_occupied(output, slot) {
            return Err(GenomeError::SlotConflict { node: output, slot });
        }
        if self.reaches(output, input) {
            return Err(GenomeError::Cycle { input, output });
        }
        Ok(())
    }

    /// Splits the enabled connection with the given innovation
    /// number by inserting a node applying `operation`.
    ///
    /// The split connection is disabled and replaced by a
    /// connection of weight 1 into the new node, and one
    /// with the original weight out of it. Returns the
    /// new node's id.
    ///
    /// # Errors
    /// Returns an error if the connection is missing or disabled.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{
    ///     ExprGenome, GeneticConfig, InnovationTracker, Operation, UnaryOp,
    /// };
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig::default();
    /// let tracker = InnovationTracker::new(&config);
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mut genome = ExprGenome::new(&config, &mut rng);
    ///
    /// let split = genome.connections().next().unwrap().innovation();
    /// let node = genome.split_connection(&tracker, split, UnaryOp::Square).unwrap();
    ///
    /// assert_eq!(
    ///     genome.node(node).unwrap().operation(),
    ///     Operation::Unary(UnaryOp::Square)
    /// );
    /// assert!(genome.connections().any(|c| c.innovation() == split && !c.enabled()));
    /// assert!(genome.check_invariants().is_ok());
    /// ```
    pub fn split_connection(
        &mut self,
        tracker: &InnovationTracker,
        innovation: Innovation,
        operation: UnaryOp,
    ) -> Result<Innovation, GenomeError> {
        let index = self
            .connections
            .binary_search_by_key(&innovation, Connection::innovation)
            .map_err(|_| GenomeError::UnknownConnection(innovation))?;
        if !self.connections[index].enabled() {
            return Err(GenomeError::DisabledConnection(innovation));
        }
        let node = self.split(tracker, index, Operation::Unary(operation));
        self.relayer();
        Ok(node)
    }

    /// Splits the connection at `index`, without recomputing layers.
    fn split(
        &mut self,
        tracker: &InnovationTracker,
        index: usize,
        operation: Operation,
    ) -> Innovation {
        let split = self.connections[index].clone();
        let record = tracker.split_connection(&split, |id| self.has_node(id));

        self.connections[index].set_enabled(false);
        self.insert_node(Node::new(record.node, operation));
        self.insert_connection(Connection::new(
            record.input_connection,
            split.input(),
            record.node,
            0,
            1.0,
        ));
        self.insert_connection(Connection::new(
            record.output_connection,
            record.node,
            split.output(),
            split.slot(),
            split.weight(),
        ));
        record.node
    }

    /// Perturbs or resets every connection weight,
    /// as specified in `config`.
    pub fn mutate_weights<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in &mut self.connections {
            connection.mutate_weight(config, rng);
        }
    }

    /// Perturbs or resets every constant's value,
    /// as specified in `config`.
    pub fn mutate_constants<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for node in &mut self.nodes {
            if let Operation::Constant(value) = node.operation() {
                if rng.gen::<f64>() >= config.constant_mutation_chance {
                    continue;
                }
                let value = if rng.gen::<f64>() < config.constant_reset_chance {
                    random_constant(config, rng)
                } else {
                    let noise: f64 = rng.sample(StandardNormal);
                    value + noise * config.constant_mutation_power
                };
                node.set_operation(Operation::Constant(
                    value.clamp(-config.constant_bound, config.constant_bound),
                ));
            }
        }
    }

    /// Induces a _node mutation_: a random enabled connection is
    /// split by a new node. The node is binary with probability
    /// [`binary_node_chance`], in which case its second operand is
    /// fed by a random node no deeper than the split connection's
    /// input. Returns the new node's id.
    ///
    /// [`binary_node_chance`]: GeneticConfig::binary_node_chance
    ///
    /// # Errors
    /// Returns an error if the genome has no enabled connections,
    /// or no operations are available.
    pub fn mutate_add_node<R: Rng>(
        &mut self,
        tracker: &InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, GenomeError> {
        let index = (0..self.connections.len())
            .filter(|&i| self.connections[i].enabled())
            .choose(rng)
            .ok_or(GenomeError::NoEnabledConnection)?;

        let binary = !config.binary_operations.is_empty()
            && (config.unary_operations.is_empty() || rng.gen::<f64>() < config.binary_node_chance);
        if !binary {
            let operation = *config
                .unary_operations
                .choose(rng)
                .ok_or(GenomeError::NoOperationAvailable)?;
            let node = self.split(tracker, index, Operation::Unary(operation));
            self.relayer();
            return Ok(node);
        }

        let operation = *config
            .binary_operations
            .choose(rng)
            .ok_or(GenomeError::NoOperationAvailable)?;
        let input_layer = self
            .node(self.connections[index].input())
            .map_or(0.0, Node::layer);
        let second_operand = self
            .nodes
            .iter()
            .filter(|n| n.layer() <= input_layer && n.id() != self.output)
            .map(Node::id)
            .choose(rng)
            .ok_or(GenomeError::NoConnectionFound)?;

        let node = self.split(tracker, index, Operation::Binary(operation));
        self.insert_connection(Connection::new(
            tracker.connection_innovation(second_operand, node, 1),
            second_operand,
            node,
            1,
            Connection::random_weight(config, rng),
        ));
        self.relayer();
        Ok(node)
    }

    /// Induces a _connection mutation_, joining a random pair of
    /// unconnected nodes whose layers permit a forward connection
    /// into a free slot. A previously disabled connection with
    /// the same signature is re-enabled instead of duplicated.
    /// Returns the connection's innovation number.
    ///
    /// # Errors
    /// Returns an error if no viable pair is found in
    /// [`max_add_connection_attempts`] attempts.
    ///
    /// [`max_add_connection_attempts`]: GeneticConfig::max_add_connection_attempts
    pub fn mutate_add_connection<R: Rng>(
        &mut self,
        tracker: &InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, GenomeError> {
        let targets: Vec<Innovation> = self
            .nodes
            .iter()
            .filter(|n| !n.operation().is_source())
            .map(Node::id)
            .collect();

        for _ in 0..config.max_add_connection_attempts {
            let (source, target) = match (self.nodes.choose(rng), targets.choose(rng)) {
                (Some(source), Some(&target)) => (source.clone(), target),
                _ => break,
            };
            let target = match self.node(target) {
                Some(target) => target.clone(),
                None => continue,
            };
            if source.layer() >= target.layer()
                || self
                    .connections
                    .iter()
                    .any(|c| c.enabled() && c.endpoints() == (source.id(), target.id()))
            {
                continue;
            }
            let slot = match (0..target.arity())
                .filter(|&s| !self.slot_occupied(target.id(), s))
                .choose(rng)
            {
                Some(slot) => slot,
                None => continue,
            };

            let weight = Connection::random_weight(config, rng);
            if let Some(existing) = self
                .connections
                .iter_mut()
                .find(|c| c.endpoints() == (source.id(), target.id()) && c.slot() == slot)
            {
                existing.set_enabled(true);
                existing.set_weight(weight);
                return Ok(existing.innovation());
            }

            let innovation = tracker.connection_innovation(source.id(), target.id(), slot);
            if self.connections.iter().any(|c| c.innovation() == innovation) {
                continue;
            }
            self.insert_connection(Connection::new(
                innovation,
                source.id(),
                target.id(),
                slot,
                weight,
            ));
            self.relayer();
            return Ok(innovation);
        }
        Err(GenomeError::NoConnectionFound)
    }

    /// Replaces the operation of random operator nodes with a
    /// different allowed operation of the same arity.
    pub fn mutate_operations<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for node in &mut self.nodes {
            let replacement = match node.operation() {
                Operation::Unary(current) => {
                    if rng.gen::<f64>() >= config.change_operation_chance {
                        continue;
                    }
                    config
                        .unary_operations
                        .iter()
                        .filter(|&&op| op != current)
                        .choose(rng)
                        .map(|&op| Operation::Unary(op))
                }
                Operation::Binary(current) => {
                    if rng.gen::<f64>() >= config.change_operation_chance {
                        continue;
                    }
                    config
                        .binary_operations
                        .iter()
                        .filter(|&&op| op != current)
                        .choose(rng)
                        .map(|&op| Operation::Binary(op))
                }
                Operation::Variable(_) | Operation::Constant(_) => None,
            };
            if let Some(operation) = replacement {
                node.set_operation(operation);
            }
        }
    }

    /// Performs all mutations on the genome.
    pub fn mutate_all<R: Rng>(
        &mut self,
        tracker: &InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        self.mutate_weights(config, rng);
        self.mutate_constants(config, rng);
        if rng.gen::<f64>() < config.add_node_chance {
            if let Err(e) = self.mutate_add_node(tracker, config, rng) {
                log::trace!("node mutation skipped: {}", e);
            }
        }
        if rng.gen::<f64>() < config.add_connection_chance {
            if let Err(e) = self.mutate_add_connection(tracker, config, rng) {
                log::trace!("connection mutation skipped: {}", e);
            }
        }
        self.mutate_operations(config, rng);
    }

    /// Combines two genomes into a child, aligning their
    /// connections by innovation number.
    ///
    /// Matching connections are inherited from a random parent.
    /// Unmatched connections are inherited from the fitter parent
    /// only, or from both if their fitness is equal. Connections
    /// that would break the child's structure are left out, or
    /// disabled if they would double-feed a slot.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    /// let parent1 = ExprGenome::new(&config, &mut rng);
    /// let parent2 = ExprGenome::new(&config, &mut rng);
    ///
    /// let child = ExprGenome::mate(&parent1, &parent2, &config, &mut rng);
    /// assert!(child.check_invariants().is_ok());
    /// ```
    pub fn mate<R: Rng>(
        parent1: &ExprGenome,
        parent2: &ExprGenome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> ExprGenome {
        let equal_fitness = (parent1.fitness() - parent2.fitness()).abs() < f64::EPSILON;
        let (fitter, other) = if parent2.fitness() > parent1.fitness() && !equal_fitness {
            (parent2, parent1)
        } else {
            (parent1, parent2)
        };

        let inherited = Self::inherit_connections(fitter, other, equal_fitness, rng);

        let mut child = ExprGenome {
            nodes: fitter
                .nodes
                .iter()
                .filter(|n| n.operation().is_source() || n.id() == fitter.output)
                .cloned()
                .collect(),
            connections: Vec::with_capacity(inherited.len()),
            output: fitter.output,
            evaluation: Evaluation::default(),
        };
        for id in inherited
            .iter()
            .flat_map(|(c, _)| [c.input(), c.output()])
        {
            if !child.has_node(id) {
                if let Some(node) = fitter.node(id).or_else(|| other.node(id)) {
                    child.insert_node(node.clone());
                }
            }
        }

        for (mut connection, enabled_in_parent) in inherited {
            let viable = child.node(connection.output()).map_or(false, |target| {
                connection.slot() < target.arity()
            }) && child.has_node(connection.input())
                && connection.input() != child.output
                && !child.connections.iter().any(|c| {
                    c.endpoints() == connection.endpoints() && c.slot() == connection.slot()
                })
                && !child.reaches(connection.output(), connection.input());
            if !viable {
                continue;
            }
            if !connection.enabled()
                && enabled_in_parent
                && rng.gen::<f64>() < config.reenable_chance
            {
                connection.set_enabled(true);
            }
            if connection.enabled() && child.slot_occupied(connection.output(), connection.slot())
            {
                connection.set_enabled(false);
            }
            child.connections.push(connection);
        }

        child.remove_orphan_nodes();
        child.relayer();
        child
    }

    /// Aligns both parents' connections by innovation number,
    /// returning the inherited copies together with whether
    /// either parent had them enabled.
    fn inherit_connections<R: Rng>(
        fitter: &ExprGenome,
        other: &ExprGenome,
        equal_fitness: bool,
        rng: &mut R,
    ) -> Vec<(Connection, bool)> {
        let (fitter, other) = (&fitter.connections, &other.connections);
        let mut inherited = Vec::with_capacity(fitter.len().max(other.len()));
        let (mut i, mut j) = (0, 0);
        while i < fitter.len() || j < other.len() {
            let order = match (fitter.get(i), other.get(j)) {
                (Some(a), Some(b)) => a.innovation().cmp(&b.innovation()),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match order {
                Ordering::Equal => {
                    let (a, b) = (&fitter[i], &other[j]);
                    let chosen = if rng.gen::<bool>() { a } else { b };
                    inherited.push((chosen.clone(), a.enabled() || b.enabled()));
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    inherited.push((fitter[i].clone(), fitter[i].enabled()));
                    i += 1;
                }
                Ordering::Greater => {
                    if equal_fitness {
                        inherited.push((other[j].clone(), other[j].enabled()));
                    }
                    j += 1;
                }
            }
        }
        inherited
    }

    /// Removes operator nodes no connection refers to,
    /// other than the output.
    fn remove_orphan_nodes(&mut self) {
        let referenced: HashSet<Innovation, RandomState> = self
            .connections
            .iter()
            .flat_map(|c| [c.input(), c.output()])
            .collect();
        let output = self.output;
        self.nodes.retain(|n| {
            n.operation().is_source() || n.id() == output || referenced.contains(&n.id())
        });
    }

    /// Calculates the _genetic distance_ between `first` and `second`:
    /// the number of unmatched connections normalized by the larger
    /// connection count, plus the mean weight difference of matching
    /// connections, each scaled by its coefficient in `config`.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig, InnovationTracker};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 0.0,
    ///     disjoint_coefficient: 1.0,
    ///     weight_coefficient: 0.5,
    ///     ..GeneticConfig::default()
    /// };
    /// let tracker = InnovationTracker::new(&config);
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mut first = ExprGenome::new(&config, &mut rng);
    /// let mut second = first.clone();
    ///
    /// // Matching connection, weight difference of 2.
    /// first.add_connection(&tracker, 0, 2, 0, 1.0).unwrap();
    /// second.add_connection(&tracker, 0, 2, 0, -1.0).unwrap();
    /// // Unmatched connection.
    /// first.add_connection(&tracker, 1, 2, 1, 1.0).unwrap();
    ///
    /// assert_eq!(
    ///     ExprGenome::genetic_distance(&first, &second, &config),
    ///     1.0 * 1.0 / 2.0 + 0.5 * 2.0
    /// );
    /// ```
    pub fn genetic_distance(first: &ExprGenome, second: &ExprGenome, config: &GeneticConfig) -> f64 {
        let (a, b) = (&first.connections, &second.connections);
        let (mut i, mut j) = (0, 0);
        let mut matching = 0;
        let mut weight_difference = 0.0;
        let mut unmatched = 0;
        while i < a.len() && j < b.len() {
            match a[i].innovation().cmp(&b[j].innovation()) {
                Ordering::Equal => {
                    matching += 1;
                    weight_difference += (a[i].weight() - b[j].weight()).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    unmatched += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    unmatched += 1;
                    j += 1;
                }
            }
        }
        unmatched += (a.len() - i) + (b.len() - j);

        let size = a.len().max(b.len()).max(1) as f64;
        let mean_weight_difference = if matching > 0 {
            weight_difference / matching as f64
        } else {
            0.0
        };
        config.disjoint_coefficient * unmatched as f64 / size
            + config.weight_coefficient * mean_weight_difference
    }

    /// Checks every structural invariant of the genome: sorted
    /// unique ids, a binary output node with the greatest layer,
    /// connections between existing nodes into valid slots, at
    /// most one enabled connection per slot, no cycles, and
    /// finite constants.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), GenomeError> {
        // Ids must be strictly increasing.
        if let Some(w) = self.nodes.windows(2).find(|w| w[0].id() >= w[1].id()) {
            return Err(GenomeError::DuplicateNode(w[1].id()));
        }
        if let Some(w) = self
            .connections
            .windows(2)
            .find(|w| w[0].innovation() >= w[1].innovation())
        {
            return Err(GenomeError::DuplicateConnection(w[1].innovation()));
        }

        match self.node(self.output) {
            Some(output) if !output.operation().is_source() => {}
            _ => return Err(GenomeError::InvalidOutput(self.output)),
        }
        for node in &self.nodes {
            if let Operation::Constant(value) = node.operation() {
                if !value.is_finite() {
                    return Err(GenomeError::NonFinite(node.id()));
                }
            }
        }

        let mut fed_slots = HashSet::with_hasher(RandomState::new());
        let mut signatures = HashSet::with_hasher(RandomState::new());
        for c in &self.connections {
            let target = self
                .node(c.output())
                .ok_or(GenomeError::UnknownNode(c.output()))?;
            if !self.has_node(c.input()) {
                return Err(GenomeError::UnknownNode(c.input()));
            }
            if c.input() == self.output {
                return Err(GenomeError::OutputAsInput(self.output));
            }
            if c.slot() >= target.arity() {
                return Err(GenomeError::SlotOutOfRange {
                    node: c.output(),
                    slot: c.slot(),
                    arity: target.arity(),
                });
            }
            if !signatures.insert((c.input(), c.output(), c.slot())) {
                return Err(GenomeError::DuplicateEndpoints {
                    input: c.input(),
                    output: c.output(),
                    slot: c.slot(),
                });
            }
            if c.enabled() && !fed_slots.insert((c.output(), c.slot())) {
                return Err(GenomeError::SlotConflict {
                    node: c.output(),
                    slot: c.slot(),
                });
            }
        }

        self.compute_layers()?;
        for c in &self.connections {
            let layer = |id| self.node(id).map_or(0.0, Node::layer);
            if layer(c.input()) >= layer(c.output()) {
                return Err(GenomeError::LayerOrder {
                    input: c.input(),
                    output: c.output(),
                });
            }
        }
        let output_layer = self.node(self.output).map_or(0.0, Node::layer);
        if let Some(node) = self
            .nodes
            .iter()
            .find(|n| n.id() != self.output && n.layer() >= output_layer)
        {
            return Err(GenomeError::LayerOrder {
                input: node.id(),
                output: self.output,
            });
        }
        Ok(())
    }
}

fn random_constant<R: Rng>(config: &GeneticConfig, rng: &mut R) -> f64 {
    rng.gen_range(-config.constant_init_range..=config.constant_init_range)
}

impl Genome for ExprGenome {
    type Config = GeneticConfig;
    type InnovationHistory = InnovationTracker;

    fn new<R: Rng>(config: &GeneticConfig, rng: &mut R) -> ExprGenome {
        ExprGenome::new(config, rng)
    }

    fn genetic_distance(first: &ExprGenome, second: &ExprGenome, config: &GeneticConfig) -> f64 {
        ExprGenome::genetic_distance(first, second, config)
    }

    fn mate<R: Rng>(
        parent1: &ExprGenome,
        parent2: &ExprGenome,
        _: &InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> ExprGenome {
        ExprGenome::mate(parent1, parent2, config, rng)
    }

    fn mutate<R: Rng>(&mut self, history: &InnovationTracker, config: &GeneticConfig, rng: &mut R) {
        self.mutate_all(history, config, rng);
    }

    fn check_invariants(&self) -> Result<(), GenomeValidationError> {
        ExprGenome::check_invariants(self).map_err(Into::into)
    }

    fn validate_config(config: &GeneticConfig) -> Result<(), GenomeValidationError> {
        config.validate().map_err(Into::into)
    }

    fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.evaluation = evaluation;
    }

    fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }
}

impl fmt::Display for ExprGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Genome {{")?;
        writeln!(f, "\tfitness: {}", self.evaluation.fitness)?;
        writeln!(f, "\tnodes: [")?;
        for node in &self.nodes {
            writeln!(f, "\t\t{},", node)?;
        }
        writeln!(f, "\t]")?;
        writeln!(f, "\tconnections: [")?;
        for connection in &self.connections {
            writeln!(f, "\t\t{},", connection)?;
        }
        writeln!(f, "\t]")?;
        write!(f, "}}")
    }
}
