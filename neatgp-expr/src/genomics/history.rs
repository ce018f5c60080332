use crate::genomics::{Connection, GeneticConfig};
use crate::Innovation;

use ahash::RandomState;
use neatgp::InnovationHistory;

use std::collections::hash_map::{Entry, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of operand slots every connection
/// innovation signature can refer to.
const MAX_SLOTS: usize = 2;

/// Returns the innovation pre-assigned to the initial
/// connection from variable or constant `input`
/// into slot `slot` of the output node.
pub(super) fn initial_innovation(input: Innovation, slot: usize) -> Innovation {
    input * MAX_SLOTS + slot
}

/// The signature identifying structurally
/// identical connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ConnectionKey {
    input: Innovation,
    output: Innovation,
    slot: usize,
}

/// The innovations created by splitting a connection
/// with a new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitRecord {
    /// The new node.
    pub node: Innovation,
    /// Connection from the split connection's input to the new node.
    pub input_connection: Innovation,
    /// Connection from the new node to the split connection's output.
    pub output_connection: Innovation,
}

#[derive(Debug)]
struct TrackerState {
    next_connection: Innovation,
    next_node: Innovation,
    connections: HashMap<ConnectionKey, Innovation, RandomState>,
    splits: HashMap<Innovation, SplitRecord, RandomState>,
}

impl TrackerState {
    fn connection_innovation(&mut self, key: ConnectionKey) -> Innovation {
        match self.connections.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_connection;
                self.next_connection += 1;
                *entry.insert(innovation)
            }
        }
    }

    fn new_node(&mut self) -> Innovation {
        let node = self.next_node;
        self.next_node += 1;
        node
    }
}

/// An `InnovationTracker` keeps track of connection and node
/// innovations over a whole run, so that identical mutations
/// in different genomes are assigned the same innovation numbers.
///
/// Connections are identified by their `(input, output, slot)`
/// signature; node insertions by the innovation of the connection
/// they split.
///
/// The tracker is shared by reference between all reproduction
/// routines, and serializes access to its records with a lock.
#[derive(Debug)]
pub struct InnovationTracker {
    state: Mutex<TrackerState>,
}

impl InnovationHistory for InnovationTracker {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> InnovationTracker {
        Self::new(config)
    }
}

impl InnovationTracker {
    /// Creates a new tracker for genomes generated from `config`.
    ///
    /// Node ids `0..n` are the input variables, followed by
    /// the constants, followed by the output node. Every
    /// possible initial connection from a variable or constant
    /// `s` into output slot `k` is pre-assigned innovation
    /// `s ⨯ 2 + k`.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{GeneticConfig, InnovationTracker};
    ///
    /// let config = GeneticConfig {
    ///     input_names: vec!["x".into(), "y".into()],
    ///     constant_count: 1,
    ///     ..GeneticConfig::default()
    /// };
    /// let tracker = InnovationTracker::new(&config);
    ///
    /// // Constant 2 into slot 1 of output node 3.
    /// assert_eq!(tracker.connection_innovation(2, 3, 1), 5);
    /// assert_eq!(tracker.max_connection_innovation(), 5);
    /// assert_eq!(tracker.max_node_innovation(), 3);
    /// ```
    pub fn new(config: &GeneticConfig) -> InnovationTracker {
        let sources = config.source_count();
        let output = config.output_id();
        let connections = (0..sources)
            .flat_map(|input| (0..MAX_SLOTS).map(move |slot| (input, slot)))
            .map(|(input, slot)| {
                (
                    ConnectionKey {
                        input,
                        output,
                        slot,
                    },
                    initial_innovation(input, slot),
                )
            })
            .collect();
        InnovationTracker {
            state: Mutex::new(TrackerState {
                next_connection: sources * MAX_SLOTS,
                next_node: output + 1,
                connections,
                splits: HashMap::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // The state is never left inconsistent by a panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the innovation number of the connection from
    /// `input` into slot `slot` of `output`, assigning a new
    /// one if the connection has never been seen before.
    pub fn connection_innovation(
        &self,
        input: Innovation,
        output: Innovation,
        slot: usize,
    ) -> Innovation {
        self.lock().connection_innovation(ConnectionKey {
            input,
            output,
            slot,
        })
    }

    /// Returns the innovations for splitting `connection` with a
    /// new node, or those previously assigned to the same split.
    ///
    /// `node_present` reports whether a node id already exists in
    /// the mutating genome. If the recorded split refers to such a
    /// node (the genome split the same connection before), fresh
    /// innovations are assigned instead, so that no genome ends
    /// up with duplicate nodes or connections.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{Connection, GeneticConfig, InnovationTracker};
    ///
    /// let tracker = InnovationTracker::new(&GeneticConfig::default());
    /// let connection = Connection::new(0, 0, 2, 0, 1.0);
    ///
    /// let first = tracker.split_connection(&connection, |_| false);
    /// let again = tracker.split_connection(&connection, |_| false);
    /// assert_eq!(first, again);
    ///
    /// let duplicate = tracker.split_connection(&connection, |node| node == first.node);
    /// assert_ne!(first.node, duplicate.node);
    /// ```
    pub fn split_connection(
        &self,
        connection: &Connection,
        node_present: impl Fn(Innovation) -> bool,
    ) -> SplitRecord {
        let mut state = self.lock();
        if let Some(record) = state.splits.get(&connection.innovation()) {
            if !node_present(record.node) {
                return *record;
            }
        }

        let node = state.new_node();
        let record = SplitRecord {
            node,
            input_connection: state.connection_innovation(ConnectionKey {
                input: connection.input(),
                output: node,
                slot: 0,
            }),
            output_connection: state.connection_innovation(ConnectionKey {
                input: node,
                output: connection.output(),
                slot: connection.slot(),
            }),
        };
        state
            .splits
            .entry(connection.innovation())
            .or_insert(record);
        log::trace!(
            "connection {} split by node {}",
            connection.innovation(),
            node
        );
        record
    }

    /// Returns the highest connection innovation number assigned.
    pub fn max_connection_innovation(&self) -> Innovation {
        self.lock().next_connection.saturating_sub(1)
    }

    /// Returns the highest node id assigned.
    pub fn max_node_innovation(&self) -> Innovation {
        self.lock().next_node.saturating_sub(1)
    }

    /// Returns the number of distinct connections recorded.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_connections_share_innovation() {
        let tracker = InnovationTracker::new(&GeneticConfig::default());
        let first = tracker.connection_innovation(0, 7, 1);
        let second = tracker.connection_innovation(0, 7, 1);
        assert_eq!(first, second);
        assert_ne!(first, tracker.connection_innovation(0, 7, 0));
    }

    #[test]
    fn initial_connections_are_preallocated() {
        let tracker = InnovationTracker::new(&GeneticConfig::default());
        // Default: one input, one constant, output node 2.
        assert_eq!(tracker.connection_count(), 4);
        assert_eq!(tracker.connection_innovation(1, 2, 0), 2);
        assert_eq!(tracker.max_connection_innovation(), 3);
        assert_eq!(tracker.connection_innovation(0, 1, 0), 4);
    }

    #[test]
    fn split_innovations_are_fresh() {
        let tracker = InnovationTracker::new(&GeneticConfig::default());
        let record = tracker.split_connection(&Connection::new(1, 0, 2, 1, 0.5), |_| false);
        assert_eq!(record.node, 3);
        assert_eq!(tracker.connection_innovation(0, 3, 0), record.input_connection);
        assert_eq!(tracker.connection_innovation(3, 2, 1), record.output_connection);
        assert_eq!(tracker.max_node_innovation(), 3);
    }

    #[test]
    fn tracker_is_shareable_between_threads() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<InnovationTracker>();
    }
}
