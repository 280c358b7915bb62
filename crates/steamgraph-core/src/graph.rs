//! # Graph Engine
//!
//! The `GraphStore` trait (the storage capability the CORE relies on) and
//! its in-memory implementation.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::pattern::{Pattern, Row};
use crate::{Direction, GraphError, Label, Node, NodeId, Properties, RelType};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the storage capability.
///
/// Implementations must make `merge_node` atomic: two merges of the same
/// `(label, key)` can never produce two nodes. The CORE composes these
/// primitives and never implements lookup-then-insert itself.
///
/// All fallible operations return `Result<T, GraphError>` to support both
/// in-memory and persistent storage backends uniformly.
pub trait GraphStore {
    /// Return the node identified by `(label, key)`, creating it if absent.
    fn merge_node(&mut self, label: Label, key: &str) -> Result<NodeId, GraphError>;

    /// Set scalar properties on a node, overwriting existing values of the
    /// same name. Properties not mentioned are left untouched.
    fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<(), GraphError>;

    /// Ensure the relationship `from -[rel]-> to` exists.
    ///
    /// Returns `true` if it was created, `false` if it already existed.
    /// Fails with `NodeNotFound` if either endpoint is missing.
    fn merge_relationship(
        &mut self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
    ) -> Result<bool, GraphError>;

    /// Fetch a node by id.
    fn node(&self, id: NodeId) -> Result<Option<Node>, GraphError>;

    /// Resolve `(label, key)` to a node id without creating anything.
    fn find_node(&self, label: Label, key: &str) -> Result<Option<NodeId>, GraphError>;

    /// All nodes carrying `label`, in creation order.
    fn nodes_with_label(&self, label: Label) -> Result<Vec<NodeId>, GraphError>;

    /// Nodes reachable from `node` over one `rel` relationship in `direction`,
    /// in ascending id order.
    fn related(
        &self,
        node: NodeId,
        rel: RelType,
        direction: Direction,
    ) -> Result<Vec<NodeId>, GraphError>;

    /// Total number of nodes.
    fn node_count(&self) -> Result<usize, GraphError>;

    /// Total number of relationships.
    fn relationship_count(&self) -> Result<usize, GraphError>;

    /// Evaluate a declarative pattern and return the bound rows.
    fn execute(&self, pattern: &Pattern) -> Result<Vec<Row>, GraphError> {
        crate::pattern::execute(self, pattern)
    }
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// In-memory graph.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Identity index: (Label, key) -> NodeId
    key_index: BTreeMap<(Label, String), NodeId>,

    /// Outgoing adjacency: from -> {(rel, to)}
    outgoing: BTreeMap<NodeId, BTreeSet<(RelType, NodeId)>>,

    /// Incoming adjacency: to -> {(rel, from)}
    incoming: BTreeMap<NodeId, BTreeSet<(RelType, NodeId)>>,

    /// Next available NodeId
    next_node_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for Graph {
    fn merge_node(&mut self, label: Label, key: &str) -> Result<NodeId, GraphError> {
        if key.is_empty() {
            return Err(GraphError::InvalidArgument(format!(
                "{} key must not be empty",
                label.as_str()
            )));
        }

        // Return existing node if the identity is already mapped
        if let Some(&node_id) = self.key_index.get(&(label, key.to_string())) {
            return Ok(node_id);
        }

        let node_id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);

        self.nodes.insert(node_id, Node::new(node_id, label, key));
        self.key_index.insert((label, key.to_string()), node_id);

        Ok(node_id)
    }

    fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<(), GraphError> {
        let stored = self
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        stored.properties.extend(properties);
        Ok(())
    }

    fn merge_relationship(
        &mut self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
    ) -> Result<bool, GraphError> {
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }

        let created = self.outgoing.entry(from).or_default().insert((rel, to));
        self.incoming.entry(to).or_default().insert((rel, from));
        Ok(created)
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>, GraphError> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn find_node(&self, label: Label, key: &str) -> Result<Option<NodeId>, GraphError> {
        Ok(self.key_index.get(&(label, key.to_string())).copied())
    }

    fn nodes_with_label(&self, label: Label) -> Result<Vec<NodeId>, GraphError> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.label == label)
            .map(|n| n.id)
            .collect())
    }

    fn related(
        &self,
        node: NodeId,
        rel: RelType,
        direction: Direction,
    ) -> Result<Vec<NodeId>, GraphError> {
        let adjacency = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        Ok(adjacency
            .get(&node)
            .into_iter()
            .flat_map(|set| set.range((rel, NodeId(0))..=(rel, NodeId(u64::MAX))))
            .map(|(_, id)| *id)
            .collect())
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        Ok(self.nodes.len())
    }

    fn relationship_count(&self) -> Result<usize, GraphError> {
        Ok(self.outgoing.values().map(BTreeSet::len).sum())
    }
}

// =============================================================================
// TESTS
// =============================================================================
