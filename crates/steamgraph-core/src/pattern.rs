//! # Graph Patterns
//!
//! Declarative description of the node/relationship shapes the query layer
//! asks the storage for, and the evaluator that turns a pattern into bound
//! result rows.
//!
//! A pattern is a start node match followed by zero or more branches. Each
//! branch is a path of typed, directed hops starting at the start node.
//! Branches combine as a cartesian product, exactly like consecutive
//! `MATCH` / `OPTIONAL MATCH` clauses:
//!
//! ```text
//! MATCH (g:Game {id: $id})
//! OPTIONAL MATCH (g)<-[:PUBLISHED]-(p)
//! OPTIONAL MATCH (g)-[:HAS_TAG]->(t)
//! ```
//!
//! An optional branch that does not match binds all of its aliases to null
//! instead of discarding the row. Within one branch a relationship is never
//! traversed twice.

use crate::graph::GraphStore;
use crate::{Direction, GraphError, Label, Node, NodeId, RelType};
use std::collections::BTreeMap;

// =============================================================================
// PATTERN DEFINITION
// =============================================================================

/// How the start node's key is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatch {
    /// Every node with the label.
    Any,
    /// Key equals the value exactly.
    Exact(String),
    /// Key equals the value ignoring case.
    CaseInsensitive(String),
}

/// The start of a pattern: `(alias:Label {key})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatch {
    pub alias: &'static str,
    pub label: Label,
    pub key: KeyMatch,
}

impl NodeMatch {
    /// Match every node with the label.
    #[must_use]
    pub fn new(alias: &'static str, label: Label) -> Self {
        Self {
            alias,
            label,
            key: KeyMatch::Any,
        }
    }

    /// Restrict to an exact key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = KeyMatch::Exact(key.into());
        self
    }

    /// Restrict to a key compared without case.
    #[must_use]
    pub fn key_ignore_case(mut self, key: impl Into<String>) -> Self {
        self.key = KeyMatch::CaseInsensitive(key.into());
        self
    }

    fn accepts(&self, node: &Node) -> bool {
        match &self.key {
            KeyMatch::Any => true,
            KeyMatch::Exact(key) => node.key == *key,
            KeyMatch::CaseInsensitive(key) => node.key.to_lowercase() == key.to_lowercase(),
        }
    }
}

/// One step of a path: follow `rel` in `direction` and bind the node reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub rel: RelType,
    pub direction: Direction,
    pub alias: &'static str,
}

impl Hop {
    /// `(current)-[:rel]->(alias)`
    #[must_use]
    pub const fn outgoing(rel: RelType, alias: &'static str) -> Self {
        Self {
            rel,
            direction: Direction::Outgoing,
            alias,
        }
    }

    /// `(current)<-[:rel]-(alias)`
    #[must_use]
    pub const fn incoming(rel: RelType, alias: &'static str) -> Self {
        Self {
            rel,
            direction: Direction::Incoming,
            alias,
        }
    }

    /// Label of the node this hop lands on.
    #[must_use]
    pub const fn target_label(&self) -> Label {
        let (source, target) = self.rel.endpoints();
        match self.direction {
            Direction::Outgoing => target,
            Direction::Incoming => source,
        }
    }
}

/// A path hanging off the start node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub hops: Vec<Hop>,
    pub optional: bool,
}

/// A complete pattern request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub start: NodeMatch,
    pub branches: Vec<Branch>,
    /// Maximum number of rows returned.
    pub limit: Option<usize>,
}

impl Pattern {
    #[must_use]
    pub fn start(start: NodeMatch) -> Self {
        Self {
            start,
            branches: Vec::new(),
            limit: None,
        }
    }

    /// Add a path that must match for a row to be produced.
    #[must_use]
    pub fn path(mut self, hops: Vec<Hop>) -> Self {
        self.branches.push(Branch {
            hops,
            optional: false,
        });
        self
    }

    /// Add a path whose aliases bind to null when it does not match.
    #[must_use]
    pub fn optional_path(mut self, hops: Vec<Hop>) -> Self {
        self.branches.push(Branch {
            hops,
            optional: true,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// RESULT ROWS
// =============================================================================

/// One bound result row: alias -> node, or null for an unmatched optional
/// branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    bindings: BTreeMap<&'static str, Option<Node>>,
}

impl Row {
    /// The node bound to `alias`, or `None` if null or not declared.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&Node> {
        self.bindings.get(alias).and_then(Option::as_ref)
    }

    fn bind(&mut self, alias: &'static str, node: Option<Node>) {
        self.bindings.insert(alias, node);
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Evaluate a pattern against any graph store.
///
/// Rows are produced in storage-default order: start nodes by `NodeId`, then
/// branch matches in the order the store returns neighbours.
pub fn execute<G: GraphStore + ?Sized>(
    graph: &G,
    pattern: &Pattern,
) -> Result<Vec<Row>, GraphError> {
    let limit = pattern.limit.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    if limit == 0 {
        return Ok(rows);
    }

    for start in start_nodes(graph, &pattern.start)? {
        let start_id = start.id;
        let mut seed = Row::default();
        seed.bind(pattern.start.alias, Some(start));
        let mut partial = vec![seed];

        for branch in &pattern.branches {
            let mut next = Vec::new();
            let mut matches = Vec::new();
            expand(
                graph,
                start_id,
                &branch.hops,
                &mut Vec::new(),
                &mut Vec::new(),
                &mut matches,
            )?;

            for row in partial {
                if matches.is_empty() {
                    if branch.optional {
                        let mut row = row;
                        for hop in &branch.hops {
                            row.bind(hop.alias, None);
                        }
                        next.push(row);
                    }
                    continue;
                }
                for bound in &matches {
                    let mut row = row.clone();
                    for (alias, node) in bound {
                        row.bind(alias, Some(node.clone()));
                    }
                    next.push(row);
                }
            }
            partial = next;
        }

        for row in partial {
            rows.push(row);
            if rows.len() >= limit {
                return Ok(rows);
            }
        }
    }

    Ok(rows)
}

fn start_nodes<G: GraphStore + ?Sized>(
    graph: &G,
    start: &NodeMatch,
) -> Result<Vec<Node>, GraphError> {
    if let KeyMatch::Exact(key) = &start.key {
        return match graph.find_node(start.label, key)? {
            Some(id) => Ok(graph.node(id)?.into_iter().collect()),
            None => Ok(Vec::new()),
        };
    }

    let mut nodes = Vec::new();
    for id in graph.nodes_with_label(start.label)? {
        match graph.node(id)? {
            Some(node) if start.accepts(&node) => nodes.push(node),
            _ => {}
        }
    }
    Ok(nodes)
}

type Edge = (NodeId, RelType, NodeId);

/// Depth-first expansion of one branch. Every complete path is pushed to
/// `out` as the list of (alias, node) bindings along it.
fn expand<G: GraphStore + ?Sized>(
    graph: &G,
    from: NodeId,
    hops: &[Hop],
    used: &mut Vec<Edge>,
    bound: &mut Vec<(&'static str, Node)>,
    out: &mut Vec<Vec<(&'static str, Node)>>,
) -> Result<(), GraphError> {
    let Some((hop, rest)) = hops.split_first() else {
        out.push(bound.clone());
        return Ok(());
    };

    let expected = hop.target_label();
    for next in graph.related(from, hop.rel, hop.direction)? {
        let edge = match hop.direction {
            Direction::Outgoing => (from, hop.rel, next),
            Direction::Incoming => (next, hop.rel, from),
        };
        if used.contains(&edge) {
            continue;
        }
        let Some(node) = graph.node(next)? else {
            continue;
        };
        if node.label != expected {
            continue;
        }

        used.push(edge);
        bound.push((hop.alias, node));
        expand(graph, next, rest, used, bound, out)?;
        bound.pop();
        used.pop();
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    /// Two games sharing the tag "Co-op"; game 1 also tagged "Puzzle".
    fn sample() -> Graph {
        let mut graph = Graph::new();
        let g1 = graph.merge_node(Label::Game, "1").expect("game");
        let g2 = graph.merge_node(Label::Game, "2").expect("game");
        let coop = graph.merge_node(Label::Tag, "Co-op").expect("tag");
        let puzzle = graph.merge_node(Label::Tag, "Puzzle").expect("tag");
        let valve = graph.merge_node(Label::Publisher, "Valve").expect("pub");
        graph
            .merge_relationship(g1, RelType::HasTag, coop)
            .expect("rel");
        graph
            .merge_relationship(g1, RelType::HasTag, puzzle)
            .expect("rel");
        graph
            .merge_relationship(g2, RelType::HasTag, coop)
            .expect("rel");
        graph
            .merge_relationship(valve, RelType::Published, g1)
            .expect("rel");
        graph
    }

    #[test]
    fn scan_respects_limit_and_order() {
        let graph = sample();
        let rows = execute(&graph, &Pattern::start(NodeMatch::new("g", Label::Game)).limit(1))
            .expect("execute");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("g").map(|n| n.key.as_str()), Some("1"));
    }

    #[test]
    fn two_hop_path_never_reuses_relationship() {
        let graph = sample();
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key("1")).path(vec![
            Hop::outgoing(RelType::HasTag, "t"),
            Hop::incoming(RelType::HasTag, "other"),
        ]);
        let rows = execute(&graph, &pattern).expect("execute");

        // Only game 2 via Co-op; game 1 cannot reach itself through the same edge.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("other").map(|n| n.key.as_str()), Some("2"));
        assert_eq!(rows[0].get("t").map(|n| n.key.as_str()), Some("Co-op"));
    }

    #[test]
    fn optional_branch_binds_null() {
        let graph = sample();
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key("2"))
            .optional_path(vec![Hop::incoming(RelType::Published, "p")]);
        let rows = execute(&graph, &pattern).expect("execute");

        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("p").is_none());
        assert!(rows[0].get("g").is_some());
    }

    #[test]
    fn required_branch_drops_unmatched_start() {
        let graph = sample();
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key("2"))
            .path(vec![Hop::incoming(RelType::Published, "p")]);
        assert!(execute(&graph, &pattern).expect("execute").is_empty());
    }

    #[test]
    fn branches_form_cartesian_product() {
        let graph = sample();
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key("1"))
            .optional_path(vec![Hop::incoming(RelType::Published, "p")])
            .optional_path(vec![Hop::outgoing(RelType::HasTag, "t")]);
        let rows = execute(&graph, &pattern).expect("execute");

        // 1 publisher x 2 tags
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.get("p").is_some()));
    }

    #[test]
    fn case_insensitive_start_match() {
        let graph = sample();
        let pattern = Pattern::start(NodeMatch::new("p", Label::Publisher).key_ignore_case("vALVE"));
        let rows = execute(&graph, &pattern).expect("execute");
        assert_eq!(rows.len(), 1);

        let exact = Pattern::start(NodeMatch::new("p", Label::Publisher).key("valve"));
        assert!(execute(&graph, &exact).expect("execute").is_empty());
    }
}
