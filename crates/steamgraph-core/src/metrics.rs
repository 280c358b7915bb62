//! # Graph Metrics
//!
//! Size of the graph per label, reported by the status endpoint and the
//! `status` command.

use crate::graph::GraphStore;
use crate::{GraphError, Label};
use serde::{Deserialize, Serialize};

/// Node counts per label plus the relationship total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub games: usize,
    pub publishers: usize,
    pub genres: usize,
    pub tags: usize,
    pub relationships: usize,
}

impl GraphMetrics {
    /// Compute metrics from any graph store.
    pub fn collect<G: GraphStore + ?Sized>(graph: &G) -> Result<Self, GraphError> {
        let count = |label| graph.nodes_with_label(label).map(|ids| ids.len());
        Ok(Self {
            games: count(Label::Game)?,
            publishers: count(Label::Publisher)?,
            genres: count(Label::Genre)?,
            tags: count(Label::Tag)?,
            relationships: graph.relationship_count()?,
        })
    }

    /// Total number of nodes.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.games + self.publishers + self.genres + self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::RelType;

    #[test]
    fn empty_graph_has_zero_metrics() {
        let metrics = GraphMetrics::collect(&Graph::new()).expect("metrics");
        assert_eq!(metrics, GraphMetrics::default());
    }

    #[test]
    fn counts_per_label() {
        let mut graph = Graph::new();
        let game = graph.merge_node(Label::Game, "1").expect("merge");
        let tag = graph.merge_node(Label::Tag, "FPS").expect("merge");
        graph.merge_node(Label::Tag, "RPG").expect("merge");
        graph
            .merge_relationship(game, RelType::HasTag, tag)
            .expect("rel");

        let metrics = GraphMetrics::collect(&graph).expect("metrics");
        assert_eq!(metrics.games, 1);
        assert_eq!(metrics.tags, 2);
        assert_eq!(metrics.relationships, 1);
        assert_eq!(metrics.nodes(), graph.node_count().expect("count"));
    }
}
