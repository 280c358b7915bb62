//! # Graph Upsert Engine
//!
//! Applies one [`NormalizedRecord`] to a graph store using only the store's
//! merge-or-create primitives, so applying the same record any number of
//! times leaves the graph exactly as applying it once.
//!
//! Steps:
//! 1. Merge the Game by identity and overwrite its scalar attributes.
//! 2. Merge each Publisher and ensure `PUBLISHED`.
//! 3. Merge each Genre and ensure `HAS_GENRE`.
//! 4. Merge each Tag and ensure `HAS_TAG`.
//!
//! Steps 2-4 do not depend on each other: all of them are attempted even if
//! one fails, and the first failure is reported afterwards. They are not
//! transactional with step 1; a failed record is repaired by applying it again.

use crate::graph::GraphStore;
use crate::normalize::NormalizedRecord;
use crate::{GraphError, Label, NodeId, RelType};

/// What a single upsert changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Relationships that did not exist before this call.
    pub relationships_created: usize,
}

/// The UpsertEngine writes normalized records into a graph.
pub struct UpsertEngine;

impl UpsertEngine {
    /// Upsert one record. Idempotent.
    pub fn upsert<G: GraphStore>(
        graph: &mut G,
        record: &NormalizedRecord,
    ) -> Result<UpsertOutcome, GraphError> {
        let game = graph.merge_node(Label::Game, &record.identity)?;
        graph.set_properties(game, record.properties())?;

        let links = [
            (Label::Publisher, RelType::Published, &record.publishers),
            (Label::Genre, RelType::HasGenre, &record.genres),
            (Label::Tag, RelType::HasTag, &record.tags),
        ];

        let mut outcome = UpsertOutcome::default();
        let mut first_error = None;
        for (label, rel, names) in links {
            match Self::link_all(graph, game, label, rel, names) {
                Ok(created) => outcome.relationships_created += created,
                Err(e) => {
                    tracing::warn!(
                        game = %record.identity,
                        relationship = rel.as_str(),
                        error = %e,
                        "relationship upsert failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }

    /// Merge every named entity of `label` and link it to the game.
    /// Returns the number of relationships created.
    fn link_all<G: GraphStore>(
        graph: &mut G,
        game: NodeId,
        label: Label,
        rel: RelType,
        names: &[String],
    ) -> Result<usize, GraphError> {
        let mut created = 0;
        for name in names {
            let other = graph.merge_node(label, name)?;
            // PUBLISHED points from the publisher to the game.
            let (from, to) = if rel == RelType::Published {
                (other, game)
            } else {
                (game, other)
            };
            if graph.merge_relationship(from, rel, to)? {
                created += 1;
            }
        }
        Ok(created)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::{Direction, Properties};

    fn record(id: &str, name: &str, publishers: &[&str], tags: &[&str]) -> NormalizedRecord {
        NormalizedRecord {
            identity: id.to_string(),
            name: name.to_string(),
            release_date: "2020".to_string(),
            estimated_owners: 1000,
            required_age: 0,
            price: 0.0,
            publishers: publishers.iter().map(|s| s.to_string()).collect(),
            genres: vec!["Action".to_string()],
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut graph = Graph::new();
        let rec = record("1", "Portal", &["Valve"], &["Puzzle", "Sci-fi"]);

        let first = UpsertEngine::upsert(&mut graph, &rec).expect("upsert");
        let nodes = graph.node_count().expect("count");
        let rels = graph.relationship_count().expect("count");

        let second = UpsertEngine::upsert(&mut graph, &rec).expect("upsert");

        assert_eq!(first.relationships_created, 4);
        assert_eq!(second.relationships_created, 0);
        assert_eq!(graph.node_count().expect("count"), nodes);
        assert_eq!(graph.relationship_count().expect("count"), rels);
    }

    #[test]
    fn shared_publisher_is_reused() {
        let mut graph = Graph::new();
        UpsertEngine::upsert(&mut graph, &record("1", "Portal", &["Valve"], &[])).expect("upsert");
        UpsertEngine::upsert(&mut graph, &record("2", "Dota 2", &["Valve"], &[])).expect("upsert");

        let publishers = graph.nodes_with_label(Label::Publisher).expect("scan");
        assert_eq!(publishers.len(), 1);
        let games = graph
            .related(publishers[0], RelType::Published, Direction::Outgoing)
            .expect("related");
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn later_scalars_win() {
        let mut graph = Graph::new();
        UpsertEngine::upsert(&mut graph, &record("1", "Portal", &[], &[])).expect("upsert");
        UpsertEngine::upsert(&mut graph, &record("1", "Portal 2", &[], &[])).expect("upsert");

        let id = graph
            .find_node(Label::Game, "1")
            .expect("find")
            .expect("exists");
        let node = graph.node(id).expect("node").expect("exists");
        assert_eq!(node.text("name"), Some("Portal 2"));
        assert_eq!(graph.nodes_with_label(Label::Game).expect("scan").len(), 1);
    }

    /// Store whose Tag merges always fail.
    struct NoTags(Graph);

    impl GraphStore for NoTags {
        fn merge_node(&mut self, label: Label, key: &str) -> Result<NodeId, GraphError> {
            if label == Label::Tag {
                return Err(GraphError::StorageUnavailable("tags offline".into()));
            }
            self.0.merge_node(label, key)
        }
        fn set_properties(&mut self, node: NodeId, p: Properties) -> Result<(), GraphError> {
            self.0.set_properties(node, p)
        }
        fn merge_relationship(
            &mut self,
            from: NodeId,
            rel: RelType,
            to: NodeId,
        ) -> Result<bool, GraphError> {
            self.0.merge_relationship(from, rel, to)
        }
        fn node(&self, id: NodeId) -> Result<Option<crate::Node>, GraphError> {
            self.0.node(id)
        }
        fn find_node(&self, label: Label, key: &str) -> Result<Option<NodeId>, GraphError> {
            self.0.find_node(label, key)
        }
        fn nodes_with_label(&self, label: Label) -> Result<Vec<NodeId>, GraphError> {
            self.0.nodes_with_label(label)
        }
        fn related(
            &self,
            node: NodeId,
            rel: RelType,
            direction: Direction,
        ) -> Result<Vec<NodeId>, GraphError> {
            self.0.related(node, rel, direction)
        }
        fn node_count(&self) -> Result<usize, GraphError> {
            self.0.node_count()
        }
        fn relationship_count(&self) -> Result<usize, GraphError> {
            self.0.relationship_count()
        }
    }

    #[test]
    fn failing_relationship_type_does_not_block_others() {
        let mut graph = NoTags(Graph::new());
        let rec = record("1", "Portal", &["Valve"], &["Puzzle"]);

        let result = UpsertEngine::upsert(&mut graph, &rec);
        assert!(matches!(result, Err(GraphError::StorageUnavailable(_))));

        // Publisher and genre links were still applied.
        assert_eq!(graph.nodes_with_label(Label::Publisher).expect("scan").len(), 1);
        assert_eq!(graph.nodes_with_label(Label::Genre).expect("scan").len(), 1);
        assert_eq!(graph.relationship_count().expect("count"), 2);
    }
}
