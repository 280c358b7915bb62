//! # redb-backed Graph Storage
//!
//! A disk-backed graph store using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! `merge_node` and `merge_relationship` each run inside a single write
//! transaction. redb admits one writer at a time, which makes lookup and
//! insert atomic: two merges of the same identity can never create two nodes.

use crate::graph::GraphStore;
use crate::{Direction, GraphError, Label, Node, NodeId, Properties, RelType};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for nodes: NodeId(u64) -> postcard-encoded Node
const NODES: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");

/// Identity index: (label code, key) -> NodeId(u64)
const NODE_KEYS: TableDefinition<(u8, &str), u64> = TableDefinition::new("node_keys");

/// Label index: (label code, NodeId) -> ()
/// Range scans over one label return nodes in creation order.
const LABELS: TableDefinition<(u8, u64), ()> = TableDefinition::new("labels");

/// Outgoing relationships: (from, rel code, to) -> ()
const OUTGOING: TableDefinition<(u64, u8, u64), ()> = TableDefinition::new("outgoing");

/// Incoming relationships: (to, rel code, from) -> ()
const INCOMING: TableDefinition<(u64, u8, u64), ()> = TableDefinition::new("incoming");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_NODE_ID: &str = "next_node_id";

fn storage_err(e: impl std::fmt::Display) -> GraphError {
    GraphError::StorageUnavailable(e.to_string())
}

fn encode(node: &Node) -> Result<Vec<u8>, GraphError> {
    postcard::to_allocvec(node).map_err(|e| GraphError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Node, GraphError> {
    postcard::from_bytes(bytes).map_err(|e| GraphError::Serialization(e.to_string()))
}

/// A disk-backed graph store using redb.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
    /// Next available node ID (mirrors the `next_node_id` metadata entry).
    next_node_id: u64,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph")
            .field("next_node_id", &self.next_node_id)
            .finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a graph database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(NODES).map_err(storage_err)?;
            let _ = write_txn.open_table(NODE_KEYS).map_err(storage_err)?;
            let _ = write_txn.open_table(LABELS).map_err(storage_err)?;
            let _ = write_txn.open_table(OUTGOING).map_err(storage_err)?;
            let _ = write_txn.open_table(INCOMING).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        let next_node_id = {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(METADATA).map_err(storage_err)?;
            table
                .get(NEXT_NODE_ID)
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        Ok(Self { db, next_node_id })
    }
}

// =============================================================================
// GRAPHSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl GraphStore for RedbGraph {
    fn merge_node(&mut self, label: Label, key: &str) -> Result<NodeId, GraphError> {
        if key.is_empty() {
            return Err(GraphError::InvalidArgument(format!(
                "{} key must not be empty",
                label.as_str()
            )));
        }

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let node_id = {
            let mut keys_table = write_txn.open_table(NODE_KEYS).map_err(storage_err)?;
            let existing = keys_table
                .get((label.code(), key))
                .map_err(storage_err)?
                .map(|v| NodeId(v.value()));

            if let Some(node_id) = existing {
                // Nothing to write; dropping the transaction aborts it.
                return Ok(node_id);
            }

            let node_id = NodeId(self.next_node_id);
            let node_bytes = encode(&Node::new(node_id, label, key))?;

            let mut nodes_table = write_txn.open_table(NODES).map_err(storage_err)?;
            nodes_table
                .insert(node_id.0, node_bytes.as_slice())
                .map_err(storage_err)?;
            keys_table
                .insert((label.code(), key), node_id.0)
                .map_err(storage_err)?;

            let mut labels_table = write_txn.open_table(LABELS).map_err(storage_err)?;
            labels_table
                .insert((label.code(), node_id.0), ())
                .map_err(storage_err)?;

            let mut meta_table = write_txn.open_table(METADATA).map_err(storage_err)?;
            meta_table
                .insert(NEXT_NODE_ID, node_id.0.saturating_add(1))
                .map_err(storage_err)?;

            node_id
        };
        write_txn.commit().map_err(storage_err)?;

        self.next_node_id = node_id.0.saturating_add(1);
        Ok(node_id)
    }

    fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<(), GraphError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut nodes_table = write_txn.open_table(NODES).map_err(storage_err)?;
            let mut stored = match nodes_table.get(node.0).map_err(storage_err)? {
                Some(data) => decode(data.value())?,
                None => return Err(GraphError::NodeNotFound(node)),
            };
            stored.properties.extend(properties);

            let node_bytes = encode(&stored)?;
            nodes_table
                .insert(node.0, node_bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn merge_relationship(
        &mut self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
    ) -> Result<bool, GraphError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let nodes_table = write_txn.open_table(NODES).map_err(storage_err)?;
            for id in [from, to] {
                if nodes_table.get(id.0).map_err(storage_err)?.is_none() {
                    return Err(GraphError::NodeNotFound(id));
                }
            }

            let mut out_table = write_txn.open_table(OUTGOING).map_err(storage_err)?;
            if out_table
                .get((from.0, rel.code(), to.0))
                .map_err(storage_err)?
                .is_some()
            {
                return Ok(false);
            }
            out_table
                .insert((from.0, rel.code(), to.0), ())
                .map_err(storage_err)?;

            let mut in_table = write_txn.open_table(INCOMING).map_err(storage_err)?;
            in_table
                .insert((to.0, rel.code(), from.0), ())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(true)
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let nodes_table = read_txn.open_table(NODES).map_err(storage_err)?;

        match nodes_table.get(id.0).map_err(storage_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn find_node(&self, label: Label, key: &str) -> Result<Option<NodeId>, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let keys_table = read_txn.open_table(NODE_KEYS).map_err(storage_err)?;
        let found = keys_table
            .get((label.code(), key))
            .map_err(storage_err)?
            .map(|v| NodeId(v.value()));
        Ok(found)
    }

    fn nodes_with_label(&self, label: Label) -> Result<Vec<NodeId>, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let labels_table = read_txn.open_table(LABELS).map_err(storage_err)?;

        let mut ids = Vec::new();
        for entry in labels_table
            .range((label.code(), 0u64)..=(label.code(), u64::MAX))
            .map_err(storage_err)?
        {
            let (key, _) = entry.map_err(storage_err)?;
            ids.push(NodeId(key.value().1));
        }
        Ok(ids)
    }

    fn related(
        &self,
        node: NodeId,
        rel: RelType,
        direction: Direction,
    ) -> Result<Vec<NodeId>, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = match direction {
            Direction::Outgoing => read_txn.open_table(OUTGOING),
            Direction::Incoming => read_txn.open_table(INCOMING),
        }
        .map_err(storage_err)?;

        let mut ids = Vec::new();
        for entry in table
            .range((node.0, rel.code(), 0u64)..=(node.0, rel.code(), u64::MAX))
            .map_err(storage_err)?
        {
            let (key, _) = entry.map_err(storage_err)?;
            ids.push(NodeId(key.value().2));
        }
        Ok(ids)
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let nodes_table = read_txn.open_table(NODES).map_err(storage_err)?;
        Ok(nodes_table.len().map_err(storage_err)? as usize)
    }

    fn relationship_count(&self) -> Result<usize, GraphError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let out_table = read_txn.open_table(OUTGOING).map_err(storage_err)?;
        Ok(out_table.len().map_err(storage_err)? as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyValue;
    use tempfile::tempdir;

    #[test]
    fn merge_node_deduplicates() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let a = graph.merge_node(Label::Publisher, "Valve").expect("merge");
        let b = graph.merge_node(Label::Publisher, "Valve").expect("merge");
        let c = graph.merge_node(Label::Tag, "Valve").expect("merge");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(graph.node_count().expect("count"), 2);
        assert_eq!(
            graph.find_node(Label::Publisher, "Valve").expect("find"),
            Some(a)
        );
        assert_eq!(graph.find_node(Label::Publisher, "valve").expect("find"), None);
    }

    #[test]
    fn relationships_are_duplicate_free() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let publisher = graph.merge_node(Label::Publisher, "Valve").expect("merge");
        let game = graph.merge_node(Label::Game, "570").expect("merge");

        assert!(graph
            .merge_relationship(publisher, RelType::Published, game)
            .expect("rel"));
        assert!(!graph
            .merge_relationship(publisher, RelType::Published, game)
            .expect("rel"));
        assert_eq!(graph.relationship_count().expect("count"), 1);

        assert_eq!(
            graph
                .related(game, RelType::Published, Direction::Incoming)
                .expect("related"),
            vec![publisher]
        );
        assert_eq!(
            graph
                .related(publisher, RelType::Published, Direction::Outgoing)
                .expect("related"),
            vec![game]
        );
    }

    #[test]
    fn merge_relationship_rejects_dangling_nodes() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let game = graph.merge_node(Label::Game, "570").expect("merge");
        let result = graph.merge_relationship(game, RelType::HasTag, NodeId(999));

        assert!(matches!(result, Err(GraphError::NodeNotFound(NodeId(999)))));
        assert_eq!(graph.relationship_count().expect("count"), 0);
    }

    #[test]
    fn set_properties_on_missing_node_fails() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let result = graph.set_properties(NodeId(7), Properties::new());
        assert!(matches!(result, Err(GraphError::NodeNotFound(NodeId(7)))));
    }

    #[test]
    fn label_scan_in_creation_order() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let second = graph.merge_node(Label::Game, "b").expect("merge");
        graph.merge_node(Label::Genre, "RPG").expect("merge");
        let first = graph.merge_node(Label::Game, "a").expect("merge");

        assert_eq!(
            graph.nodes_with_label(Label::Game).expect("scan"),
            vec![second, first]
        );
        assert!(graph.nodes_with_label(Label::Tag).expect("scan").is_empty());
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        let (game, tag);
        {
            let mut graph = RedbGraph::open(&db_path).expect("open db");
            game = graph.merge_node(Label::Game, "570").expect("merge");
            tag = graph.merge_node(Label::Tag, "MOBA").expect("merge");
            graph
                .merge_relationship(game, RelType::HasTag, tag)
                .expect("rel");

            let mut props = Properties::new();
            props.insert("name".into(), PropertyValue::Text("Dota 2".into()));
            props.insert("estimated_owners".into(), PropertyValue::Integer(200_000_000));
            graph.set_properties(game, props).expect("set");
        }

        {
            let mut graph = RedbGraph::open(&db_path).expect("reopen db");
            assert_eq!(graph.node_count().expect("count"), 2);
            assert_eq!(graph.relationship_count().expect("count"), 1);

            let node = graph.node(game).expect("node").expect("exists");
            assert_eq!(node.text("name"), Some("Dota 2"));
            assert_eq!(node.integer("estimated_owners"), Some(200_000_000));

            // Ids keep counting from where the previous session stopped.
            let next = graph.merge_node(Label::Tag, "Strategy").expect("merge");
            assert!(next.0 > tag.0);
            assert_eq!(graph.merge_node(Label::Game, "570").expect("merge"), game);
        }
    }
}
