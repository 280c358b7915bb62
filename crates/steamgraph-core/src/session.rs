//! # Session Module
//!
//! A Session owns the storage backend and exposes the ingestion and query
//! operations over it.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses in-memory `Graph` (fast, volatile)
//! - `Persistent`: Uses `RedbGraph` for disk-backed ACID storage

use crate::graph::{Graph, GraphStore};
use crate::ingestor::{IngestConfig, IngestSummary, Ingestor};
use crate::metrics::GraphMetrics;
use crate::query::{
    CategoryGames, GameDetail, GameSummary, PublisherGames, QueryMapper, SimilarGame,
};
use crate::storage::RedbGraph;
use crate::{Direction, GraphError, Label, Node, NodeId, Properties, RelType};
use std::io::Read;
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(Graph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Graph::new())
    }
}

// StorageBackend does NOT implement Clone: a redb handle cannot be cloned.

impl GraphStore for StorageBackend {
    fn merge_node(&mut self, label: Label, key: &str) -> Result<NodeId, GraphError> {
        match self {
            Self::InMemory(g) => g.merge_node(label, key),
            Self::Persistent(r) => r.merge_node(label, key),
        }
    }

    fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<(), GraphError> {
        match self {
            Self::InMemory(g) => g.set_properties(node, properties),
            Self::Persistent(r) => r.set_properties(node, properties),
        }
    }

    fn merge_relationship(
        &mut self,
        from: NodeId,
        rel: RelType,
        to: NodeId,
    ) -> Result<bool, GraphError> {
        match self {
            Self::InMemory(g) => g.merge_relationship(from, rel, to),
            Self::Persistent(r) => r.merge_relationship(from, rel, to),
        }
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>, GraphError> {
        match self {
            Self::InMemory(g) => g.node(id),
            Self::Persistent(r) => r.node(id),
        }
    }

    fn find_node(&self, label: Label, key: &str) -> Result<Option<NodeId>, GraphError> {
        match self {
            Self::InMemory(g) => g.find_node(label, key),
            Self::Persistent(r) => r.find_node(label, key),
        }
    }

    fn nodes_with_label(&self, label: Label) -> Result<Vec<NodeId>, GraphError> {
        match self {
            Self::InMemory(g) => g.nodes_with_label(label),
            Self::Persistent(r) => r.nodes_with_label(label),
        }
    }

    fn related(
        &self,
        node: NodeId,
        rel: RelType,
        direction: Direction,
    ) -> Result<Vec<NodeId>, GraphError> {
        match self {
            Self::InMemory(g) => g.related(node, rel, direction),
            Self::Persistent(r) => r.related(node, rel, direction),
        }
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        match self {
            Self::InMemory(g) => g.node_count(),
            Self::Persistent(r) => r.node_count(),
        }
    }

    fn relationship_count(&self) -> Result<usize, GraphError> {
        match self {
            Self::InMemory(g) => g.relationship_count(),
            Self::Persistent(r) => r.relationship_count(),
        }
    }
}

/// A Session wraps a storage backend.
///
/// Writes go through `&mut self` (ingestion); every query takes `&self`, so
/// a shared session behind a read-write lock serves concurrent readers.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbGraph::open(path)?),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Run the ingestion pipeline over a readable CSV source.
    pub fn ingest<R: Read>(
        &mut self,
        source: R,
        config: &IngestConfig,
    ) -> Result<IngestSummary, GraphError> {
        Ingestor::run(&mut self.backend, source, config)
    }

    /// Like [`Session::ingest`], reporting the ingested count every batch.
    pub fn ingest_with_progress<R: Read, F: FnMut(usize)>(
        &mut self,
        source: R,
        config: &IngestConfig,
        on_progress: F,
    ) -> Result<IngestSummary, GraphError> {
        Ingestor::run_with_progress(&mut self.backend, source, config, on_progress)
    }

    /// Run the ingestion pipeline over a CSV file.
    pub fn ingest_path(
        &mut self,
        path: impl AsRef<Path>,
        config: &IngestConfig,
    ) -> Result<IngestSummary, GraphError> {
        Ingestor::run_path(&mut self.backend, path, config)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn list_games(&self, limit: usize) -> Result<Vec<GameSummary>, GraphError> {
        QueryMapper::list_games(&self.backend, limit)
    }

    pub fn game_detail(&self, id: &str) -> Result<GameDetail, GraphError> {
        QueryMapper::game_detail(&self.backend, id)
    }

    pub fn similar_games(&self, id: &str) -> Result<Vec<SimilarGame>, GraphError> {
        QueryMapper::similar_games(&self.backend, id)
    }

    pub fn games_by_publisher(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<PublisherGames, GraphError> {
        QueryMapper::games_by_publisher(&self.backend, name, limit)
    }

    pub fn games_by_category(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<CategoryGames, GraphError> {
        QueryMapper::games_by_category(&self.backend, name, limit)
    }

    /// Node counts per label and the relationship total.
    pub fn metrics(&self) -> Result<GraphMetrics, GraphError> {
        GraphMetrics::collect(&self.backend)
    }
}

// =============================================================================
// TESTS
// =============================================================================
