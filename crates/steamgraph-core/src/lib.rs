//! # steamgraph-core
//!
//! The deterministic Graph Engine for SteamGraph.
//!
//! This crate turns a flat games dataset into a small property graph
//! (Game, Publisher, Genre, Tag) and answers a fixed set of read queries
//! against it.
//!
//! ## Pipelines
//!
//! - Ingestion: CSV row → [`RawRecord`] → [`NormalizedRecord`] → graph
//!   nodes and relationships, through the idempotent [`UpsertEngine`]
//! - Querying: request → [`Pattern`] → bound rows → ranked, de-duplicated
//!   response records, through the [`QueryMapper`]
//!
//! The two pipelines share only the data model and the [`GraphStore`]
//! capability.
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies
//! - The query layer never mutates the graph
//! - Merge-or-create is a storage primitive; the CORE only composes it

// =============================================================================
// MODULES
// =============================================================================

pub mod graph;
pub mod ingestor;
pub mod metrics;
pub mod normalize;
pub mod owners;
pub mod pattern;
pub mod primitives;
pub mod query;
pub mod session;
pub mod storage;
pub mod types;
pub mod upsert;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Direction, GraphError, Label, Node, NodeId, Properties, PropertyValue, RelType,
};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use graph::{Graph, GraphStore};
pub use ingestor::{IngestConfig, IngestSummary, Ingestor};
pub use metrics::GraphMetrics;
pub use normalize::{NormalizedRecord, RawRecord, normalize};
pub use owners::estimate_owners;
pub use pattern::{Hop, KeyMatch, NodeMatch, Pattern, Row};
pub use query::{
    CategoryGames, GameDetail, GameSummary, PublisherGames, QueryMapper, SimilarGame,
    clamp_limit,
};
pub use session::{Session, StorageBackend};
pub use storage::RedbGraph;
pub use upsert::{UpsertEngine, UpsertOutcome};
