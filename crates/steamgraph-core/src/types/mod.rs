//! # Core Type Definitions
//!
//! This module contains all core types for the SteamGraph property graph:
//! - Graph identifiers (`NodeId`)
//! - The fixed schema (`Label`, `RelType`, `Direction`)
//! - Stored nodes and their scalar properties (`Node`, `PropertyValue`)
//! - Error types (`GraphError`)
//!
//! ## Ordering Guarantees
//!
//! `NodeId`s are assigned monotonically on creation, so iterating nodes in
//! `NodeId` order is the storage-default order used by every query.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the internal graph.
///
/// Assigned by the storage backend; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

// =============================================================================
// SCHEMA
// =============================================================================

/// Node label. The schema is fixed: every node carries exactly one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Game,
    Publisher,
    Genre,
    Tag,
}

impl Label {
    /// Stable one-byte code used as a key prefix in persistent tables.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Game => 0,
            Self::Publisher => 1,
            Self::Genre => 2,
            Self::Tag => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Publisher => "Publisher",
            Self::Genre => "Genre",
            Self::Tag => "Tag",
        }
    }
}

/// Relationship type. Each type connects exactly one pair of labels:
///
/// - `Published`: Publisher -> Game
/// - `HasGenre`: Game -> Genre
/// - `HasTag`: Game -> Tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelType {
    Published,
    HasGenre,
    HasTag,
}

impl RelType {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Published => 0,
            Self::HasGenre => 1,
            Self::HasTag => 2,
        }
    }

    /// The (source, target) labels this relationship connects.
    #[must_use]
    pub const fn endpoints(self) -> (Label, Label) {
        match self {
            Self::Published => (Label::Publisher, Label::Game),
            Self::HasGenre => (Label::Game, Label::Genre),
            Self::HasTag => (Label::Game, Label::Tag),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Published => "PUBLISHED",
            Self::HasGenre => "HAS_GENRE",
            Self::HasTag => "HAS_TAG",
        }
    }
}

/// Direction of a hop relative to the node it starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow relationships where the current node is the source.
    Outgoing,
    /// Follow relationships where the current node is the target.
    Incoming,
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// A scalar property value stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    /// Non-negative integer (owner counts, ages).
    Integer(u64),
    Float(f64),
}

/// Scalar properties of a node, keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

// =============================================================================
// NODE
// =============================================================================

/// A node in the graph.
///
/// `(label, key)` is the identity of the node: the storage layer guarantees
/// at most one node per pair. For games the key is the external identifier,
/// for publishers, genres and tags it is the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Label,
    pub key: String,
    pub properties: Properties,
}

impl Node {
    /// Create a node without properties.
    #[must_use]
    pub fn new(id: NodeId, label: Label, key: impl Into<String>) -> Self {
        Self {
            id,
            label,
            key: key.into(),
            properties: Properties::new(),
        }
    }

    /// Text property, if present and textual.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer property, if present and integral.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<u64> {
        match self.properties.get(name) {
            Some(PropertyValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    /// Float property. Integers are widened so callers need not care how a
    /// number was stored.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.properties.get(name) {
            Some(PropertyValue::Float(v)) => Some(*v),
            Some(PropertyValue::Integer(v)) => Some(*v as f64),
            _ => None,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in SteamGraph.
///
/// Malformed field values during normalization are NOT errors: they are
/// replaced by defaults where they occur and never reach this type.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No entity matches the supplied identity.
    #[error("{label} not found: {key}")]
    NotFound { label: &'static str, key: String },

    /// A relationship referenced a node id that does not exist.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The storage backend could not execute an operation.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The ingestion source could not be opened or read as a whole.
    #[error("Source error: {0}")]
    Source(String),

    /// A caller-supplied argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphError {
    /// Shorthand for a `NotFound` error on the given label.
    #[must_use]
    pub fn not_found(label: Label, key: impl Into<String>) -> Self {
        Self::NotFound {
            label: label.as_str(),
            key: key.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
