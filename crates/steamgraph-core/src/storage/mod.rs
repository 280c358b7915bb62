//! # Storage Backends
//!
//! Persistent implementations of [`GraphStore`](crate::graph::GraphStore).

mod redb_graph;

pub use redb_graph::RedbGraph;
