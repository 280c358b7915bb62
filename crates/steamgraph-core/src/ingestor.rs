//! # Ingestion Pipeline
//!
//! Batch import of the games dataset into a graph store.
//!
//! - Read every row of the CSV source
//! - Rank rows by estimated owners (stable, descending)
//! - Keep the configured top-N
//! - Normalize and upsert each kept row, reporting progress
//!
//! A row that cannot be read or carries no identifier is skipped and counted;
//! it never aborts the run. Storage failures do. The pipeline is not
//! resumable, but re-running it over the same source is always safe because
//! every write goes through the idempotent [`UpsertEngine`].

use crate::graph::GraphStore;
use crate::normalize::{RawRecord, normalize};
use crate::primitives::{DEFAULT_MAX_ROWS, PROGRESS_BATCH_SIZE};
use crate::upsert::UpsertEngine;
use crate::GraphError;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Pipeline settings, passed explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Ceiling on the number of rows kept after ranking.
    pub max_rows: usize,
    /// Progress is reported every this many ingested rows (0 = never).
    pub progress_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            progress_every: PROGRESS_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows,
            ..Self::default()
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Rows successfully read from the source.
    pub read: usize,
    /// Rows that survived ranking and truncation.
    pub kept: usize,
    /// Rows upserted into the graph.
    pub ingested: usize,
    /// Unreadable rows plus kept rows without an identifier.
    pub skipped: usize,
    /// Relationships created by this run (0 when re-run over the same data).
    pub relationships: usize,
}

/// The Ingestor drives the ingestion pipeline.
pub struct Ingestor;

impl Ingestor {
    /// Read every row of a CSV source.
    ///
    /// Returns the readable rows in source order and the number of rows that
    /// could not be decoded. Only an I/O failure of the source itself is an
    /// error.
    pub fn read_records<R: Read>(source: R) -> Result<(Vec<RawRecord>, usize), GraphError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(source);

        let mut records = Vec::new();
        let mut unreadable = 0;
        for (index, result) in reader.deserialize::<RawRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(GraphError::Source(e.to_string()));
                }
                Err(e) => {
                    // +2: one-based, after the header line
                    tracing::warn!(row = index + 2, error = %e, "skipping unreadable row");
                    unreadable += 1;
                }
            }
        }
        Ok((records, unreadable))
    }

    /// Stable sort by estimated owners, descending, then truncate.
    ///
    /// Rows with equal estimates keep their source order, so the cut at
    /// `max_rows` is deterministic.
    #[must_use]
    pub fn rank(mut records: Vec<RawRecord>, max_rows: usize) -> Vec<RawRecord> {
        records.sort_by_cached_key(|record| Reverse(record.owners()));
        records.truncate(max_rows);
        records
    }

    /// Run the pipeline over an in-memory or streamed source.
    pub fn run<G: GraphStore, R: Read>(
        graph: &mut G,
        source: R,
        config: &IngestConfig,
    ) -> Result<IngestSummary, GraphError> {
        Self::run_with_progress(graph, source, config, |_| {})
    }

    /// Run the pipeline over a file on disk.
    pub fn run_path<G: GraphStore>(
        graph: &mut G,
        path: impl AsRef<Path>,
        config: &IngestConfig,
    ) -> Result<IngestSummary, GraphError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| GraphError::Source(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), max_rows = config.max_rows, "ingesting dataset");
        Self::run(graph, file, config)
    }

    /// Run the pipeline, calling `on_progress` with the cumulative ingested
    /// count every `config.progress_every` rows.
    pub fn run_with_progress<G, R, F>(
        graph: &mut G,
        source: R,
        config: &IngestConfig,
        mut on_progress: F,
    ) -> Result<IngestSummary, GraphError>
    where
        G: GraphStore,
        R: Read,
        F: FnMut(usize),
    {
        let (records, unreadable) = Self::read_records(source)?;
        let read = records.len();
        let kept = Self::rank(records, config.max_rows);

        let mut summary = IngestSummary {
            read,
            kept: kept.len(),
            ingested: 0,
            skipped: unreadable,
            relationships: 0,
        };

        for raw in &kept {
            let Some(record) = normalize(raw) else {
                tracing::warn!(name = ?raw.name, "skipping row without AppID");
                summary.skipped += 1;
                continue;
            };

            let outcome = UpsertEngine::upsert(graph, &record)?;
            summary.ingested += 1;
            summary.relationships += outcome.relationships_created;

            if config.progress_every > 0 && summary.ingested % config.progress_every == 0 {
                tracing::info!(ingested = summary.ingested, "ingestion progress");
                on_progress(summary.ingested);
            }
        }

        tracing::info!(
            read = summary.read,
            kept = summary.kept,
            ingested = summary.ingested,
            skipped = summary.skipped,
            relationships = summary.relationships,
            "ingestion complete"
        );
        Ok(summary)
    }
}

// =============================================================================
// TESTS
// =============================================================================
