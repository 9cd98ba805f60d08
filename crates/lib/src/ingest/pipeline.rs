//! # Ingestion Pipeline
//!
//! Extract → chunk → embed → store. Chunks are embedded and stored
//! concurrently; a failing chunk is logged and skipped without affecting its
//! siblings.

use super::{chunker::split_text, extract::extract_text, extract::ExtractError};
use crate::{
    constants::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    errors::PromptError,
    providers::{
        ai::Embedder,
        db::storage::{DocumentStore, StoreError},
    },
    types::{ChunkRecord, UploadedFile},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Errors that abort the ingestion of a whole document.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Text extraction task failed: {0}")]
    Task(String),
}

/// Why a single chunk could not be stored.
#[derive(Error, Debug)]
pub enum ChunkFailure {
    #[error("embedding failed: {0}")]
    Embedding(#[from] PromptError),
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("storing failed: {0}")]
    Storage(#[from] StoreError),
    #[error("chunk task aborted: {0}")]
    Task(String),
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// A per-document summary of an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub filename: String,
    pub chunks_total: usize,
    pub chunks_stored: usize,
    /// `(chunk_index, reason)` for every chunk that was skipped.
    pub failures: Vec<(usize, String)>,
}

#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    settings: ChunkingSettings,
    /// When set, embeddings of any other length are rejected.
    expected_dimension: Option<usize>,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
        settings: ChunkingSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
            expected_dimension: None,
        }
    }

    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    /// Ingests a document and returns the number of chunks stored.
    pub async fn ingest(
        &self,
        owner_id: &str,
        file: UploadedFile,
        extra_metadata: Map<String, Value>,
    ) -> Result<usize, IngestError> {
        Ok(self
            .ingest_with_report(owner_id, file, extra_metadata)
            .await?
            .chunks_stored)
    }

    #[instrument(skip(self, file, extra_metadata), fields(filename = %file.filename))]
    pub async fn ingest_with_report(
        &self,
        owner_id: &str,
        file: UploadedFile,
        extra_metadata: Map<String, Value>,
    ) -> Result<IngestionReport, IngestError> {
        let filename = file.filename.clone();
        let content_type = file.content_type.clone();

        let text = tokio::task::spawn_blocking(move || extract_text(&file))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;

        let chunks = split_text(&text, self.settings.chunk_size, self.settings.overlap);
        let chunks_total = chunks.len();
        if chunks.is_empty() {
            warn!("Document produced no text to ingest");
        }

        let handles = chunks.into_iter().enumerate().map(|(index, content)| {
            let embedder = Arc::clone(&self.embedder);
            let store = Arc::clone(&self.store);
            let mut metadata = extra_metadata.clone();
            metadata.insert("owner_id".into(), json!(owner_id));
            metadata.insert("filename".into(), json!(filename));
            metadata.insert("content_type".into(), json!(content_type));
            metadata.insert("chunk_index".into(), json!(index));
            metadata.insert("chunk_size".into(), json!(content.chars().count()));
            let record_base = (owner_id.to_string(), filename.clone(), metadata);
            let expected_dimension = self.expected_dimension;

            tokio::spawn(async move {
                let (owner_id, filename, metadata) = record_base;
                let embedding = embedder.embed(&content).await?;
                if let Some(expected) = expected_dimension {
                    if embedding.len() != expected {
                        return Err(ChunkFailure::DimensionMismatch {
                            expected,
                            actual: embedding.len(),
                        });
                    }
                }
                let record = ChunkRecord {
                    owner_id,
                    filename,
                    chunk_index: index,
                    content,
                    metadata,
                    embedding,
                };
                store.insert_chunk(&record).await?;
                Ok::<_, ChunkFailure>(())
            })
        });

        let mut failures = Vec::new();
        for (index, outcome) in join_all(handles).await.into_iter().enumerate() {
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_error) => ChunkFailure::Task(join_error.to_string()),
            };
            error!(chunk_index = index, "Failed to ingest chunk: {failure}");
            failures.push((index, failure.to_string()));
        }

        let report = IngestionReport {
            filename,
            chunks_total,
            chunks_stored: chunks_total - failures.len(),
            failures,
        };
        info!(
            total = report.chunks_total,
            stored = report.chunks_stored,
            "Document ingested"
        );
        Ok(report)
    }
}
