//! # Storage Traits
//!
//! Interfaces for persisted document chunks and captured leads, plus the
//! vector helpers shared by every backend. `SqliteProvider` implements both
//! traits; the in-memory variants back tests and single-process deployments.

use crate::{
    leads::Lead,
    types::{ChunkRecord, RetrievedDoc},
};
use async_trait::async_trait;
use std::{cmp::Ordering, fmt::Debug};
use thiserror::Error;

/// Errors raised by any storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage connection error: {0}")]
    Connection(String),
    #[error("Storage operation failed: {0}")]
    Operation(String),
    #[error("Failed to (de)serialize stored record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<turso::Error> for StoreError {
    fn from(err: turso::Error) -> Self {
        StoreError::Operation(err.to_string())
    }
}

/// Persists document chunks and answers nearest-neighbour queries over them.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Stores one chunk and returns its generated id.
    async fn insert_chunk(&self, record: &ChunkRecord) -> Result<String, StoreError>;

    /// Returns at most `top_k` chunks whose cosine similarity to `query` is at
    /// least `threshold`, ordered by similarity descending. When `owner_filter`
    /// is set, only chunks uploaded by that owner are considered.
    async fn nearest(
        &self,
        query: &[f32],
        owner_filter: Option<&str>,
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<RetrievedDoc>, StoreError>;
}

/// Persists captured leads.
#[async_trait]
pub trait LeadStore: Send + Sync + Debug {
    /// Inserts the lead and returns the id it was stored under.
    async fn insert_lead(&self, lead: &Lead) -> Result<String, StoreError>;
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when the lengths differ, either vector is empty, or either
/// has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Applies the threshold, sorts by similarity descending and keeps `top_k`.
pub fn rank_candidates(
    candidates: Vec<RetrievedDoc>,
    top_k: usize,
    threshold: f64,
) -> Vec<RetrievedDoc> {
    let mut ranked: Vec<RetrievedDoc> = candidates
        .into_iter()
        .filter(|doc| doc.similarity >= threshold)
        .collect();
    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(top_k);
    ranked
}

/// Encodes an embedding as little-endian `f32` bytes, the layout turso's
/// `vector32` functions read.
pub fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}
