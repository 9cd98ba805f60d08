//! # Retriever
//!
//! Embeds a query and asks the document store for the nearest chunks. Retrieval
//! is best-effort: callers get an empty list instead of an error so a broken
//! index never blocks an answer.

use crate::{
    constants::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K},
    errors::PromptError,
    providers::{
        ai::Embedder,
        db::storage::{rank_candidates, DocumentStore, StoreError},
    },
    types::RetrievedDoc,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Failed to embed the query: {0}")]
    Embedding(#[from] PromptError),
    #[error("Similarity search failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    top_k: usize,
    threshold: f64,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            embedder,
            store,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Like [`Retriever::retrieve`], but surfaces failures.
    pub async fn try_retrieve(
        &self,
        query: &str,
        owner_filter: Option<&str>,
    ) -> Result<Vec<RetrievedDoc>, RetrievalError> {
        let vector = self.embedder.embed(query).await?;
        let found = self
            .store
            .nearest(&vector, owner_filter, self.top_k, self.threshold)
            .await?;
        // Stores are trusted, but a custom backend could return loose results.
        Ok(rank_candidates(found, self.top_k, self.threshold))
    }

    /// Returns up to `top_k` documents similar to `query`, best first.
    pub async fn retrieve(&self, query: &str, owner_filter: Option<&str>) -> Vec<RetrievedDoc> {
        match self.try_retrieve(query, owner_filter).await {
            Ok(docs) => {
                debug!(found = docs.len(), ?owner_filter, "Retrieved documents");
                docs
            }
            Err(e) => {
                warn!("Retrieval failed, continuing without documents: {e}");
                Vec::new()
            }
        }
    }
}
