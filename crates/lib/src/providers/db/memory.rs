//! # In-Memory Stores
//!
//! Process-local implementations of the storage traits. State is lost on restart.

use crate::{
    leads::Lead,
    providers::db::storage::{
        cosine_similarity, rank_candidates, DocumentStore, LeadStore, StoreError,
    },
    types::{ChunkRecord, RetrievedDoc},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    chunks: Arc<RwLock<Vec<(String, ChunkRecord)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every stored chunk.
    pub async fn chunks(&self) -> Vec<ChunkRecord> {
        self.chunks
            .read()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_chunk(&self, record: &ChunkRecord) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.chunks.write().await.push((id.clone(), record.clone()));
        Ok(id)
    }

    async fn nearest(
        &self,
        query: &[f32],
        owner_filter: Option<&str>,
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<RetrievedDoc>, StoreError> {
        let chunks = self.chunks.read().await;
        let candidates = chunks
            .iter()
            .filter(|(_, record)| owner_filter.is_none_or(|owner| record.owner_id == owner))
            .map(|(_, record)| RetrievedDoc {
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                similarity: cosine_similarity(query, &record.embedding),
            })
            .collect();
        Ok(rank_candidates(candidates, top_k, threshold))
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryLeadStore {
    leads: Arc<RwLock<Vec<Lead>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.read().await.clone()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert_lead(&self, lead: &Lead) -> Result<String, StoreError> {
        self.leads.write().await.push(lead.clone());
        Ok(lead.id.clone())
    }
}
