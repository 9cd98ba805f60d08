//! # Core Types
//!
//! Data structures shared between ingestion, retrieval and answering.

use crate::constants::UNKNOWN_SOURCE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message of an OpenAI-compatible chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A file received for ingestion.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// The declared MIME type. May be empty when the client did not send one.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// One stored chunk of a document together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub owner_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub content: String,
    pub metadata: Map<String, Value>,
    pub similarity: f64,
}

impl RetrievedDoc {
    /// The filename recorded in the metadata, or `"unknown"`.
    pub fn source_filename(&self) -> &str {
        self.metadata
            .get("filename")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
    }
}
