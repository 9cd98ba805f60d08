//! # Shared Constants
//!
//! Defaults shared by the library and the server so both agree on tuning values.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/leadrag.db";

/// Maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Characters shared between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Number of documents returned by a retrieval.
pub const DEFAULT_TOP_K: usize = 5;

/// Minimum cosine similarity for a document to be retrieved.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Dimension of the stored embedding vectors.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Completion requests give up after this many seconds.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Embedding requests give up after this many seconds, per attempt.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_EMBEDDING_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_EMBEDDING_BASE_DELAY_MS: u64 = 2000;
pub const DEFAULT_EMBEDDING_MAX_DELAY_MS: u64 = 10_000;

/// Source label used when a document carries no filename.
pub const UNKNOWN_SOURCE: &str = "unknown";
