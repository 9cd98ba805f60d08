//! # Document Ingestion
//!
//! Everything needed to turn an uploaded file into searchable, embedded chunks.

pub mod chunker;
pub mod extract;
pub mod pipeline;

pub use chunker::split_text;
pub use extract::{extract_text, DocumentFormat, ExtractError};
pub use pipeline::{ChunkFailure, ChunkingSettings, IngestError, IngestionPipeline, IngestionReport};
