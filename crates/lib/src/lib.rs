//! # leadrag
//!
//! Retrieval-augmented answering over uploaded documents, plus a
//! lead-qualification dialogue that turns chat conversations into sales leads.
//!
//! The pieces are independent and wired together by the caller:
//! [`ingest::IngestionPipeline`] fills a [`providers::db::storage::DocumentStore`],
//! [`retriever::Retriever`] searches it, [`rag::RagClient`] answers questions,
//! and [`dialogue::DialogueEngine`] runs the qualification flow on top.

pub mod constants;
pub mod dialogue;
pub mod errors;
pub mod ingest;
pub mod leads;
pub mod prompts;
pub mod providers;
pub mod rag;
pub mod retriever;
pub mod types;

pub use errors::PromptError;
pub use rag::{AnswerRequest, AnswerResponse, RagClient, RagClientBuilder};
pub use retriever::Retriever;
