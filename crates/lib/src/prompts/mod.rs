//! # Prompt Template Modules
//!
//! Prompt texts and the composer that stitches them into a system prompt.

pub mod composer;
pub mod core;
pub mod dialogue;

pub use composer::{compose, known_facts_line, ComposeInput, RagContext};
