pub mod embedding;
pub mod openai;

use crate::{errors::PromptError, types::ChatMessage};
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::{Embedder, HttpEmbedder, RetryPolicy};
pub use openai::ChatCompletionProvider;
use std::fmt::Debug;

/// A trait for interacting with a chat-completion service.
///
/// Implementations send an ordered list of messages and return the assistant's
/// reply text. A successful response without any choices yields an empty string.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
