//! # RAG Client
//!
//! Answers a user message with the completion service, optionally grounding
//! the answer in retrieved documents.

use crate::{
    constants::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    errors::PromptError,
    prompts::{
        compose,
        core::{DEFAULT_PERSONA, GENERIC_PERSONA},
        ComposeInput, RagContext,
    },
    providers::ai::AiProvider,
    retriever::Retriever,
    types::ChatMessage,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument};

/// A single question for [`RagClient::answer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub user_message: String,
    /// Restricts retrieval to documents uploaded by this owner.
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub use_rag: bool,
    #[serde(default)]
    pub stage_directive: Option<String>,
    /// A pre-rendered `Known: ...` line of collected facts.
    #[serde(default)]
    pub context_snapshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub reply: String,
    /// Filenames of the documents the answer was grounded in, in retrieval order.
    pub sources: Vec<String>,
}

pub struct RagClient {
    ai_provider: Arc<dyn AiProvider>,
    retriever: Option<Retriever>,
    persona: String,
    temperature: f32,
    max_tokens: u32,
}

impl fmt::Debug for RagClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagClient")
            .field("ai_provider", &self.ai_provider)
            .field("retrieval", &self.retriever.is_some())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl RagClient {
    #[instrument(skip(self, request), fields(use_rag = request.use_rag))]
    pub async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, PromptError> {
        let docs = match (&self.retriever, request.use_rag) {
            (Some(retriever), true) => Some(
                retriever
                    .retrieve(&request.user_message, request.owner_id.as_deref())
                    .await,
            ),
            _ => None,
        };

        let rag = match docs.as_deref() {
            None => RagContext::Disabled,
            Some([]) => RagContext::NoMatches,
            Some(found) => RagContext::Documents(found),
        };
        let sources: Vec<String> = docs
            .iter()
            .flatten()
            .map(|doc| doc.source_filename().to_string())
            .collect();

        // Plain chat without retrieval or dialogue guidance gets the neutral persona.
        let persona = if !request.use_rag && request.stage_directive.is_none() {
            GENERIC_PERSONA
        } else {
            self.persona.as_str()
        };

        let system_prompt = compose(&ComposeInput {
            persona,
            stage_directive: request.stage_directive.as_deref(),
            known_facts: request.context_snapshot.as_deref(),
            rag,
        });
        debug!(system_prompt_len = system_prompt.len(), sources = ?sources, "Composed system prompt");

        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(request.user_message.clone()),
        ];
        let reply = self
            .ai_provider
            .complete(&messages, self.temperature, self.max_tokens)
            .await?;
        info!(reply_len = reply.len(), sources = sources.len(), "Answer generated");

        Ok(AnswerResponse { reply, sources })
    }
}

/// A builder for [`RagClient`].
#[derive(Default)]
pub struct RagClientBuilder {
    ai_provider: Option<Arc<dyn AiProvider>>,
    retriever: Option<Retriever>,
    persona: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl RagClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ai_provider(mut self, ai_provider: Arc<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    /// Enables retrieval-augmented answers.
    pub fn retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Fails with [`PromptError::MissingAiProvider`] if no provider was set.
    pub fn build(self) -> Result<RagClient, PromptError> {
        let ai_provider = self.ai_provider.ok_or(PromptError::MissingAiProvider)?;
        Ok(RagClient {
            ai_provider,
            retriever: self.retriever,
            persona: self
                .persona
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}
