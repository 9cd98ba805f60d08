use thiserror::Error;

/// Errors raised while talking to the completion and embedding services.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error (status {status}): {body}")]
    AiApi { status: u16, body: String },
    #[error("AI provider returned an empty embedding")]
    EmptyEmbedding,
    #[error("AI provider is missing")]
    MissingAiProvider,
}

impl PromptError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, rate limiting (429) and server-side (5xx)
    /// responses are transient. Everything else is fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            PromptError::AiRequest(e) => e.is_timeout() || e.is_connect(),
            PromptError::AiApi { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
