//! Request and response bodies of the HTTP API.

use leadrag::dialogue::Stage;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Also used as the owner filter for retrieval.
    pub user_id: String,
    pub message: String,
    #[serde(default = "default_true")]
    pub use_rag: bool,
    /// An extra instruction for the model, such as a dialogue stage directive.
    #[serde(default)]
    pub system_extra: Option<String>,
    /// Facts already known about the user.
    #[serde(default)]
    pub context_info: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub filename: String,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reply: String,
}
