//! # Chat Handler
//!
//! A single question answered by the RAG client, without dialogue state.

use super::{AppError, AppState};
use crate::types::{ChatRequest, ChatResponse};
use axum::{extract::State, Json};
use leadrag::AnswerRequest;
use tracing::info;

/// The handler for `POST /chat/`.
///
/// `user_id` doubles as the owner filter, so users are answered from the
/// documents they uploaded themselves.
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    info!(user_id = %payload.user_id, use_rag = payload.use_rag, "Chat request received");

    let request = AnswerRequest {
        user_message: payload.message,
        owner_id: Some(payload.user_id).filter(|id| !id.is_empty()),
        use_rag: payload.use_rag,
        stage_directive: payload.system_extra,
        context_snapshot: payload.context_info,
    };
    let answer = app_state.rag.answer(&request).await?;

    Ok(Json(ChatResponse {
        reply: answer.reply,
        sources: answer.sources,
    }))
}
