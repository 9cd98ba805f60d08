//! # Dialogue Handlers
//!
//! The lead-qualification conversation as used by chat front-ends: one call
//! per user message, plus a reset that starts over.

use super::{AppError, AppState};
use crate::types::{ResetRequest, ResetResponse, TurnRequest, TurnResponse};
use axum::{extract::State, Json};
use leadrag::prompts::dialogue::TURN_FAILURE_APOLOGY;
use tracing::{error, warn};

/// The handler for `POST /dialogue/turn`.
///
/// A failed turn still answers with 200 and an apology; the session is left
/// as it was so the user can simply retry.
pub async fn dialogue_turn_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    match app_state
        .dialogue
        .handle_turn(&payload.user_id, &payload.message)
        .await
    {
        Ok(outcome) => {
            if let Some(reason) = &outcome.lead_error {
                warn!(user_id = %payload.user_id, "Lead acknowledged but not stored: {reason}");
            }
            Ok(Json(TurnResponse {
                reply: outcome.reply,
                stage: outcome.stage,
                lead_id: outcome.lead_id,
            }))
        }
        Err(e) => {
            error!(user_id = %payload.user_id, "Dialogue turn failed: {e}");
            let stage = app_state
                .dialogue
                .session(&payload.user_id)
                .await
                .map(|session| session.stage)
                .unwrap_or_default();
            Ok(Json(TurnResponse {
                reply: TURN_FAILURE_APOLOGY.to_string(),
                stage,
                lead_id: None,
            }))
        }
    }
}

/// The handler for `POST /dialogue/reset`.
pub async fn dialogue_reset_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }
    let reply = app_state.dialogue.reset(&payload.user_id).await?;
    Ok(Json(ResetResponse { reply }))
}
