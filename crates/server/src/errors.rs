use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadrag::{
    dialogue::DialogueError,
    ingest::{ExtractError, IngestError},
    PromptError,
};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// The request itself was malformed.
    BadRequest(String),
    /// Errors from the completion or embedding services.
    Prompt(PromptError),
    /// Errors while turning an upload into chunks.
    Ingest(IngestError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Prompt(err)
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingest(err)
    }
}

impl From<DialogueError> for AppError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::Completion(e) => AppError::Prompt(e),
            DialogueError::Session(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(message) => {
                warn!("Rejected request: {message}");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Prompt(err) => {
                error!("PromptError: {:?}", err);
                match err {
                    PromptError::MissingAiProvider | PromptError::ReqwestClientBuild(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    ),
                    PromptError::AiRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to AI provider failed: {e}"),
                    ),
                    PromptError::AiDeserialization(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deserialize AI provider response: {e}"),
                    ),
                    PromptError::AiApi { status, body } => (
                        StatusCode::BAD_GATEWAY,
                        format!("AI provider error (status {status}): {body}"),
                    ),
                    PromptError::EmptyEmbedding => (
                        StatusCode::BAD_GATEWAY,
                        "AI provider returned an empty embedding.".to_string(),
                    ),
                }
            }
            AppError::Ingest(err) => {
                error!("IngestError: {:?}", err);
                match err {
                    IngestError::Extract(ExtractError::UnsupportedFormat(format)) => (
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        format!("Unsupported document format: {format}"),
                    ),
                    IngestError::Extract(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
                    IngestError::Task(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                    ),
                }
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
