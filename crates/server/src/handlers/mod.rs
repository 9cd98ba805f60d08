//! # API Route Handlers
//!
//! The handlers are split into sub-modules by the part of the API they serve.

pub mod chat;
pub mod dialogue;
pub mod documents;
pub mod general;

// Re-export all handlers so the router can reach them under `handlers::`.
pub use chat::*;
pub use dialogue::*;
pub use documents::*;
pub use general::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
