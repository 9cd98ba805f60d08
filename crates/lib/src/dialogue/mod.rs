//! # Lead Qualification Dialogue
//!
//! A per-user state machine that walks a prospect from the first message to a
//! recorded lead: name, company and industry first, then the business problem,
//! then an offer of a consultation and a phone number.

pub mod engine;
pub mod extract;
pub mod intent;
pub mod session_store;
pub mod state;

pub use engine::{DialogueEngine, DialogueError, DialogueSettings, TurnOutcome};
pub use extract::{
    extract_phone, extract_preferred_date, FactExtractors, FieldExtractor, PatternExtractor,
};
pub use intent::{
    IntentDetection, IntentDetector, MarkerIntentDetector, PhraseIntentDetector, ReplyIntent,
};
pub use session_store::{InMemorySessionStore, SessionStore, SqliteSessionStore};
pub use state::{CollectedFields, Field, Session, Stage};
