//! # Dialogue Engine
//!
//! Drives one user message through the qualification flow: capture contacts,
//! collect facts, pick a stage directive, ask the model, correct the stage
//! from the reply, and persist the session.

use super::{
    extract::{extract_phone, extract_preferred_date, FactExtractors},
    intent::{IntentDetection, IntentDetector},
    session_store::SessionStore,
    state::{Field, Session, Stage},
};
use crate::{
    errors::PromptError,
    leads::{LeadDraft, LeadRecorder},
    prompts::{
        dialogue::{
            ask_for_field, COMPLETED_DIRECTIVE, GREETING_DIRECTIVE, LEAD_ACKNOWLEDGMENT,
            NO_GREETING_DIRECTIVE, REPROMPT_PAIN_DIRECTIVE, REQUEST_CONTACT_DIRECTIVE,
            WELCOME_MESSAGE,
        },
        known_facts_line,
    },
    providers::db::storage::StoreError,
    rag::{AnswerRequest, RagClient},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("Session storage failed: {0}")]
    Session(#[from] StoreError),
    #[error("Completion failed: {0}")]
    Completion(#[from] PromptError),
}

/// The result of one handled message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub stage: Stage,
    pub sources: Vec<String>,
    /// Set when this turn recorded a lead.
    pub lead_id: Option<String>,
    /// Set when a lead should have been recorded but persisting it failed.
    pub lead_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueSettings {
    /// Ground replies in uploaded documents.
    pub use_rag: bool,
    /// Restricts retrieval to one owner's documents.
    pub knowledge_owner_id: Option<String>,
    pub intent_detection: IntentDetection,
}

#[derive(Debug)]
pub struct DialogueEngine {
    rag: Arc<RagClient>,
    sessions: Arc<dyn SessionStore>,
    recorder: LeadRecorder,
    extractors: FactExtractors,
    intent: Box<dyn IntentDetector>,
    settings: DialogueSettings,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DialogueEngine {
    pub fn new(
        rag: Arc<RagClient>,
        sessions: Arc<dyn SessionStore>,
        recorder: LeadRecorder,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            rag,
            sessions,
            recorder,
            extractors: FactExtractors::default(),
            intent: settings.intent_detection.detector(),
            settings,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the default rule-based fact extractors.
    pub fn with_extractors(mut self, extractors: FactExtractors) -> Self {
        self.extractors = extractors;
        self
    }

    /// The current session of `user_id`.
    pub async fn session(&self, user_id: &str) -> Result<Session, StoreError> {
        self.sessions.get(user_id).await
    }

    /// Restarts the conversation and returns the welcome message.
    pub async fn reset(&self, user_id: &str) -> Result<String, DialogueError> {
        let lock = self.turn_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.sessions.put(user_id, &Session::default()).await
        };
        self.release_turn_lock(user_id, lock).await;
        result?;
        info!(user_id, "Dialogue session reset");
        Ok(WELCOME_MESSAGE.to_string())
    }

    /// Number of users with a turn or reset running or waiting.
    pub async fn turns_in_flight(&self) -> usize {
        self.turn_locks.lock().await.len()
    }

    /// Handles one user message.
    ///
    /// On error the stored session is left exactly as it was before the turn.
    #[instrument(skip(self, message), fields(user_id = %user_id))]
    pub async fn handle_turn(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<TurnOutcome, DialogueError> {
        let lock = self.turn_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(user_id, message).await
        };
        self.release_turn_lock(user_id, lock).await;
        result
    }

    async fn run_turn(&self, user_id: &str, message: &str) -> Result<TurnOutcome, DialogueError> {
        let mut session = self.sessions.get(user_id).await?;
        let stage_at_start = session.stage;
        debug!(stage = %stage_at_start, "Loaded session");

        if session.stage != Stage::Completed {
            if let Some(phone) = extract_phone(message) {
                return self.capture_contact(user_id, session, message, phone).await;
            }
        }

        let newly_set = self
            .extractors
            .extract_into(message, &mut session.collected);
        if !newly_set.is_empty() {
            debug!(fields = ?newly_set, "Collected facts");
        }

        let mut pain_deferred = false;
        if stage_at_start == Stage::CollectingPain && session.collected.pain.is_none() {
            if reads_as_question(message) {
                pain_deferred = true;
            } else {
                session.collected.set_if_absent(Field::Pain, message);
            }
        }

        let directive = self.select_directive(&mut session, pain_deferred);
        let request = AnswerRequest {
            user_message: message.to_string(),
            owner_id: self.settings.knowledge_owner_id.clone(),
            use_rag: self.settings.use_rag,
            stage_directive: Some(directive),
            context_snapshot: known_facts_line(&session.collected),
        };
        let answer = self.rag.answer(&request).await?;

        let intent = self.intent.inspect(&answer.reply);
        if intent.requests_contact && session.advance_to(Stage::OfferConsultation) {
            info!(from = %stage_at_start, "Reply asked for contacts, advancing stage");
        }

        session.greeted = true;
        self.sessions.put(user_id, &session).await?;
        info!(from = %stage_at_start, to = %session.stage, "Turn handled");

        Ok(TurnOutcome {
            reply: intent.reply,
            stage: session.stage,
            sources: answer.sources,
            lead_id: None,
            lead_error: None,
        })
    }

    async fn turn_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    /// Drops the map entry once no other turn holds or awaits the lock.
    async fn release_turn_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.turn_locks.lock().await;
        drop(lock);
        if locks
            .get(user_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(user_id);
        }
    }

    async fn capture_contact(
        &self,
        user_id: &str,
        mut session: Session,
        message: &str,
        phone: String,
    ) -> Result<TurnOutcome, DialogueError> {
        self.extractors
            .extract_into(message, &mut session.collected);
        session.collected.set_if_absent(Field::Phone, phone);
        if let Some(date) = extract_preferred_date(message) {
            session.collected.set_if_absent(Field::PreferredDate, date);
        }

        // A failed session write must not leave a recorded lead behind.
        session.advance_to(Stage::Completed);
        session.greeted = true;
        self.sessions.put(user_id, &session).await?;

        let collected = &session.collected;
        let draft = LeadDraft {
            contact_id: user_id.to_string(),
            phone: collected.phone.clone(),
            name: collected.name.clone(),
            company: collected.company.clone(),
            industry: collected.industry.clone(),
            pain: collected.pain.clone(),
            preferred_date: collected.preferred_date.clone(),
            collected_data: collected.to_map(),
        };

        let (lead_id, lead_error) = match self.recorder.record(&draft).await {
            Ok(id) => (id, None),
            Err(e) => {
                error!("Failed to record lead: {e}");
                (None, Some(e.to_string()))
            }
        };
        info!(lead_id = ?lead_id, "Contact captured, dialogue completed");

        Ok(TurnOutcome {
            reply: LEAD_ACKNOWLEDGMENT.to_string(),
            stage: Stage::Completed,
            sources: Vec::new(),
            lead_id,
            lead_error,
        })
    }

    /// Picks the directive for this turn, advancing the stage where the
    /// collected facts allow it.
    fn select_directive(&self, session: &mut Session, pain_deferred: bool) -> String {
        let body = self.stage_directive(session, pain_deferred);
        let greeting = if session.greeted {
            NO_GREETING_DIRECTIVE
        } else {
            GREETING_DIRECTIVE
        };

        let mut parts = vec![greeting, body];
        if session.stage != Stage::Completed {
            if let Some(suffix) = self.intent.directive_suffix() {
                parts.push(suffix);
            }
        }
        parts.join("\n")
    }

    fn stage_directive(&self, session: &mut Session, pain_deferred: bool) -> &'static str {
        if session.stage <= Stage::GatheringInfo {
            match session.collected.first_missing(&Field::QUALIFYING) {
                Some(field) => {
                    session.advance_to(Stage::GatheringInfo);
                    return ask_for_field(field);
                }
                None => {
                    session.advance_to(Stage::CollectingPain);
                }
            }
        }

        if session.stage == Stage::CollectingPain {
            if session.collected.pain.is_none() {
                if pain_deferred {
                    warn!("Message read as a question, asking for the pain point again");
                    return REPROMPT_PAIN_DIRECTIVE;
                }
                return ask_for_field(Field::Pain);
            }
            session.advance_to(Stage::OfferConsultation);
        }

        if session.stage == Stage::Completed {
            COMPLETED_DIRECTIVE
        } else {
            REQUEST_CONTACT_DIRECTIVE
        }
    }
}

/// Whether a message is a question rather than a description.
fn reads_as_question(message: &str) -> bool {
    message.trim_end().ends_with('?')
}
