//! # Reply Intent Detection
//!
//! Decides whether a model reply asks the user for a phone number, so the
//! dialogue can catch up when the model jumps ahead of the current stage.

use crate::prompts::dialogue::{CONTACT_MARKER_INSTRUCTION, CONTACT_REQUEST_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The user-facing reply and what it was found to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyIntent {
    pub reply: String,
    pub requests_contact: bool,
}

pub trait IntentDetector: Send + Sync + Debug {
    /// An instruction appended to every stage directive, if the detector
    /// needs the model's cooperation.
    fn directive_suffix(&self) -> Option<&str> {
        None
    }

    fn inspect(&self, reply: &str) -> ReplyIntent;
}

/// Relies on the model tagging contact requests with a marker, which is then
/// removed from the reply.
#[derive(Debug, Clone, Default)]
pub struct MarkerIntentDetector;

impl IntentDetector for MarkerIntentDetector {
    fn directive_suffix(&self) -> Option<&str> {
        Some(CONTACT_MARKER_INSTRUCTION)
    }

    fn inspect(&self, reply: &str) -> ReplyIntent {
        if reply.contains(CONTACT_REQUEST_MARKER) {
            ReplyIntent {
                reply: reply.replace(CONTACT_REQUEST_MARKER, "").trim().to_string(),
                requests_contact: true,
            }
        } else {
            ReplyIntent {
                reply: reply.to_string(),
                requests_contact: false,
            }
        }
    }
}

/// Scans the reply for phone-request phrases. Works with any model but can
/// misfire on replies that merely mention a phone.
#[derive(Debug, Clone)]
pub struct PhraseIntentDetector {
    phrases: Vec<String>,
}

impl PhraseIntentDetector {
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl Default for PhraseIntentDetector {
    fn default() -> Self {
        Self::new(
            [
                "номер телефона",
                "ваш телефон",
                "ваш номер",
                "оставьте телефон",
                "оставьте номер",
                "phone number",
                "your number",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

impl IntentDetector for PhraseIntentDetector {
    fn inspect(&self, reply: &str) -> ReplyIntent {
        let lowered = reply.to_lowercase();
        ReplyIntent {
            reply: reply.to_string(),
            requests_contact: self.phrases.iter().any(|p| lowered.contains(p.as_str())),
        }
    }
}

/// Which detector the dialogue engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentDetection {
    #[default]
    Marker,
    Phrase,
}

impl IntentDetection {
    pub fn detector(&self) -> Box<dyn IntentDetector> {
        match self {
            IntentDetection::Marker => Box::new(MarkerIntentDetector),
            IntentDetection::Phrase => Box::new(PhraseIntentDetector::default()),
        }
    }
}
