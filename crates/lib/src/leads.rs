//! # Lead Recorder
//!
//! Turns the facts collected in a dialogue into a persisted sales lead. A lead
//! is only recorded when a phone number is known.

use crate::providers::db::storage::{LeadStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// The facts available when a lead is about to be recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadDraft {
    /// The chat user the lead came from.
    pub contact_id: String,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub pain: Option<String>,
    pub preferred_date: Option<String>,
    /// Everything collected, stored alongside the named columns.
    #[serde(default)]
    pub collected_data: Map<String, Value>,
}

/// A persisted lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub contact_id: String,
    pub phone: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub pain_description: Option<String>,
    pub preferred_date: Option<String>,
    pub collected_data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeadRecorder {
    store: Arc<dyn LeadStore>,
}

impl LeadRecorder {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Persists a new lead and returns its id.
    ///
    /// Returns `Ok(None)` without touching the store when the draft has no
    /// phone number.
    pub async fn record(&self, draft: &LeadDraft) -> Result<Option<String>, StoreError> {
        let Some(phone) = draft
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            warn!(contact_id = %draft.contact_id, "Refusing to record a lead without a phone number");
            return Ok(None);
        };

        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            contact_id: draft.contact_id.clone(),
            phone: phone.to_string(),
            name: draft.name.clone(),
            company: draft.company.clone(),
            industry: draft.industry.clone(),
            pain_description: draft.pain.clone(),
            preferred_date: draft.preferred_date.clone(),
            collected_data: draft.collected_data.clone(),
            created_at: Utc::now(),
        };
        let id = self.store.insert_lead(&lead).await?;
        info!(lead_id = %id, contact_id = %lead.contact_id, "Lead recorded");
        Ok(Some(id))
    }
}
