//! # Dialogue State
//!
//! The per-user session: a monotonic qualification stage, whether the user has
//! been greeted, and the facts collected so far.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Qualification stages, in the only order they may be traversed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Initial,
    GatheringInfo,
    CollectingPain,
    OfferConsultation,
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initial => "INITIAL",
            Stage::GatheringInfo => "GATHERING_INFO",
            Stage::CollectingPain => "COLLECTING_PAIN",
            Stage::OfferConsultation => "OFFER_CONSULTATION",
            Stage::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fact the dialogue collects about the prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Company,
    Industry,
    Pain,
    Phone,
    PreferredDate,
}

impl Field {
    /// Qualifying fields in the order they are asked for.
    pub const QUALIFYING: [Field; 3] = [Field::Name, Field::Company, Field::Industry];

    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Company,
        Field::Industry,
        Field::Pain,
        Field::Phone,
        Field::PreferredDate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Company => "company",
            Field::Industry => "industry",
            Field::Pain => "pain",
            Field::Phone => "phone",
            Field::PreferredDate => "preferred_date",
        }
    }
}

/// Facts collected during the dialogue. Every field is write-once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
}

impl CollectedFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Company => self.company.as_deref(),
            Field::Industry => self.industry.as_deref(),
            Field::Pain => self.pain.as_deref(),
            Field::Phone => self.phone.as_deref(),
            Field::PreferredDate => self.preferred_date.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Company => &mut self.company,
            Field::Industry => &mut self.industry,
            Field::Pain => &mut self.pain,
            Field::Phone => &mut self.phone,
            Field::PreferredDate => &mut self.preferred_date,
        }
    }

    /// Stores `value` unless the field already holds one. Blank values are
    /// ignored. Returns whether the field was written.
    pub fn set_if_absent(&mut self, field: Field, value: impl Into<String>) -> bool {
        let value = value.into();
        let value = value.trim();
        let slot = self.slot_mut(field);
        if slot.is_some() || value.is_empty() {
            return false;
        }
        *slot = Some(value.to_string());
        true
    }

    /// The first of `fields` that is still unset.
    pub fn first_missing(&self, fields: &[Field]) -> Option<Field> {
        fields.iter().copied().find(|f| self.get(*f).is_none())
    }

    /// Set fields in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(field, value)| (field.key().to_string(), json!(value)))
            .collect()
    }
}

/// The persisted state of one user's dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub stage: Stage,
    #[serde(default)]
    pub greeted: bool,
    #[serde(default)]
    pub collected: CollectedFields,
}

impl Session {
    /// Moves forward to `target`. Never moves backwards; returns whether the
    /// stage changed.
    pub fn advance_to(&mut self, target: Stage) -> bool {
        if target > self.stage {
            self.stage = target;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Initial < Stage::GatheringInfo);
        assert!(Stage::GatheringInfo < Stage::CollectingPain);
        assert!(Stage::CollectingPain < Stage::OfferConsultation);
        assert!(Stage::OfferConsultation < Stage::Completed);
    }

    #[test]
    fn test_advance_never_regresses() {
        let mut session = Session::default();
        assert!(session.advance_to(Stage::CollectingPain));
        assert!(!session.advance_to(Stage::GatheringInfo));
        assert_eq!(session.stage, Stage::CollectingPain);
        assert!(!session.advance_to(Stage::CollectingPain));
    }

    #[test]
    fn test_fields_are_write_once() {
        let mut fields = CollectedFields::default();
        assert!(fields.set_if_absent(Field::Name, "  Иван "));
        assert!(!fields.set_if_absent(Field::Name, "Пётр"));
        assert!(!fields.set_if_absent(Field::Company, "   "));
        assert_eq!(fields.name.as_deref(), Some("Иван"));
        assert_eq!(fields.company, None);
    }

    #[test]
    fn test_first_missing_follows_priority() {
        let mut fields = CollectedFields::default();
        assert_eq!(fields.first_missing(&Field::QUALIFYING), Some(Field::Name));
        fields.set_if_absent(Field::Name, "Anna");
        fields.set_if_absent(Field::Industry, "retail");
        assert_eq!(fields.first_missing(&Field::QUALIFYING), Some(Field::Company));
        fields.set_if_absent(Field::Company, "Acme");
        assert_eq!(fields.first_missing(&Field::QUALIFYING), None);
    }

    #[test]
    fn test_session_serializes_stage_name() {
        let session = Session {
            stage: Stage::OfferConsultation,
            ..Default::default()
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["stage"], "OFFER_CONSULTATION");
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }
}
