//! # System Prompt Composer
//!
//! Assembles the system prompt from its parts in a fixed order, separated by
//! blank lines: persona, stage directive, known facts, retrieval block.

use super::core::{
    DOCUMENTS_HEADER, DOCUMENTS_INSTRUCTION, KNOWN_FACTS_PREFIX, NO_MATCHES_DIRECTIVE,
};
use crate::{dialogue::CollectedFields, types::RetrievedDoc};

/// What retrieval contributed to the prompt.
#[derive(Debug, Clone, Copy)]
pub enum RagContext<'a> {
    /// Retrieval was not requested.
    Disabled,
    /// Retrieval ran and found nothing relevant.
    NoMatches,
    Documents(&'a [RetrievedDoc]),
}

#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub persona: &'a str,
    pub stage_directive: Option<&'a str>,
    pub known_facts: Option<&'a str>,
    pub rag: RagContext<'a>,
}

pub fn compose(input: &ComposeInput<'_>) -> String {
    let mut sections: Vec<String> = vec![input.persona.trim().to_string()];

    if let Some(directive) = input.stage_directive.map(str::trim).filter(|d| !d.is_empty()) {
        sections.push(directive.to_string());
    }
    if let Some(facts) = input.known_facts.map(str::trim).filter(|f| !f.is_empty()) {
        sections.push(facts.to_string());
    }

    match input.rag {
        RagContext::Disabled => {}
        RagContext::NoMatches => sections.push(NO_MATCHES_DIRECTIVE.to_string()),
        RagContext::Documents(docs) => {
            sections.push(DOCUMENTS_INSTRUCTION.to_string());
            let contents: Vec<&str> = docs.iter().map(|doc| doc.content.as_str()).collect();
            sections.push(format!("{DOCUMENTS_HEADER}\n{}", contents.join("\n\n")));
        }
    }

    sections.join("\n\n")
}

/// Renders collected facts as `Known: name: X, company: Y, ...`.
///
/// Returns `None` when nothing has been collected yet.
pub fn known_facts_line(collected: &CollectedFields) -> Option<String> {
    let facts: Vec<String> = collected
        .iter()
        .map(|(field, value)| format!("{}: {value}", field.key()))
        .collect();
    if facts.is_empty() {
        None
    } else {
        Some(format!("{KNOWN_FACTS_PREFIX} {}", facts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Field;
    use serde_json::Map;

    fn doc(content: &str) -> RetrievedDoc {
        RetrievedDoc {
            content: content.to_string(),
            metadata: Map::new(),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_sections_appear_in_fixed_order() {
        let docs = vec![doc("Doc one"), doc("Doc two")];
        let prompt = compose(&ComposeInput {
            persona: "PERSONA",
            stage_directive: Some("DIRECTIVE"),
            known_facts: Some("Known: name: Ivan"),
            rag: RagContext::Documents(&docs),
        });

        let persona = prompt.find("PERSONA").unwrap();
        let directive = prompt.find("DIRECTIVE").unwrap();
        let facts = prompt.find("Known: name: Ivan").unwrap();
        let documents = prompt.find(DOCUMENTS_HEADER).unwrap();
        assert!(persona < directive && directive < facts && facts < documents);
        assert!(prompt.ends_with("Документы:\nDoc one\n\nDoc two"));
    }

    #[test]
    fn test_disabled_rag_adds_nothing() {
        let prompt = compose(&ComposeInput {
            persona: "PERSONA",
            stage_directive: None,
            known_facts: None,
            rag: RagContext::Disabled,
        });
        assert_eq!(prompt, "PERSONA");
    }

    #[test]
    fn test_empty_directive_is_omitted() {
        let prompt = compose(&ComposeInput {
            persona: "PERSONA",
            stage_directive: Some("   "),
            known_facts: None,
            rag: RagContext::NoMatches,
        });
        assert_eq!(prompt, format!("PERSONA\n\n{NO_MATCHES_DIRECTIVE}"));
    }

    #[test]
    fn test_known_facts_line() {
        let mut collected = CollectedFields::default();
        assert_eq!(known_facts_line(&collected), None);

        collected.set_if_absent(Field::Company, "Ромашка");
        collected.set_if_absent(Field::Name, "Иван");
        assert_eq!(
            known_facts_line(&collected).unwrap(),
            "Known: name: Иван, company: Ромашка"
        );
    }
}
