//! # Default Prompt Templates
//!
//! The assistant persona and the retrieval instructions appended to it. The
//! persona can be replaced through configuration; the rest is fixed.

/// The default persona: a corporate consultant of an AI-integration agency.
pub const DEFAULT_PERSONA: &str = "Ты — корпоративный ИИ-ассистент агентства по внедрению \
искусственного интеллекта в бизнес. Ты консультируешь клиентов по услугам агентства, \
отвечаешь вежливо, кратко и по делу, на том языке, на котором к тебе обратились. \
Твоя задача — помочь клиенту и, когда это уместно, предложить бесплатную консультацию специалиста.";

/// The persona used for plain chat without retrieval or dialogue guidance.
pub const GENERIC_PERSONA: &str = "Ты — полезный ИИ-ассистент.";

macro_rules! no_information_reply {
    () => {
        "У меня нет информации по данному вопросу."
    };
}

/// The exact phrase the model must use when the documents do not cover a question.
pub const NO_INFORMATION_REPLY: &str = no_information_reply!();

/// Prepended to retrieved documents.
pub const DOCUMENTS_INSTRUCTION: &str = concat!(
    "Отвечай строго на основе документов ниже. \
Не выдумывай факты, цены и сроки, которых нет в документах. Не упоминай, что ответ взят \
из документов. Если в документах нет ответа, ответь: «",
    no_information_reply!(),
    "»"
);

/// Header line of the documents block.
pub const DOCUMENTS_HEADER: &str = "Документы:";

/// Used when retrieval was requested but nothing relevant was found.
pub const NO_MATCHES_DIRECTIVE: &str = concat!(
    "В базе знаний не нашлось документов по этому вопросу. \
Если у тебя нет достоверной информации, честно скажи: «",
    no_information_reply!(),
    "»"
);

/// Prefix of the collected-facts line.
pub const KNOWN_FACTS_PREFIX: &str = "Known:";
