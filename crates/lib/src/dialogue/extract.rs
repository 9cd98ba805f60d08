//! # Fact Extraction
//!
//! Rule-based extraction of prospect facts from free-form messages. Each field
//! has its own ordered list of patterns; the first pattern that matches wins.
//! Russian and English phrasings are understood.

use super::state::{CollectedFields, Field};
use regex::Regex;
use std::{fmt::Debug, sync::LazyLock};

/// Longest value accepted for a free-text fact.
const MAX_FACT_CHARS: usize = 80;

/// A strategy that pulls one fact out of a message.
pub trait FieldExtractor: Send + Sync + Debug {
    fn extract(&self, text: &str) -> Option<String>;
}

/// Tries each pattern in order and returns the first capture group 1.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl PatternExtractor {
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl FieldExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            let captured = re.captures(text)?.get(1)?.as_str();
            let value = captured
                .trim()
                .trim_matches(|c: char| matches!(c, '"' | '\'' | '«' | '»'))
                .trim();
            (!value.is_empty() && value.chars().count() <= MAX_FACT_CHARS)
                .then(|| value.to_string())
        })
    }
}

const NAME_PATTERNS: &[&str] = &[
    r"(?i)меня\s+зовут\s+([\p{L}][\p{L}\-]*)",
    r"(?i)мо[её]\s+имя\s*[:\-—]?\s*([\p{L}][\p{L}\-]*)",
    r"(?i)\bmy\s+name\s+is\s+([\p{L}][\p{L}\-]*)",
    r"(?i)\bcall\s+me\s+([\p{L}][\p{L}\-]*)",
];

const COMPANY_PATTERNS: &[&str] = &[
    r#"\b(?:ООО|ОАО|ЗАО|ПАО|АО|ИП)\s+[«"']?([^,.!?;\n«»"']+)"#,
    r#"(?i)компани[яиюейё]\s+(?:называется\s+)?[«"']?([^,.!?;\n«»"']+)"#,
    r#"(?i)работаю\s+в\s+[«"']?([^,.!?;\n«»"']+)"#,
    r#"(?i)\bcompany\s+(?:is\s+|called\s+|name\s+is\s+)?["']?([^,.!?;\n"']+)"#,
    r"(?i)\bwork\s+(?:at|for)\s+([^,.!?;\n]+)",
];

const INDUSTRY_PATTERNS: &[&str] = &[
    r"(?i)сфер[аеуы]\s+(?:деятельности\s+)?[:\-—]?\s*([^,.!?;\n]+)",
    r"(?i)отрасл[ьи]\s*[:\-—]?\s*([^,.!?;\n]+)",
    r"(?i)заним(?:аемся|аюсь|ается)\s+([^,.!?;\n]+)",
    r"(?i)\bindustry\s*(?:is\s+)?[:\-]?\s*([^,.!?;\n]+)",
    r"(?i)\bwe\s+are\s+in\s+([^,.!?;\n]+)",
];

/// A run of digits joined by spaces, dashes or parentheses. Which of its
/// groups belong to the phone number is decided by `phone_digits`.
static PHONE_CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?[0-9][0-9\s\-()]*[0-9]").expect("phone pattern is valid")
});

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;
/// Russian numbers: `7` or `8` followed by ten digits.
const RU_PHONE_DIGITS: usize = 11;

static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:послезавтра|завтра|сегодня|day\s+after\s+tomorrow|tomorrow|today)\b(?:\s*,?\s*(?:в|at|к)?\s*\d{1,2}[:.]\d{2})?",
    )
    .expect("date pattern is valid")
});

static TIME_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:в|at|к)\s+)?\b\d{1,2}:\d{2}\b").expect("time pattern is valid")
});

/// The extractors for the qualifying fields.
#[derive(Debug)]
pub struct FactExtractors {
    pub name: Box<dyn FieldExtractor>,
    pub company: Box<dyn FieldExtractor>,
    pub industry: Box<dyn FieldExtractor>,
}

impl FactExtractors {
    pub fn new(
        name: Box<dyn FieldExtractor>,
        company: Box<dyn FieldExtractor>,
        industry: Box<dyn FieldExtractor>,
    ) -> Self {
        Self {
            name,
            company,
            industry,
        }
    }

    /// Extracts every qualifying fact found in `text` into `collected`,
    /// respecting write-once. Returns the fields that were newly set.
    pub fn extract_into(&self, text: &str, collected: &mut CollectedFields) -> Vec<Field> {
        let extractors: [(Field, &dyn FieldExtractor); 3] = [
            (Field::Name, self.name.as_ref()),
            (Field::Company, self.company.as_ref()),
            (Field::Industry, self.industry.as_ref()),
        ];
        let mut newly_set = Vec::new();
        for (field, extractor) in extractors {
            if collected.get(field).is_some() {
                continue;
            }
            if let Some(value) = extractor.extract(text) {
                if collected.set_if_absent(field, value) {
                    newly_set.push(field);
                }
            }
        }
        newly_set
    }
}

impl Default for FactExtractors {
    fn default() -> Self {
        let build = |patterns: &[&str]| -> Box<dyn FieldExtractor> {
            Box::new(PatternExtractor::new(patterns).expect("built-in fact patterns are valid"))
        };
        Self::new(
            build(NAME_PATTERNS),
            build(COMPANY_PATTERNS),
            build(INDUSTRY_PATTERNS),
        )
    }
}

/// Finds a phone-shaped token (10 to 15 digits) and normalizes it to its
/// digits, keeping a leading `+`.
///
/// Digits after a complete number are not part of it, so
/// `+79161234567 15:00` yields `+79161234567`.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_CANDIDATE_RE.find_iter(text).find_map(|m| {
        let raw = m.as_str();
        let digits = phone_digits(raw)?;
        if raw.starts_with('+') {
            Some(format!("+{digits}"))
        } else {
            Some(digits)
        }
    })
}

/// Collects whitespace-separated digit groups until the number is complete.
fn phone_digits(raw: &str) -> Option<String> {
    let mut digits = String::new();
    for group in raw.split_whitespace() {
        let group_digits: String = group.chars().filter(char::is_ascii_digit).collect();
        if group_digits.is_empty() {
            continue;
        }
        if is_complete_phone(&digits) || digits.len() + group_digits.len() > MAX_PHONE_DIGITS {
            break;
        }
        digits.push_str(&group_digits);
    }
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS)
        .contains(&digits.len())
        .then_some(digits)
}

fn is_complete_phone(digits: &str) -> bool {
    if digits.starts_with('7') || digits.starts_with('8') {
        digits.len() >= RU_PHONE_DIGITS
    } else {
        digits.len() >= MIN_PHONE_DIGITS
    }
}

/// Finds a preferred call time: a relative day with an optional `HH:MM`, or a
/// bare time such as `в 15:00`.
pub fn extract_preferred_date(text: &str) -> Option<String> {
    RELATIVE_DATE_RE
        .find(text)
        .or_else(|| TIME_ONLY_RE.find(text))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_introduction_in_russian() {
        let extractors = FactExtractors::default();
        let mut collected = CollectedFields::default();
        let set = extractors.extract_into(
            "Меня зовут Иван, компания Ромашка, сфера торговля",
            &mut collected,
        );
        assert_eq!(set, vec![Field::Name, Field::Company, Field::Industry]);
        assert_eq!(collected.name.as_deref(), Some("Иван"));
        assert_eq!(collected.company.as_deref(), Some("Ромашка"));
        assert_eq!(collected.industry.as_deref(), Some("торговля"));
    }

    #[test]
    fn test_english_introduction() {
        let extractors = FactExtractors::default();
        let mut collected = CollectedFields::default();
        extractors.extract_into(
            "Hi, my name is Anna. Our company is Acme Robotics, industry: logistics",
            &mut collected,
        );
        assert_eq!(collected.name.as_deref(), Some("Anna"));
        assert_eq!(collected.company.as_deref(), Some("Acme Robotics"));
        assert_eq!(collected.industry.as_deref(), Some("logistics"));
    }

    #[test]
    fn test_legal_form_company() {
        let extractors = FactExtractors::default();
        let mut collected = CollectedFields::default();
        extractors.extract_into("Мы ООО «Вектор»", &mut collected);
        assert_eq!(collected.company.as_deref(), Some("Вектор"));
    }

    #[test]
    fn test_existing_fields_are_not_overwritten() {
        let extractors = FactExtractors::default();
        let mut collected = CollectedFields::default();
        collected.set_if_absent(Field::Name, "Иван");
        let set = extractors.extract_into("Меня зовут Пётр", &mut collected);
        assert!(set.is_empty());
        assert_eq!(collected.name.as_deref(), Some("Иван"));
    }

    #[test]
    fn test_phone_extraction() {
        assert_eq!(
            extract_phone("+79161234567, завтра в 15:00").as_deref(),
            Some("+79161234567")
        );
        assert_eq!(
            extract_phone("звоните 8 (916) 123-45-67").as_deref(),
            Some("89161234567")
        );
        assert_eq!(extract_phone("в 15:00"), None);
        assert_eq!(extract_phone("у нас 120 сотрудников"), None);
    }

    #[test]
    fn test_phone_stops_at_a_complete_number() {
        assert_eq!(
            extract_phone("+79161234567 15:00").as_deref(),
            Some("+79161234567")
        );
        assert_eq!(
            extract_phone("8 916 123 45 67 25 числа").as_deref(),
            Some("89161234567")
        );
        assert_eq!(
            extract_phone("+44 20 7946 0958 15:30").as_deref(),
            Some("+442079460958")
        );
        assert_eq!(
            extract_phone("916 123 45 67 в 10").as_deref(),
            Some("9161234567")
        );
    }

    #[test]
    fn test_preferred_date_extraction() {
        assert_eq!(
            extract_preferred_date("+79161234567, завтра в 15:00").as_deref(),
            Some("завтра в 15:00")
        );
        assert_eq!(
            extract_preferred_date("call me tomorrow at 9:30").as_deref(),
            Some("tomorrow at 9:30")
        );
        assert_eq!(
            extract_preferred_date("удобно в 11:00").as_deref(),
            Some("в 11:00")
        );
        assert_eq!(
            extract_preferred_date("послезавтра").as_deref(),
            Some("послезавтра")
        );
        assert_eq!(extract_preferred_date("когда угодно"), None);
    }
}
