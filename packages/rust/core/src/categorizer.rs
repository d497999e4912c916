//! Display categorization by ordered keyword rules.
//!
//! Rules are evaluated top to bottom and the first match wins. Gate
//! (qualification) checks come before identification so a gate question
//! that also names the applicant is never filed as identification.

use questionbuilder_shared::{Category, Question, QuestionType};

/// Coarse answer shape used by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    YesNo,
    Text,
    Info,
}

impl From<QuestionType> for TypeHint {
    fn from(kind: QuestionType) -> Self {
        match kind {
            QuestionType::Boolean => Self::YesNo,
            _ => Self::Text,
        }
    }
}

/// Result of categorizing one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMapping {
    pub category: Category,
    pub order: u8,
    pub description: &'static str,
}

impl From<Category> for CategoryMapping {
    fn from(category: Category) -> Self {
        Self {
            category,
            order: category.order(),
            description: category.description(),
        }
    }
}

/// Lower-cased inputs of one categorization.
struct Subject<'a> {
    text: &'a str,
    page: &'a str,
    hint: TypeHint,
}

impl Subject<'_> {
    fn has(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.text.contains(n))
    }
}

type Predicate = fn(&Subject<'_>) -> bool;

const RULES: [(Predicate, Category); 7] = [
    (is_gate, Category::Standardqualifikationen),
    (is_identification, Category::Identifikation),
    (is_contact, Category::Kontaktinformationen),
    (is_info, Category::Info),
    (is_site, Category::Standort),
    (is_department, Category::Einsatzbereiche),
    (is_framework, Category::Rahmenbedingungen),
];

fn is_gate(s: &Subject<'_>) -> bool {
    s.has_any(&[
        "zwingend",
        "pflicht",
        "voraussetzung",
        "examen",
        "abschluss",
        "pflegefach",
        "qualifikation",
    ]) || s.page.contains("kriterien")
        || s.page.contains("qualifikation")
}

fn is_identification(s: &Subject<'_>) -> bool {
    s.has("spreche ich mit") || (s.has("adresse") && (s.has("korrekt") || s.has("bestät")))
}

fn is_contact(s: &Subject<'_>) -> bool {
    (s.has("adresse") && !s.has("korrekt")) || s.has_any(&["telefon", "erreichbar", "e-mail"])
}

fn is_info(s: &Subject<'_>) -> bool {
    s.hint == TypeHint::Info || s.text.starts_with("!!!") || s.page.contains("weitere informationen")
}

fn is_site(s: &Subject<'_>) -> bool {
    s.has_any(&["standort", "einsatzort"])
}

fn is_department(s: &Subject<'_>) -> bool {
    s.has_any(&["abteilung", "bereich", "station", "fachabteilung"])
}

fn is_framework(s: &Subject<'_>) -> bool {
    s.page.contains("rahmenbedingungen")
        || s.has_any(&[
            "arbeitszeit",
            "schicht",
            "urlaub",
            "vollzeit",
            "teilzeit",
            "vergütung",
        ])
}

/// Categorize a question text. `page_name` is the protocol page or the
/// question's group name.
pub fn categorize(text: &str, hint: TypeHint, page_name: &str) -> CategoryMapping {
    let text = text.to_lowercase();
    let page = page_name.to_lowercase();
    let subject = Subject {
        text: &text,
        page: &page,
        hint,
    };

    RULES
        .iter()
        .find(|(matches, _)| matches(&subject))
        .map_or(Category::ZusaetzlicheInformationen, |(_, category)| *category)
        .into()
}

/// Tag every question with its category and order.
pub fn categorize_questions(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|mut q| {
            let group = q.group.map_or("", |g| g.as_str());
            let mapping = categorize(&q.question, q.kind.into(), group);
            q.category = Some(mapping.category);
            q.category_order = Some(mapping.order);
            q
        })
        .collect()
}
