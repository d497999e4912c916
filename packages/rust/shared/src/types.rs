//! Core domain types: catalog questions, extraction facts, applicant profile
//! and the raw conversation protocol.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CatalogConfig;

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// Answer type of a catalog question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    String,
    Date,
    Boolean,
    Choice,
    MultiChoice,
    RankedList,
}

impl QuestionType {
    /// Whether the type needs a non-empty `options` list.
    pub fn takes_options(self) -> bool {
        matches!(self, Self::Choice | Self::MultiChoice)
    }
}

/// Question priority, 1 = highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGH: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const LOW: Self = Self(3);

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Self(value)),
            other => Err(format!("priority must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Topical bucket controlling the primary sort order of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Standort,
    Einsatzbereich,
    Qualifikation,
    #[serde(rename = "Präferenzen")]
    Praeferenzen,
    Rahmen,
    Kontakt,
}

impl Group {
    /// Fixed sort order of the groups.
    pub const ORDER: [Group; 6] = [
        Group::Standort,
        Group::Einsatzbereich,
        Group::Qualifikation,
        Group::Praeferenzen,
        Group::Rahmen,
        Group::Kontakt,
    ];

    /// Position in [`Group::ORDER`].
    pub fn rank(self) -> usize {
        Self::ORDER
            .iter()
            .position(|g| *g == self)
            .unwrap_or(Self::ORDER.len())
    }

    /// Display name as written into the catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standort => "Standort",
            Self::Einsatzbereich => "Einsatzbereich",
            Self::Qualifikation => "Qualifikation",
            Self::Praeferenzen => "Präferenzen",
            Self::Rahmen => "Rahmen",
            Self::Kontakt => "Kontakt",
        }
    }
}

/// Comparison operator of a visibility condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Eq,
    In,
    Exists,
}

/// Action taken when a condition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionAction {
    Ask,
    Skip,
    Prefill,
    Reorder,
}

/// `when` half of a condition: the answer recorded under `field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub field: String,
    pub op: ConditionOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// `then` half of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Then {
    pub action: ConditionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Visibility rule attached to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub when: When,
    pub then: Then,
}

impl Condition {
    /// `ask` when `field` equals `value`.
    pub fn ask_when_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            when: When {
                field: field.into(),
                op: ConditionOp::Eq,
                value: Some(value.into()),
            },
            then: Then {
                action: ConditionAction::Ask,
                value: None,
            },
        }
    }

    /// `ask` when `field` is one of `values`.
    pub fn ask_when_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        Self {
            when: When {
                field: field.into(),
                op: ConditionOp::In,
                value: Some(Value::Array(values)),
            },
            then: Then {
                action: ConditionAction::Ask,
                value: None,
            },
        }
    }

    /// `skip` once `field` has a recorded answer.
    pub fn skip_when_exists(field: impl Into<String>) -> Self {
        Self {
            when: When {
                field: field.into(),
                op: ConditionOp::Exists,
                value: None,
            },
            then: Then {
                action: ConditionAction::Skip,
                value: None,
            },
        }
    }
}

/// Provenance of a question's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<i64>,
    /// True when the text was taken unmodified from the protocol.
    #[serde(default)]
    pub verbatim: bool,
}

impl QuestionSource {
    /// Synthesized text without protocol reference.
    pub fn synthesized() -> Self {
        Self::default()
    }
}

/// Display category assigned by the categorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Identifikation,
    Kontaktinformationen,
    Standardqualifikationen,
    Info,
    Standort,
    Einsatzbereiche,
    Rahmenbedingungen,
    ZusaetzlicheInformationen,
}

impl Category {
    /// Display order of the category.
    pub fn order(self) -> u8 {
        match self {
            Self::Identifikation => 1,
            Self::Kontaktinformationen => 2,
            Self::Standardqualifikationen => 3,
            Self::Info => 4,
            Self::Standort => 5,
            Self::Einsatzbereiche => 6,
            Self::Rahmenbedingungen => 7,
            Self::ZusaetzlicheInformationen => 8,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Identifikation => "Identifikation & Bestätigung",
            Self::Kontaktinformationen => "Kontaktdaten",
            Self::Standardqualifikationen => "Standardqualifikationen (Gate)",
            Self::Info => "Unternehmensvorstellung & Stelleninfos",
            Self::Standort => "Standorte",
            Self::Einsatzbereiche => "Einsatzbereiche & Abteilungen",
            Self::Rahmenbedingungen => "Rahmenbedingungen",
            Self::ZusaetzlicheInformationen => "Zusätzliche Informationen",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identifikation => "identifikation",
            Self::Kontaktinformationen => "kontaktinformationen",
            Self::Standardqualifikationen => "standardqualifikationen",
            Self::Info => "info",
            Self::Standort => "standort",
            Self::Einsatzbereiche => "einsatzbereiche",
            Self::Rahmenbedingungen => "rahmenbedingungen",
            Self::ZusaetzlicheInformationen => "zusaetzliche_informationen",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Question {
    /// Stable identifier; other questions reference it in conditions.
    pub id: String,
    /// Display text, may contain `{{placeholder}}` tokens in templated mode.
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_flow: Option<ConversationFlow>,
    pub required: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_order: Option<u8>,
}

impl Question {
    /// A bare question; optional metadata is filled with the builder methods.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        kind: QuestionType,
        required: bool,
        priority: Priority,
        group: Group,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            kind,
            options: None,
            conversation_flow: None,
            required,
            priority,
            group: Some(group),
            help_text: None,
            input_hint: None,
            conditions: Vec::new(),
            source: Some(QuestionSource::synthesized()),
            context: None,
            category: None,
            category_order: None,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn with_input_hint(mut self, hint: impl Into<String>) -> Self {
        self.input_hint = Some(hint.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source(mut self, source: QuestionSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Number of options, 0 when absent.
    pub fn option_count(&self) -> usize {
        self.options.as_ref().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Conversation flow descriptor
// ---------------------------------------------------------------------------

fn default_on_yes() -> String {
    "open_question".into()
}
fn default_clustered() -> String {
    "clustered_options".into()
}

/// Closed yes/no question asked before the open question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreCheck {
    pub question: String,
    #[serde(default = "default_on_yes")]
    pub on_yes: String,
    #[serde(default = "default_clustered")]
    pub on_no: String,
}

/// Free-text question asked after a positive pre-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenQuestion {
    pub question: String,
    #[serde(default)]
    pub allow_fuzzy_match: bool,
    #[serde(default = "default_clustered")]
    pub on_unclear: String,
}

/// A named cluster of options read out together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionCategory {
    pub id: String,
    pub label: String,
    pub options: Vec<String>,
}

/// Grouped presentation of the original options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusteredOptions {
    pub presentation_hint: String,
    #[serde(default)]
    pub categories: Vec<OptionCategory>,
}

/// Three-part guided dialogue for a choice question with many options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationFlow {
    pub pre_check: PreCheck,
    pub open_question: OpenQuestion,
    pub clustered_options: ClusteredOptions,
}

/// A flow descriptor as proposed by the synthesizer; any part may be missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowProposal {
    pub question_id: String,
    #[serde(default)]
    pub pre_check: Option<PreCheck>,
    #[serde(default)]
    pub open_question: Option<OpenQuestion>,
    #[serde(default)]
    pub clustered_options: Option<ClusteredOptions>,
}

impl FlowProposal {
    /// The complete descriptor, or `None` if any part is missing.
    pub fn into_flow(self) -> Option<ConversationFlow> {
        Some(ConversationFlow {
            pre_check: self.pre_check?,
            open_question: self.open_question?,
            clustered_options: self.clustered_options?,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// `_meta` block of the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMeta {
    pub schema_version: String,
    pub generated_at: String,
    pub generator: String,
}

impl CatalogMeta {
    /// Metadata stamped with the current time.
    pub fn now(config: &CatalogConfig) -> Self {
        Self {
            schema_version: config.schema_version.clone(),
            generated_at: Utc::now().to_rfc3339(),
            generator: config.generator.clone(),
        }
    }
}

/// The compiled output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCatalog {
    #[serde(rename = "_meta")]
    pub meta: CatalogMeta,
    pub questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Number of questions that keep a conversation flow descriptor.
    pub fn conversational_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.conversation_flow.is_some())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Extraction result
// ---------------------------------------------------------------------------

/// Protocol page (and optional prompt) a fact was taken from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<i64>,
}

/// A work site with its stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub label: String,
    #[serde(default)]
    pub stations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

/// A department or topic the employer wants to staff preferentially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPriority {
    pub label: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub prio_level: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

/// Hour ranges for full- and part-time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vollzeit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teilzeit: Option<String>,
}

/// Framework conditions of the position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbeitszeit: Option<WorkingTime>,
    /// Pay-scale reference, e.g. "TVöD-P".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tarif: Option<String>,
    /// Free-text shift constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schichten: Option<String>,
}

/// A protocol line that may be usable as question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbatimCandidate {
    pub text: String,
    pub page_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<i64>,
    #[serde(default)]
    pub is_real_question: bool,
}

/// Structured facts extracted from a conversation protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub sites: Vec<Site>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub priorities: Vec<ExtractedPriority>,
    pub must_have: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub verbatim_candidates: Vec<VerbatimCandidate>,
    pub all_departments: Vec<String>,
}

impl ExtractResult {
    /// Deduplicate and sort the department list.
    pub fn normalized(mut self) -> Self {
        self.all_departments.sort();
        self.all_departments.dedup();
        self
    }
}

// ---------------------------------------------------------------------------
// Applicant profile
// ---------------------------------------------------------------------------

/// Personal applicant data (first profile part).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default, alias = "Vorname")]
    pub first_name: Option<String>,
    #[serde(default, alias = "Nachname")]
    pub last_name: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Telefonnummer")]
    pub telephone: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub salutation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_internal_review: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_qualified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_rejected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hired: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information: Option<String>,
    /// Derived single-line address; `None` when unknown.
    #[serde(default)]
    pub address_full: Option<String>,
}

/// Applicant address (second profile part).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateAddress {
    #[serde(default, alias = "Straße")]
    pub street: Option<String>,
    #[serde(default, alias = "Hausnummer")]
    pub house_number: Option<String>,
    #[serde(default, alias = "PLZ")]
    pub postal_code: Option<String>,
    #[serde(default, alias = "Ort")]
    pub city: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversation protocol
// ---------------------------------------------------------------------------

/// A single line of the recruiter's conversation protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
}

/// A titled page of prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
}

/// Free-form conversation protocol the facts are extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationProtocol {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rejects_out_of_range() {
        assert!(Priority::try_from(0).is_err());
        assert!(Priority::try_from(4).is_err());
        assert_eq!(Priority::try_from(1).unwrap(), Priority::HIGH);

        let parsed: Result<Priority, _> = serde_json::from_str("5");
        assert!(parsed.is_err());
    }

    #[test]
    fn group_serializes_with_umlaut() {
        let json = serde_json::to_string(&Group::Praeferenzen).unwrap();
        assert_eq!(json, "\"Präferenzen\"");
        assert_eq!(Group::Kontakt.rank(), 5);
    }

    #[test]
    fn question_serialization_omits_empty_fields() {
        let q = Question::new(
            "adresse",
            "Wie lautet Ihre Adresse?",
            QuestionType::String,
            true,
            Priority::HIGH,
            Group::Kontakt,
        );
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["priority"], 1);
        assert!(json.get("options").is_none());
        assert!(json.get("conditions").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn condition_shape() {
        let c = Condition::ask_when_in("bereich", ["OP", "Endoskopie"]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["when"]["op"], "in");
        assert_eq!(json["when"]["value"][1], "Endoskopie");
        assert_eq!(json["then"]["action"], "ask");
        assert!(json["then"].get("value").is_none());
    }

    #[test]
    fn partial_flow_proposal_is_rejected() {
        let json = r#"{"question_id":"bereich","pre_check":{"question":"Wissen Sie es schon?"}}"#;
        let proposal: FlowProposal = serde_json::from_str(json).unwrap();
        assert!(proposal.into_flow().is_none());
    }

    #[test]
    fn flow_defaults_fill_routing_fields() {
        let json = r#"{
            "question_id": "bereich",
            "pre_check": {"question": "Wissen Sie schon, wo?"},
            "open_question": {"question": "Wo denn?", "allow_fuzzy_match": true},
            "clustered_options": {"presentation_hint": "Wir haben:", "categories": []}
        }"#;
        let flow = serde_json::from_str::<FlowProposal>(json)
            .unwrap()
            .into_flow()
            .expect("complete flow");
        assert_eq!(flow.pre_check.on_yes, "open_question");
        assert_eq!(flow.pre_check.on_no, "clustered_options");
        assert_eq!(flow.open_question.on_unclear, "clustered_options");
    }

    #[test]
    fn extract_requires_core_lists() {
        let missing = r#"{"sites": [], "priorities": [], "must_have": []}"#;
        assert!(serde_json::from_str::<ExtractResult>(missing).is_err());

        let minimal = r#"{"sites": [], "priorities": [], "must_have": [], "all_departments": ["OP", "Intensiv", "OP"]}"#;
        let extr = serde_json::from_str::<ExtractResult>(minimal)
            .unwrap()
            .normalized();
        assert_eq!(extr.all_departments, vec!["Intensiv", "OP"]);
        assert_eq!(extr.constraints, Constraints::default());
    }

    #[test]
    fn priority_level_defaults_to_medium() {
        let json = r#"{"label": "Onkologie", "reason": "Neubau"}"#;
        let prio: ExtractedPriority = serde_json::from_str(json).unwrap();
        assert_eq!(prio.prio_level, Priority::MEDIUM);
    }

    #[test]
    fn candidate_accepts_german_keys() {
        let json = r#"{"Vorname": "Max", "Nachname": "Muster", "Telefonnummer": "0301234"}"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Max"));
        assert_eq!(profile.last_name.as_deref(), Some("Muster"));
        assert_eq!(profile.telephone.as_deref(), Some("0301234"));
        assert!(profile.address_full.is_none());
    }

    #[test]
    fn catalog_meta_is_renamed() {
        let catalog = QuestionCatalog {
            meta: CatalogMeta::now(&CatalogConfig::default()),
            questions: vec![],
        };
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json["_meta"]["schema_version"], "1.0");
        assert!(json["_meta"]["generated_at"].is_string());
    }
}
