//! Fact extraction from a conversation protocol.
//!
//! The model is asked for a JSON object; the answer is checked against the
//! extract schema (all issues collected), deserialized, and normalized.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info, instrument};

use questionbuilder_shared::{
    AppConfig, ConversationProtocol, ExtractResult, QuestionBuilderError, Result,
};

use crate::client::{ChatClient, ChatRequest};

const EXTRACT_SYSTEM_PROMPT: &str = include_str!("../prompts/extract.system.md");

/// Model that only accepts the default sampling temperature.
const FIXED_TEMPERATURE_MODEL: &str = "gpt-5";

/// Produces an [`ExtractResult`] for a protocol.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, protocol: &ConversationProtocol) -> Result<ExtractResult>;
}

// ---------------------------------------------------------------------------
// OpenAI-backed extractor
// ---------------------------------------------------------------------------

/// Extractor backed by a chat completions model.
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: ChatClient,
    model: String,
    temperature: f32,
}

impl OpenAiExtractor {
    pub fn new(client: ChatClient, model: impl Into<String>, temperature: f32) -> Self {
        let model = model.into();
        let temperature = if model == FIXED_TEMPERATURE_MODEL {
            1.0
        } else {
            temperature
        };
        Self {
            client,
            model,
            temperature,
        }
    }

    pub fn from_config(client: ChatClient, config: &AppConfig) -> Self {
        Self::new(
            client,
            config.openai.extract_model.clone(),
            config.openai.temperature,
        )
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    #[instrument(skip_all, fields(model = %self.model, pages = protocol.pages.len()))]
    async fn extract(&self, protocol: &ConversationProtocol) -> Result<ExtractResult> {
        let user = serde_json::json!({ "protocol": protocol }).to_string();

        let completion = self
            .client
            .complete_json(&ChatRequest {
                model: &self.model,
                temperature: self.temperature,
                system: EXTRACT_SYSTEM_PROMPT,
                user: &user,
            })
            .await
            .map_err(|e| match e {
                QuestionBuilderError::Parse { message } => QuestionBuilderError::extraction(message),
                other => other,
            })?;

        parse_extract_content(&completion.content)
    }
}

// ---------------------------------------------------------------------------
// Parsing and schema checks
// ---------------------------------------------------------------------------

/// Parse, validate and normalize raw model output.
pub fn parse_extract_content(content: &str) -> Result<ExtractResult> {
    let content = content.trim();
    if content.is_empty() {
        return Err(QuestionBuilderError::extraction("LLM returned no content"));
    }

    let value: Value = serde_json::from_str(content).map_err(|e| QuestionBuilderError::Extraction {
        message: "response is not valid JSON".into(),
        issues: vec![e.to_string()],
    })?;

    let issues = validate_extract_value(&value);
    if !issues.is_empty() {
        error!(issue_count = issues.len(), "extract response failed schema validation");
        return Err(QuestionBuilderError::Extraction {
            message: "response does not match the extract schema".into(),
            issues,
        });
    }

    let result: ExtractResult =
        serde_json::from_value(value).map_err(|e| QuestionBuilderError::Extraction {
            message: "response does not match the extract schema".into(),
            issues: vec![e.to_string()],
        })?;
    let result = result.normalized();

    info!(
        sites_found = result.sites.len(),
        priorities_found = result.priorities.len(),
        departments_found = result.all_departments.len(),
        "extract complete"
    );

    Ok(result)
}

/// Check a raw extract value and return every violation as `path: problem`.
///
/// Unknown keys are allowed. `null` is accepted wherever a field is optional.
pub fn validate_extract_value(value: &Value) -> Vec<String> {
    let mut issues = Vec::new();

    let Some(root) = value.as_object() else {
        issues.push("/: expected object".to_string());
        return issues;
    };

    for key in ["sites", "priorities", "must_have", "all_departments"] {
        if !root.contains_key(key) {
            issues.push(format!("/: missing required property '{key}'"));
        }
    }

    if let Some(sites) = array_at(root, "sites", "/sites", &mut issues) {
        for (i, site) in sites.iter().enumerate() {
            let path = format!("/sites/{i}");
            let Some(obj) = object(site, &path, &mut issues) else {
                continue;
            };
            require_string(obj, "label", &path, &mut issues);
            match obj.get("stations") {
                None => issues.push(format!("{path}: missing required property 'stations'")),
                Some(v) => string_array(v, &format!("{path}/stations"), &mut issues),
            }
            check_source(obj, &path, &mut issues);
        }
    }

    if let Some(priorities) = array_at(root, "priorities", "/priorities", &mut issues) {
        for (i, prio) in priorities.iter().enumerate() {
            let path = format!("/priorities/{i}");
            let Some(obj) = object(prio, &path, &mut issues) else {
                continue;
            };
            require_string(obj, "label", &path, &mut issues);
            require_string(obj, "reason", &path, &mut issues);
            match obj.get("prio_level") {
                None | Some(Value::Null) => {}
                Some(v) if matches!(v.as_u64(), Some(1..=3)) => {}
                Some(v) => issues.push(format!("{path}/prio_level: must be 1, 2 or 3, got {v}")),
            }
            check_source(obj, &path, &mut issues);
        }
    }

    for key in ["must_have", "all_departments", "roles", "alternatives"] {
        if let Some(v) = root.get(key) {
            if v.is_null() && !matches!(key, "must_have" | "all_departments") {
                continue;
            }
            string_array(v, &format!("/{key}"), &mut issues);
        }
    }

    match root.get("constraints") {
        None | Some(Value::Null) => {}
        Some(c) => {
            if let Some(obj) = object(c, "/constraints", &mut issues) {
                optional_string(obj, "tarif", "/constraints", &mut issues);
                optional_string(obj, "schichten", "/constraints", &mut issues);
                match obj.get("arbeitszeit") {
                    None | Some(Value::Null) => {}
                    Some(a) => {
                        let path = "/constraints/arbeitszeit";
                        if let Some(az) = object(a, path, &mut issues) {
                            optional_string(az, "vollzeit", path, &mut issues);
                            optional_string(az, "teilzeit", path, &mut issues);
                        }
                    }
                }
            }
        }
    }

    match root.get("verbatim_candidates") {
        None | Some(Value::Null) => {}
        Some(v) => match v.as_array() {
            None => issues.push("/verbatim_candidates: expected array".to_string()),
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let path = format!("/verbatim_candidates/{i}");
                    let Some(obj) = object(item, &path, &mut issues) else {
                        continue;
                    };
                    require_string(obj, "text", &path, &mut issues);
                    match obj.get("page_id") {
                        None => issues.push(format!("{path}: missing required property 'page_id'")),
                        Some(v) if v.is_i64() => {}
                        Some(_) => issues.push(format!("{path}/page_id: expected integer")),
                    }
                    optional_integer(obj, "prompt_id", &path, &mut issues);
                    match obj.get("is_real_question") {
                        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
                        Some(_) => issues.push(format!("{path}/is_real_question: expected boolean")),
                    }
                }
            }
        },
    }

    issues
}

fn array_at<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<String>,
) -> Option<&'a Vec<Value>> {
    let value = root.get(key)?;
    match value.as_array() {
        Some(items) => Some(items),
        None => {
            issues.push(format!("{path}: expected array"));
            None
        }
    }
}

fn object<'a>(
    value: &'a Value,
    path: &str,
    issues: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    match value.as_object() {
        Some(obj) => Some(obj),
        None => {
            issues.push(format!("{path}: expected object"));
            None
        }
    }
}

fn string_array(value: &Value, path: &str, issues: &mut Vec<String>) {
    match value.as_array() {
        None => issues.push(format!("{path}: expected array")),
        Some(items) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    issues.push(format!("{path}/{i}: expected string"));
                }
            }
        }
    }
}

fn require_string(obj: &Map<String, Value>, key: &str, path: &str, issues: &mut Vec<String>) {
    match obj.get(key) {
        None => issues.push(format!("{path}: missing required property '{key}'")),
        Some(Value::String(_)) => {}
        Some(_) => issues.push(format!("{path}/{key}: expected string")),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str, issues: &mut Vec<String>) {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(format!("{path}/{key}: expected string")),
    }
}

fn optional_integer(obj: &Map<String, Value>, key: &str, path: &str, issues: &mut Vec<String>) {
    match obj.get(key) {
        None | Some(Value::Null) => {}
        Some(v) if v.is_i64() => {}
        Some(_) => issues.push(format!("{path}/{key}: expected integer")),
    }
}

fn check_source(obj: &Map<String, Value>, path: &str, issues: &mut Vec<String>) {
    match obj.get("source") {
        None | Some(Value::Null) => {}
        Some(v) => {
            let path = format!("{path}/source");
            if let Some(src) = object(v, &path, issues) {
                optional_integer(src, "page_id", &path, issues);
                optional_integer(src, "prompt_id", &path, issues);
            }
        }
    }
}
