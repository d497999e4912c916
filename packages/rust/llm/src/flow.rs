//! Conversational flow synthesis for choice questions with many options.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use questionbuilder_shared::{AppConfig, FlowProposal, Group, QuestionBuilderError, Result};

use crate::client::{ChatClient, ChatRequest};

const FLOW_SYSTEM_PROMPT: &str = include_str!("../prompts/conversational-flow.system.md");

/// A priority passed to the model as context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityHint {
    pub label: String,
    pub reason: String,
}

/// One question the model should design a flow for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowCandidate {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    pub priority_hints: Vec<PriorityHint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowContext {
    pub priorities: Vec<PriorityHint>,
}

/// Payload sent to the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRequest {
    pub questions: Vec<FlowCandidate>,
    pub context: FlowContext,
}

/// Proposes conversation flow descriptors for candidate questions.
#[async_trait]
pub trait FlowSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &FlowRequest) -> Result<Vec<FlowProposal>>;
}

/// Flow synthesizer backed by a chat completions model.
#[derive(Debug, Clone)]
pub struct OpenAiFlowSynthesizer {
    client: ChatClient,
    model: String,
    temperature: f32,
}

impl OpenAiFlowSynthesizer {
    pub fn new(client: ChatClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(client: ChatClient, config: &AppConfig) -> Self {
        Self::new(
            client,
            config.openai.flow_model.clone(),
            config.openai.flow_temperature,
        )
    }
}

#[async_trait]
impl FlowSynthesizer for OpenAiFlowSynthesizer {
    #[instrument(skip_all, fields(model = %self.model, candidates = request.questions.len()))]
    async fn synthesize(&self, request: &FlowRequest) -> Result<Vec<FlowProposal>> {
        let user = serde_json::to_string(request)
            .map_err(|e| QuestionBuilderError::FlowSynthesis(e.to_string()))?;

        let completion = self
            .client
            .complete_json(&ChatRequest {
                model: &self.model,
                temperature: self.temperature,
                system: FLOW_SYSTEM_PROMPT,
                user: &user,
            })
            .await
            .map_err(|e| QuestionBuilderError::FlowSynthesis(e.to_string()))?;

        parse_flow_content(&completion.content)
    }
}

/// Parse model output into proposals.
///
/// Accepts `{"conversational_flows": [...]}` or a single object carrying
/// `question_id`. Entries that fail to deserialize are skipped.
pub fn parse_flow_content(content: &str) -> Result<Vec<FlowProposal>> {
    let content = content.trim();
    if content.is_empty() {
        return Err(QuestionBuilderError::FlowSynthesis(
            "LLM returned no flows".into(),
        ));
    }

    let value: Value = serde_json::from_str(content)
        .map_err(|e| QuestionBuilderError::FlowSynthesis(format!("invalid JSON: {e}")))?;

    let entries = match value {
        Value::Object(mut obj) => match obj.remove("conversational_flows") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(QuestionBuilderError::FlowSynthesis(
                    "conversational_flows is not an array".into(),
                ));
            }
            None if obj.contains_key("question_id") => vec![Value::Object(obj)],
            None => Vec::new(),
        },
        _ => {
            return Err(QuestionBuilderError::FlowSynthesis(
                "expected a JSON object".into(),
            ));
        }
    };

    let proposals: Vec<FlowProposal> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(index = i, error = %e, "dropping unparsable flow proposal");
                None
            }
        })
        .collect();

    debug!(flow_count = proposals.len(), "normalized flow proposals");
    Ok(proposals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use questionbuilder_shared::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FLOW: &str = r#"{
        "question_id": "bereich",
        "pre_check": {"question": "Wissen Sie schon, in welchem Bereich?"},
        "open_question": {"question": "In welchem Bereich?", "allow_fuzzy_match": true},
        "clustered_options": {"presentation_hint": "Wir haben:", "categories": []}
    }"#;

    #[test]
    fn accepts_single_object() {
        let proposals = parse_flow_content(FLOW).unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].question_id, "bereich");
    }

    #[test]
    fn accepts_wrapped_array_and_skips_broken_entries() {
        let content = format!(r#"{{"conversational_flows": [{FLOW}, {{"pre_check": 3}}]}}"#);
        let proposals = parse_flow_content(&content).unwrap();
        assert_eq!(proposals.len(), 1);
    }

    #[test]
    fn unrelated_object_yields_no_proposals() {
        assert!(parse_flow_content(r#"{"foo": 1}"#).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_flow_error() {
        let err = parse_flow_content("```json").unwrap_err();
        assert!(matches!(err, QuestionBuilderError::FlowSynthesis(_)));
        let err = parse_flow_content("").unwrap_err();
        assert!(matches!(err, QuestionBuilderError::FlowSynthesis(_)));
    }

    #[test]
    fn request_serializes_hints() {
        let request = FlowRequest {
            questions: vec![FlowCandidate {
                id: "bereich".into(),
                question: "Wo?".into(),
                options: vec!["Onkologie".into()],
                group: Some(Group::Einsatzbereich),
                priority_hints: vec![PriorityHint {
                    label: "Onkologie".into(),
                    reason: "Neubau".into(),
                }],
            }],
            context: FlowContext::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["questions"][0]["group"], "Einsatzbereich");
        assert_eq!(json["questions"][0]["priority_hints"][0]["label"], "Onkologie");
    }

    #[tokio::test]
    async fn api_failure_becomes_flow_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(
            &server.uri(),
            "k",
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
        .unwrap();
        let synth = OpenAiFlowSynthesizer::new(client, "gpt-4o-mini", 0.3);
        let request = FlowRequest {
            questions: vec![],
            context: FlowContext::default(),
        };
        let err = synth.synthesize(&request).await.unwrap_err();
        assert!(matches!(err, QuestionBuilderError::FlowSynthesis(_)));
    }

    #[tokio::test]
    async fn synthesizes_via_chat_completions() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{ "message": { "content": format!(r#"{{"conversational_flows": [{FLOW}]}}"#) } }]
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("priority_hints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = ChatClient::new(
            &server.uri(),
            "k",
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
        .unwrap();
        let synth = OpenAiFlowSynthesizer::new(client, "gpt-4o-mini", 0.3);
        let request = FlowRequest {
            questions: vec![FlowCandidate {
                id: "bereich".into(),
                question: "Wo?".into(),
                options: vec!["A".into()],
                group: None,
                priority_hints: vec![],
            }],
            context: FlowContext::default(),
        };
        let proposals = synth.synthesize(&request).await.unwrap();
        assert_eq!(proposals[0].question_id, "bereich");
        assert!(proposals[0].clone().into_flow().is_some());
    }
}
