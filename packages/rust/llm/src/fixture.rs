//! Deterministic collaborators backed by recorded model output.
//!
//! Used by golden tests and by `build --extract-fixture/--flows-fixture`
//! to run the pipeline without network access.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use questionbuilder_shared::{
    ConversationProtocol, ExtractResult, FlowProposal, QuestionBuilderError, Result,
};

use crate::extract::{Extractor, parse_extract_content};
use crate::flow::{FlowRequest, FlowSynthesizer, parse_flow_content};

/// Returns the same extract result for every protocol.
#[derive(Debug, Clone)]
pub struct FixtureExtractor {
    result: ExtractResult,
}

impl FixtureExtractor {
    pub fn new(result: ExtractResult) -> Self {
        Self {
            result: result.normalized(),
        }
    }

    /// Load a recorded model answer. It goes through the same schema checks
    /// as live output.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| QuestionBuilderError::io(path, e))?;
        Ok(Self {
            result: parse_extract_content(&content)?,
        })
    }
}

#[async_trait]
impl Extractor for FixtureExtractor {
    async fn extract(&self, _protocol: &ConversationProtocol) -> Result<ExtractResult> {
        Ok(self.result.clone())
    }
}

/// Returns recorded proposals, or fails every call when unavailable.
#[derive(Debug, Default)]
pub struct FixtureFlowSynthesizer {
    proposals: Option<Vec<FlowProposal>>,
    calls: AtomicUsize,
}

impl FixtureFlowSynthesizer {
    pub fn new(proposals: Vec<FlowProposal>) -> Self {
        Self {
            proposals: Some(proposals),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| QuestionBuilderError::io(path, e))?;
        Ok(Self::new(parse_flow_content(&content)?))
    }

    /// A synthesizer that always fails, for degraded-mode runs.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Number of `synthesize` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FlowSynthesizer for FixtureFlowSynthesizer {
    async fn synthesize(&self, _request: &FlowRequest) -> Result<Vec<FlowProposal>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.proposals
            .clone()
            .ok_or_else(|| QuestionBuilderError::FlowSynthesis("flow synthesis unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowContext;

    fn empty_request() -> FlowRequest {
        FlowRequest {
            questions: vec![],
            context: FlowContext::default(),
        }
    }

    #[tokio::test]
    async fn fixture_extractor_reads_recorded_output() {
        let extractor =
            FixtureExtractor::from_file(Path::new("../../../fixtures/json/extract.json")).unwrap();
        let protocol = ConversationProtocol {
            id: 0,
            name: String::new(),
            pages: vec![],
        };
        let extr = extractor.extract(&protocol).await.unwrap();
        assert!(!extr.all_departments.is_empty());
        let mut sorted = extr.all_departments.clone();
        sorted.sort();
        assert_eq!(extr.all_departments, sorted);
    }

    #[tokio::test]
    async fn unavailable_synthesizer_errors_and_counts() {
        let synth = FixtureFlowSynthesizer::unavailable();
        assert!(synth.synthesize(&empty_request()).await.is_err());
        assert_eq!(synth.calls(), 1);
    }

    #[tokio::test]
    async fn fixture_flows_load_from_file() {
        let synth =
            FixtureFlowSynthesizer::from_file(Path::new("../../../fixtures/json/flows.json"))
                .unwrap();
        let proposals = synth.synthesize(&empty_request()).await.unwrap();
        assert!(proposals.iter().any(|p| p.question_id == "bereich"));
    }

    #[test]
    fn missing_fixture_is_io_error() {
        let err = FixtureExtractor::from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, QuestionBuilderError::Io { .. }));
    }
}
