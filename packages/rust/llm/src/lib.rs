//! LLM collaborators of the question builder.
//!
//! - [`ChatClient`]: OpenAI-compatible chat completions with retry
//! - [`Extractor`]: protocol → [`ExtractResult`](questionbuilder_shared::ExtractResult)
//! - [`FlowSynthesizer`]: choice questions → conversation flow proposals
//!
//! Each capability has a networked and a fixture-backed implementation.

pub mod client;
pub mod extract;
pub mod fixture;
pub mod flow;

pub use client::{ChatClient, ChatCompletion, ChatRequest};
pub use extract::{Extractor, OpenAiExtractor, parse_extract_content, validate_extract_value};
pub use fixture::{FixtureExtractor, FixtureFlowSynthesizer};
pub use flow::{
    FlowCandidate, FlowContext, FlowRequest, FlowSynthesizer, OpenAiFlowSynthesizer, PriorityHint,
    parse_flow_content,
};
