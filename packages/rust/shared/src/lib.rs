//! Shared types, error model, and configuration for the question builder.
//!
//! This crate is the foundation depended on by all other crates.
//! It provides:
//! - [`QuestionBuilderError`]: the unified error type
//! - Domain types ([`Question`], [`QuestionCatalog`], [`ExtractResult`], [`CandidateProfile`])
//! - Configuration ([`AppConfig`], [`CatalogConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, CatalogSettings, InputConfig, MAX_CATALOG_QUESTIONS, OpenAiConfig,
    RetryConfig, RetryPolicy, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_key, validate_config,
};
pub use error::{QuestionBuilderError, Result};
pub use types::{
    CandidateAddress, CandidateProfile, Category, CatalogMeta, ClusteredOptions, Condition,
    ConditionAction, ConditionOp, Constraints, ConversationFlow, ConversationProtocol,
    ExtractResult, ExtractedPriority, FlowProposal, Group, OpenQuestion, OptionCategory, Page,
    PreCheck, Priority, Prompt, Question, QuestionCatalog, QuestionSource, QuestionType, Site,
    SourceRef, Then, VerbatimCandidate, When, WorkingTime,
};
