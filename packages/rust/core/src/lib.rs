//! Catalog compilation for the question builder.
//!
//! This crate turns extracted protocol facts into a validated question
//! catalog: structuring, conversational flow expansion, the rule engine,
//! categorization and schema validation, tied together by
//! [`build_catalog`].

pub mod catalog;
pub mod categorizer;
pub mod expand;
pub mod flow;
pub mod inject;
pub mod input;
pub mod preprocess;
pub mod rules;
pub mod schema;
pub mod structure;
pub mod text;

pub use catalog::{
    BuildMode, ProgressReporter, SilentProgress, build_catalog, compile_catalog,
    finalize_questions,
};
pub use inject::{inject_applicant_data, template_variables};
pub use input::{load_candidate, load_candidate_files, load_protocol, read_json};
pub use schema::{catalog_issues, validate_catalog, validate_catalog_json};
