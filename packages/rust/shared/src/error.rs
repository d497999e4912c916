//! Error types for the question builder.
//!
//! Library crates use [`QuestionBuilderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all question builder operations.
#[derive(Debug, thiserror::Error)]
pub enum QuestionBuilderError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON or TOML input that could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Transport-level failure talking to the LLM service (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The LLM service answered with a non-success HTTP status.
    #[error("LLM API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// None of the known input filenames exist in the input directory.
    #[error("no input file found in {dir:?} (tried: {})", .tried.join(", "))]
    InputNotFound { dir: PathBuf, tried: Vec<String> },

    /// Fact extraction returned empty or schema-invalid content. Fatal.
    #[error("extraction failed: {message}{}", format_issues(.issues))]
    Extraction {
        message: String,
        issues: Vec<String>,
    },

    /// Conversational flow synthesis failed. Recovered by the pipeline.
    #[error("flow synthesis failed: {0}")]
    FlowSynthesis(String),

    /// The compiled catalog violates the catalog schema. Fatal.
    #[error("catalog failed schema validation{}", format_issues(.issues))]
    CatalogSchema { issues: Vec<String> },

    /// Data validation error outside the catalog schema.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuestionBuilderError>;

fn format_issues(issues: &[String]) -> String {
    issues.iter().map(|issue| format!("\n  - {issue}")).collect()
}

impl QuestionBuilderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an extraction error without an issue list.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
            issues: Vec::new(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a retry loop must stop immediately on this error.
    ///
    /// Client errors (4xx) are terminal except request timeout (408) and
    /// rate limiting (429).
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Api { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            Self::Config { .. } => true,
            _ => false,
        }
    }
}
