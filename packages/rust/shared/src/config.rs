//! Application configuration for the question builder.
//!
//! User config lives at `~/.questionbuilder/questionbuilder.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{QuestionBuilderError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "questionbuilder.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".questionbuilder";

/// Hard upper bound of the catalog schema.
pub const MAX_CATALOG_QUESTIONS: usize = 20;

// ---------------------------------------------------------------------------
// Config structs (matching questionbuilder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM service settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Retry policy for LLM calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Catalog compilation settings.
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Input file discovery.
    #[serde(default)]
    pub input: InputConfig,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for fact extraction.
    #[serde(default = "default_extract_model")]
    pub extract_model: String,

    /// Model used for conversational flow synthesis.
    #[serde(default = "default_flow_model")]
    pub flow_model: String,

    /// Sampling temperature for extraction.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling temperature for flow synthesis.
    #[serde(default = "default_flow_temperature")]
    pub flow_temperature: f32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            extract_model: default_extract_model(),
            flow_model: default_flow_model(),
            temperature: default_temperature(),
            flow_temperature: default_flow_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_extract_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_flow_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_flow_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after every failed attempt.
    #[serde(default = "default_factor")]
    pub factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            factor: default_factor(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_factor() -> u32 {
    2
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Size cap applied by the final rule (1..=20).
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Choice questions with more options than this get a conversational flow.
    #[serde(default = "default_flow_option_threshold")]
    pub flow_option_threshold: usize,

    /// Written into `_meta.schema_version`.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Written into `_meta.generator`.
    #[serde(default = "default_generator")]
    pub generator: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            flow_option_threshold: default_flow_option_threshold(),
            schema_version: default_schema_version(),
            generator: default_generator(),
        }
    }
}

fn default_max_questions() -> usize {
    MAX_CATALOG_QUESTIONS
}
fn default_flow_option_threshold() -> usize {
    7
}
fn default_schema_version() -> String {
    "1.0".into()
}
fn default_generator() -> String {
    concat!("questionbuilder@", env!("CARGO_PKG_VERSION")).into()
}

/// `[input]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Protocol file names tried in order.
    #[serde(default = "default_protocol_files")]
    pub protocol_files: Vec<String>,

    /// Single-file applicant profile.
    #[serde(default = "default_profile_file")]
    pub profile_file: String,

    /// Two-part applicant profile (personal data, address), used when
    /// `profile_file` is missing.
    #[serde(default = "default_profile_part_files")]
    pub profile_part_files: [String; 2],
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            protocol_files: default_protocol_files(),
            profile_file: default_profile_file(),
            profile_part_files: default_profile_part_files(),
        }
    }
}

fn default_protocol_files() -> Vec<String> {
    [
        "Gesprächsprotokoll_Beispiel2.json",
        "Gesprächsprotokoll_Beispiel1.json",
        "Gesprächsprotokoll.json",
        "Unternehmensprofil.json",
        "Unternehmensprofil2.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_profile_file() -> String {
    "Bewerberprofil.json".into()
}
fn default_profile_part_files() -> [String; 2] {
    [
        "Bewerberprofil_Teil1.json".into(),
        "Bewerberprofil_Teil2.json".into(),
    ]
}

// ---------------------------------------------------------------------------
// Catalog config (runtime, threaded through the pipeline)
// ---------------------------------------------------------------------------

/// Runtime catalog configuration passed explicitly into `build_catalog`.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Size cap applied by the final rule.
    pub max_questions: usize,
    /// Option count above which a choice question gets a conversational flow.
    pub flow_option_threshold: usize,
    /// `_meta.schema_version`.
    pub schema_version: String,
    /// `_meta.generator`.
    pub generator: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CatalogConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_questions: config.catalog.max_questions,
            flow_option_threshold: config.catalog.flow_option_threshold,
            schema_version: config.catalog.schema_version.clone(),
            generator: config.catalog.generator.clone(),
        }
    }
}

/// Runtime retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: std::time::Duration,
    pub factor: u32,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> std::time::Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(self.factor.max(1).saturating_pow(exp))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: std::time::Duration::from_millis(config.initial_delay_ms),
            factor: config.factor,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.questionbuilder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| QuestionBuilderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.questionbuilder/questionbuilder.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content =
        std::fs::read_to_string(path).map_err(|e| QuestionBuilderError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        QuestionBuilderError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Reject values the pipeline cannot honour.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let max = config.catalog.max_questions;
    if max == 0 || max > MAX_CATALOG_QUESTIONS {
        return Err(QuestionBuilderError::config(format!(
            "catalog.max_questions must be between 1 and {MAX_CATALOG_QUESTIONS}, got {max}"
        )));
    }

    Url::parse(&config.openai.base_url).map_err(|e| {
        QuestionBuilderError::config(format!(
            "openai.base_url '{}' is not a valid URL: {e}",
            config.openai.base_url
        ))
    })?;

    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| QuestionBuilderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QuestionBuilderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QuestionBuilderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the configured env var.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(QuestionBuilderError::config(format!(
            "OpenAI API key not found. Set the {var_name} environment variable."
        ))),
    }
}
