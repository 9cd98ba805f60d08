//! # Application Configuration
//!
//! Loads the `leadrag-server` configuration from programmatic defaults, an
//! optional `config.yml` and environment variables, in that order of
//! precedence (later layers win).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use leadrag::{
    constants::{
        DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COMPLETION_TIMEOUT_SECS,
        DEFAULT_DB_FILE, DEFAULT_EMBEDDING_BASE_DELAY_MS, DEFAULT_EMBEDDING_DIMENSION,
        DEFAULT_EMBEDDING_MAX_ATTEMPTS, DEFAULT_EMBEDDING_MAX_DELAY_MS,
        DEFAULT_EMBEDDING_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_SIMILARITY_THRESHOLD,
        DEFAULT_TEMPERATURE, DEFAULT_TOP_K,
    },
    dialogue::IntentDetection,
};
use regex::Regex;
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
    /// A value was read but is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Loaded from the `PORT` env var.
    pub port: u16,
    /// The path to the SQLite database file. Loaded from the `DB_URL` env var.
    pub db_url: String,
    /// Directory for the rolling log files. Unset disables file logging.
    #[serde(default)]
    pub log_dir: Option<String>,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    pub dialogue: DialogueConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// The full chat-completions endpoint.
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub threshold: f64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AssistantConfig {
    /// Replaces the built-in persona when set.
    #[serde(default)]
    pub persona: Option<String>,
}

/// Where dialogue sessions live.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DialogueConfig {
    pub use_rag: bool,
    pub intent_detection: IntentDetection,
    /// Restricts dialogue retrieval to one owner's documents.
    #[serde(default)]
    pub knowledge_owner_id: Option<String>,
    pub session_store: SessionStoreKind,
}

impl AppConfig {
    /// Rejects values the library cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunking.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.threshold ({}) must be within [-1, 1]",
                self.retrieval.threshold
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.into_owned()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Without an override, `config.yml` next to the crate manifest is used if it
///   exists; the built-in defaults are complete, so the file is optional.
/// - `${VAR}` placeholders in the file are replaced with environment values.
/// - Top-level keys are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `LEADRAG_...` variables (e.g.,
///   `LEADRAG_COMPLETION__API_KEY`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder()
        .set_default("port", 8000)?
        .set_default("db_url", DEFAULT_DB_FILE)?
        .set_default("embedding.api_url", "https://api.deepseek.com/v1/embeddings")?
        .set_default("embedding.model_name", "deepseek-embedding")?
        .set_default("embedding.dimension", DEFAULT_EMBEDDING_DIMENSION as u64)?
        .set_default("embedding.timeout_secs", DEFAULT_EMBEDDING_TIMEOUT_SECS)?
        .set_default("embedding.max_attempts", DEFAULT_EMBEDDING_MAX_ATTEMPTS)?
        .set_default("embedding.base_delay_ms", DEFAULT_EMBEDDING_BASE_DELAY_MS)?
        .set_default("embedding.max_delay_ms", DEFAULT_EMBEDDING_MAX_DELAY_MS)?
        .set_default(
            "completion.api_url",
            "https://api.deepseek.com/v1/chat/completions",
        )?
        .set_default("completion.model_name", "deepseek-chat")?
        .set_default("completion.temperature", DEFAULT_TEMPERATURE as f64)?
        .set_default("completion.max_tokens", DEFAULT_MAX_TOKENS)?
        .set_default("completion.timeout_secs", DEFAULT_COMPLETION_TIMEOUT_SECS)?
        .set_default("chunking.chunk_size", DEFAULT_CHUNK_SIZE as u64)?
        .set_default("chunking.overlap", DEFAULT_CHUNK_OVERLAP as u64)?
        .set_default("retrieval.top_k", DEFAULT_TOP_K as u64)?
        .set_default("retrieval.threshold", DEFAULT_SIMILARITY_THRESHOLD)?
        .set_default("dialogue.use_rag", true)?
        .set_default("dialogue.intent_detection", "marker")?
        .set_default("dialogue.session_store", "sqlite")?;

    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{path}'."))
            })?;
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let user_config_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            if let Some(content) = read_and_substitute(&user_config_path)? {
                info!("Loading configuration from '{user_config_path}'.");
                builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
            } else {
                info!("'{user_config_path}' not found. Using defaults and environment.");
            }
        }
    }

    let settings = builder
        // Plain environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed environment variables for nested overrides.
        .add_source(
            Environment::with_prefix("LEADRAG")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
