//! # Configuration Tests
//!
//! Exercises the layering of defaults, `config.yml` and environment variables.
//! The config module is included by path so it can be tested on its own.
//! Environment variables are process-global, so every test runs serially.

#[path = "../src/config.rs"]
mod config;

use self::config::{get_config, ConfigError, SessionStoreKind};
use leadrag::{
    constants::{DEFAULT_CHUNK_SIZE, DEFAULT_DB_FILE, DEFAULT_TOP_K},
    dialogue::IntentDetection,
};
use serial_test::serial;
use std::{env, fs};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "PORT",
    "DB_URL",
    "LEADRAG_PORT",
    "LEADRAG_COMPLETION__MODEL_NAME",
    "LEADRAG_COMPLETION__API_KEY",
    "LEADRAG_RETRIEVAL__TOP_K",
    "LEADRAG_TEST_COMPLETION_KEY",
];

fn clear_env_vars() {
    for var in VARS {
        env::remove_var(var);
    }
}

/// Writes `content` to a `config.yml` inside a fresh temp dir.
fn write_config(content: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, content).unwrap();
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}

#[test]
#[serial]
fn test_defaults_fill_an_empty_file() {
    clear_env_vars();
    let (_dir, path) = write_config("{}\n");

    let config = get_config(Some(&path)).expect("defaults should be complete");

    assert_eq!(config.port, 8000);
    assert_eq!(config.db_url, DEFAULT_DB_FILE);
    assert!(config.log_dir.is_none());
    assert_eq!(
        config.completion.api_url,
        "https://api.deepseek.com/v1/chat/completions"
    );
    assert_eq!(config.completion.model_name, "deepseek-chat");
    assert!(config.completion.api_key.is_none());
    assert_eq!(config.chunking.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
    assert!(config.dialogue.use_rag);
    assert_eq!(config.dialogue.intent_detection, IntentDetection::Marker);
    assert_eq!(config.dialogue.session_store, SessionStoreKind::Sqlite);
    assert!(config.assistant.persona.is_none());
}

#[test]
#[serial]
fn test_file_values_override_defaults() {
    clear_env_vars();
    let (_dir, path) = write_config(
        r#"
port: 9001
db_url: "/tmp/leadrag-test.db"
log_dir: "/tmp/leadrag-logs"
completion:
  model_name: "local-model"
  temperature: 0.5
chunking:
  chunk_size: 500
  overlap: 50
assistant:
  persona: "Ты помощник магазина."
dialogue:
  use_rag: false
  intent_detection: phrase
  knowledge_owner_id: "agency"
  session_store: memory
"#,
    );

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.port, 9001);
    assert_eq!(config.db_url, "/tmp/leadrag-test.db");
    assert_eq!(config.log_dir.as_deref(), Some("/tmp/leadrag-logs"));
    assert_eq!(config.completion.model_name, "local-model");
    assert!((config.completion.temperature - 0.5).abs() < f32::EPSILON);
    // Untouched keys in the same section keep their defaults.
    assert_eq!(config.completion.max_tokens, 2000);
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.chunking.overlap, 50);
    assert_eq!(
        config.assistant.persona.as_deref(),
        Some("Ты помощник магазина.")
    );
    assert!(!config.dialogue.use_rag);
    assert_eq!(config.dialogue.intent_detection, IntentDetection::Phrase);
    assert_eq!(config.dialogue.knowledge_owner_id.as_deref(), Some("agency"));
    assert_eq!(config.dialogue.session_store, SessionStoreKind::Memory);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env_vars();
    let (_dir, path) = write_config("port: 9001\ncompletion:\n  model_name: \"from-file\"\n");

    env::set_var("PORT", "9100");
    env::set_var("LEADRAG_COMPLETION__MODEL_NAME", "from-env");
    env::set_var("LEADRAG_RETRIEVAL__TOP_K", "3");

    let result = get_config(Some(&path));
    clear_env_vars();
    let config = result.unwrap();

    assert_eq!(config.port, 9100);
    assert_eq!(config.completion.model_name, "from-env");
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
#[serial]
fn test_placeholders_are_substituted_from_environment() {
    clear_env_vars();
    let (_dir, path) =
        write_config("completion:\n  api_key: \"${LEADRAG_TEST_COMPLETION_KEY}\"\n");

    env::set_var("LEADRAG_TEST_COMPLETION_KEY", "sk-secret");
    let result = get_config(Some(&path));
    clear_env_vars();

    assert_eq!(result.unwrap().completion.api_key.as_deref(), Some("sk-secret"));
}

#[test]
#[serial]
fn test_missing_override_file_is_reported() {
    clear_env_vars();

    let result = get_config(Some("/definitely/not/here/config.yml"));

    assert!(matches!(result, Err(ConfigError::NotFound(msg)) if msg.contains("/definitely/not/here")));
}

#[test]
#[serial]
fn test_overlap_must_be_smaller_than_chunk_size() {
    clear_env_vars();
    let (_dir, path) = write_config("chunking:\n  chunk_size: 100\n  overlap: 100\n");

    let result = get_config(Some(&path));

    assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("overlap")));
}

#[test]
#[serial]
fn test_threshold_out_of_range_is_rejected() {
    clear_env_vars();
    let (_dir, path) = write_config("retrieval:\n  threshold: 1.5\n");

    let result = get_config(Some(&path));

    assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("threshold")));
}

#[test]
#[serial]
fn test_unknown_session_store_is_a_general_error() {
    clear_env_vars();
    let (_dir, path) = write_config("dialogue:\n  session_store: redis\n");

    let result = get_config(Some(&path));

    assert!(matches!(result, Err(ConfigError::General(_))));
}
