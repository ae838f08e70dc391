// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tidings configuration system.

use tidings_config::diagnostic::ConfigError;
use tidings_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_tidings_config() {
    let toml = r#"
[agent]
name = "desk"
log_level = "debug"
max_context_turns = 3
retrieval_k = 6
summarize_titles = false

[ollama]
base_url = "http://gpu-box:11434"
model = "llama3.2-vision"
temperature = 0.2

[news]
api_key = "abc123"
cache_ttl_secs = 60

[delivery]
slice_chars = 16
slice_delay_ms = 0
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "desk");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.agent.max_context_turns, 3);
    assert_eq!(config.agent.retrieval_k, 6);
    assert!(!config.agent.summarize_titles);
    assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
    assert_eq!(config.ollama.model, "llama3.2-vision");
    assert_eq!(config.news.api_key.as_deref(), Some("abc123"));
    assert_eq!(config.news.cache_ttl_secs, 60);
    assert_eq!(config.news.default_page_size, 10);
    assert_eq!(config.delivery.slice_chars, 16);
    assert_eq!(config.delivery.slice_delay_ms, 0);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.max_context_turns, 5);
    assert_eq!(config.ollama.model, "qwen3:8b");
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[agent]
max_context_turn = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_context_turn");
            assert_eq!(suggestion.as_deref(), Some("max_context_turns"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "x"
"#;

    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[agent]
max_context_turns = "five"
"#;

    let errors = load_and_validate_str(toml).expect_err("string for integer should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. }))
    );
}

#[test]
fn zero_turns_fails_validation() {
    let toml = r#"
[agent]
max_context_turns = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero turns is invalid");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}
