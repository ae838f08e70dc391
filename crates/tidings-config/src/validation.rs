// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::TidingsConfig;

const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TidingsConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.max_context_turns == 0 {
        errors.push(ConfigError::validation(
            "agent.max_context_turns must be greater than 0",
        ));
    }

    if config.agent.retrieval_k == 0 {
        errors.push(ConfigError::validation(
            "agent.retrieval_k must be greater than 0",
        ));
    }

    if !config.agent.document_prompt.contains("{context}") {
        errors.push(ConfigError::validation(
            "agent.document_prompt must contain the `{context}` placeholder",
        ));
    }

    if config.ollama.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("ollama.base_url must not be empty"));
    }

    if config.ollama.model.trim().is_empty() {
        errors.push(ConfigError::validation("ollama.model must not be empty"));
    }

    for (key, value) in [
        ("ollama.temperature", config.ollama.temperature),
        (
            "ollama.classifier_temperature",
            config.ollama.classifier_temperature,
        ),
    ] {
        if !TEMPERATURE_RANGE.contains(&value) {
            errors.push(ConfigError::validation(format!(
                "{key} must be between 0.0 and 2.0, got {value}"
            )));
        }
    }

    if config.delivery.slice_chars == 0 {
        errors.push(ConfigError::validation(
            "delivery.slice_chars must be greater than 0",
        ));
    }

    if config.delivery.poll_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "delivery.poll_interval_ms must be greater than 0",
        ));
    }

    if config.news.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("news.base_url must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TidingsConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = TidingsConfig::default();
        config.agent.max_context_turns = 0;
        config.delivery.slice_chars = 0;
        config.ollama.temperature = 3.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("max_context_turns"));
        assert!(errors[2].to_string().contains("slice_chars"));
    }

    #[test]
    fn document_prompt_requires_placeholder() {
        let mut config = TidingsConfig::default();
        config.agent.document_prompt = "Answer from the document.".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("{context}"));
    }
}
