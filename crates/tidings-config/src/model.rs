// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tidings assistant core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tidings configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TidingsConfig {
    /// Assistant identity, prompts and context window settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Ollama language model settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// News tool provider settings.
    #[serde(default)]
    pub news: NewsConfig,

    /// Event delivery pacing.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Assistant behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of user/assistant turns sent verbatim before older turns are summarized.
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,

    /// System prompt used when no document is bound to the conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// System prompt template used when a document is bound. `{context}` is
    /// replaced by the retrieved passages.
    #[serde(default = "default_document_prompt")]
    pub document_prompt: String,

    /// Number of passages retrieved from a bound document.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Replace conversation names with a generated summary after each turn.
    #[serde(default = "default_true")]
    pub summarize_titles: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            max_context_turns: default_max_context_turns(),
            system_prompt: default_system_prompt(),
            document_prompt: default_document_prompt(),
            retrieval_k: default_retrieval_k(),
            summarize_titles: true,
        }
    }
}

fn default_agent_name() -> String {
    "tidings".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_context_turns() -> usize {
    5
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Answer the user's questions clearly and accurately.".to_string()
}

fn default_document_prompt() -> String {
    "You are a helpful assistant. Answer the user's question using only the document \
     content below. If the content does not contain the answer, say that you do not know.\n\n\
     Document content:\n{context}"
        .to_string()
}

fn default_retrieval_k() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Ollama language model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Model used when a request does not name one.
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Sampling temperature for answers and summaries.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling temperature for tool-intent classification.
    #[serde(default = "default_classifier_temperature")]
    pub classifier_temperature: f32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            classifier_temperature: default_classifier_temperature(),
            request_timeout_secs: default_ollama_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen3:8b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_classifier_temperature() -> f32 {
    0.3
}

fn default_ollama_timeout() -> u64 {
    120
}

/// News tool provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewsConfig {
    /// News API key. `None` runs the provider in demo mode.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the news API.
    #[serde(default = "default_news_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_news_timeout")]
    pub request_timeout_secs: u64,

    /// How long a successful result stays cached, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Number of articles fetched when the request does not say.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_url(),
            request_timeout_secs: default_news_timeout(),
            cache_ttl_secs: default_cache_ttl(),
            default_page_size: default_page_size(),
        }
    }
}

fn default_news_url() -> String {
    "http://v.juhe.cn/toutiao".to_string()
}

fn default_news_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_page_size() -> u32 {
    10
}

/// Delivery channel and tool-output pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Reader poll timeout in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Characters per chunk when replaying tool output.
    #[serde(default = "default_slice_chars")]
    pub slice_chars: usize,

    /// Pause between tool-output chunks in milliseconds.
    #[serde(default = "default_slice_delay")]
    pub slice_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            slice_chars: default_slice_chars(),
            slice_delay_ms: default_slice_delay(),
        }
    }
}

fn default_poll_interval() -> u64 {
    100
}

fn default_slice_chars() -> usize {
    10
}

fn default_slice_delay() -> u64 {
    10
}
