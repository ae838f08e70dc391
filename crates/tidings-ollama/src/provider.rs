// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`OllamaProvider`]: a [`LanguageModel`] over Ollama's native chat API.

use std::time::Duration;

use async_trait::async_trait;
use tidings_config::model::OllamaConfig;
use tidings_core::types::{AdapterType, CompletionRequest, HealthStatus};
use tidings_core::{FragmentStream, LanguageModel, PluginAdapter, TidingsError};
use tracing::{debug, warn};

use crate::stream::into_fragments;
use crate::types::{ChatChunk, ChatRequest, ErrorResponse, Options, TagsResponse, WireMessage};

/// Time allowed to establish a connection to the Ollama server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Language model backed by a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    default_temperature: f32,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self, TidingsError> {
        // Streams can run long; only the gap between reads is bounded.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TidingsError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
            default_temperature: config.temperature,
        })
    }

    /// Model used when a request does not name one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn chat_request(&self, request: CompletionRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: request.model.unwrap_or_else(|| self.default_model.clone()),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            stream,
            options: Some(Options {
                temperature: Some(request.temperature.unwrap_or(self.default_temperature)),
            }),
        }
    }

    async fn post_chat(&self, body: &ChatRequest) -> Result<reqwest::Response, TidingsError> {
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream,
            "sending chat request"
        );
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| TidingsError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        warn!(status = %status, %detail, "Ollama returned an error");
        Err(TidingsError::provider(format!("Ollama returned {status}: {detail}")))
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LanguageModel
    }

    /// Healthy when the server answers and the default model is pulled.
    async fn health_check(&self) -> Result<HealthStatus, TidingsError> {
        let response = match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                return Ok(HealthStatus::Unhealthy(format!(
                    "Ollama returned {}",
                    response.status()
                )));
            }
            Err(e) => return Ok(HealthStatus::Unhealthy(format!("Ollama unreachable: {e}"))),
        };

        let tags: TagsResponse = response.json().await.map_err(|e| TidingsError::Provider {
            message: format!("invalid /api/tags response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let wanted = &self.default_model;
        let pulled = tags
            .models
            .iter()
            .any(|m| m.name == *wanted || m.name.strip_suffix(":latest") == Some(wanted.as_str()));
        Ok(if pulled {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded(format!("model `{wanted}` is not pulled"))
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TidingsError> {
        let body = self.chat_request(request, false);
        let response = self.post_chat(&body).await?;
        let chunk: ChatChunk = response.json().await.map_err(|e| TidingsError::Provider {
            message: format!("invalid chat response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if let Some(error) = chunk.error {
            return Err(TidingsError::provider(format!("Ollama error: {error}")));
        }
        Ok(chunk.content().to_string())
    }

    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, TidingsError> {
        let body = self.chat_request(request, true);
        let response = self.post_chat(&body).await?;
        Ok(into_fragments(response.bytes_stream()))
    }
}
