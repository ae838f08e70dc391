// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama `/api/chat` and `/api/tags` wire types.

use serde::{Deserialize, Serialize};
use tidings_core::types::ChatMessage;

/// Request body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

/// One message. Images are base64 strings without a data-URL prefix.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let images: Vec<String> = message
            .content
            .images()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            role: message.role.to_string(),
            content: message.content.text(),
            images: (!images.is_empty()).then_some(images),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A complete response, or one JSON line of a streamed response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub done: bool,
    /// Set when the server fails after the stream has started.
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatChunk {
    pub(crate) fn content(&self) -> &str {
        self.message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

/// Response of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelTag {
    pub name: String,
}
