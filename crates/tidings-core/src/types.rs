// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the tool, context, and agent crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    LanguageModel,
    DocumentSource,
    ToolProvider,
}

// --- Conversation data ---

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// An image attached to a conversation, already encoded for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Display name (`image_1`, `image_2`, ...).
    pub name: String,
    /// MIME type of the encoded data, e.g. `image/jpeg`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// A single stored conversation message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub images: Vec<ImageRef>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a text-only message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attaches image references to the message.
    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }
}

// --- Model request types ---

/// One part of a composite message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { media_type: String, data: String },
}

/// Body of a message sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the body, ignoring image parts.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Base64 payloads of every image part, in order.
    pub fn images(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Image { data, .. } => Some(data.as_str()),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

/// A message in the transient sequence handed to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

/// A request to the language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model override; `None` uses the adapter's configured model.
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            messages,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A passage returned by a document similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            score: None,
        }
    }
}

// --- Tool types ---

/// Semantic type tag of a tool parameter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

/// One parameter in a tool schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

impl ToolParameter {
    /// A parameter the caller must always supply.
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value.
    pub fn optional(
        name: &str,
        kind: ParamType,
        description: &str,
        default: serde_json::Value,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
            default: Some(default),
        }
    }
}

/// Machine-readable description of a named tool. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    /// Human-facing label used when announcing the tool to the user.
    pub display_name: Option<String>,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSchema {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            description: description.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn param(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The display name, falling back to the tool name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Outcome of executing a tool. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolInvocationResult {
    Success {
        tool_name: String,
        /// Structured payload returned by the tool.
        data: serde_json::Value,
        /// Human-readable rendering of `data`.
        rendered: String,
    },
    Failure {
        tool_name: String,
        error: String,
    },
}

impl ToolInvocationResult {
    pub fn failure(tool_name: &str, error: impl Into<String>) -> Self {
        ToolInvocationResult::Failure {
            tool_name: tool_name.to_string(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolInvocationResult::Success { .. })
    }

    pub fn tool_name(&self) -> &str {
        match self {
            ToolInvocationResult::Success { tool_name, .. }
            | ToolInvocationResult::Failure { tool_name, .. } => tool_name,
        }
    }
}

// --- Delivery events ---

/// Reason carried by an `error` terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum TerminalError {
    /// The generation was stopped by request.
    Interrupted,
    /// The generation failed; the message describes the failure.
    Failed(String),
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalError::Interrupted => write!(f, "generation interrupted"),
            TerminalError::Failed(message) => write!(f, "generation failed: {message}"),
        }
    }
}

/// An event published on the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// An incremental piece of output.
    Chunk { text: String },
    /// Successful terminal event. `output` is `None` when the reader
    /// synthesized the event after finding no active generation.
    Done { output: Option<String> },
    /// Failed or interrupted terminal event.
    Error { error: TerminalError },
}

impl GenerationEvent {
    pub fn chunk(text: impl Into<String>) -> Self {
        GenerationEvent::Chunk { text: text.into() }
    }

    /// Whether this event ends a generation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Chunk { .. })
    }
}
