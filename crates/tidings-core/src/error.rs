// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tidings assistant core.

use thiserror::Error;

/// The primary error type used across collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum TidingsError {
    /// Configuration errors (invalid values, rejected runtime updates).
    #[error("configuration error: {0}")]
    Config(String),

    /// Language model errors (transport failure, bad status, undecodable body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Tool registration or tool transport errors.
    #[error("tool error: {message}")]
    Tool {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document context lookup errors.
    #[error("document error: {message}")]
    Document {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    /// The caller supplied a request the core refuses to act on.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TidingsError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        TidingsError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a tool error without an underlying source.
    pub fn tool(message: impl Into<String>) -> Self {
        TidingsError::Tool {
            message: message.into(),
            source: None,
        }
    }
}
