// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context window: decides which stored turns are sent verbatim and when
//! older turns collapse into a rolling summary.
//!
//! A turn is one user message plus one assistant reply, so
//! `total_turns = history.len() / 2`. While `total_turns <= max_turns` the
//! whole history is sent. Past that, the earliest `2 * max_turns` messages
//! are summarized once (the caller caches the summary on the conversation)
//! and only the latest `2 * max_turns` messages are sent after it.

use std::sync::atomic::{AtomicUsize, Ordering};

use tidings_core::TidingsError;
use tidings_core::types::{ChatMessage, ContentPart, ImageRef, Message, MessageContent, Role};
use tracing::{debug, info};

use crate::summary::Summarizer;

/// Prefix of the system message carrying the rolling summary.
pub const SUMMARY_PREFIX: &str = "Summary of the earlier conversation: ";

/// Inputs for one model call. Borrowed from a conversation snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub history: &'a [Message],
    /// Summary already cached on the conversation.
    pub summary: Option<&'a str>,
    pub query: &'a str,
    pub system_prompt: &'a str,
    pub images: &'a [ImageRef],
    /// Model override, also used for the summarization call.
    pub model: Option<&'a str>,
}

/// Messages for the model call, plus a summary produced by this build.
#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub messages: Vec<ChatMessage>,
    /// Set only when this build had to generate a summary. The caller stores
    /// it on the conversation if none has been stored since the snapshot.
    pub generated_summary: Option<String>,
}

/// Turn-bounded context builder.
pub struct ContextWindow {
    max_turns: AtomicUsize,
    summarizer: Summarizer,
}

impl ContextWindow {
    /// Creates a window keeping `max_turns` turns verbatim.
    pub fn new(max_turns: usize, summarizer: Summarizer) -> Result<Self, TidingsError> {
        validate_turns(max_turns)?;
        Ok(Self {
            max_turns: AtomicUsize::new(max_turns),
            summarizer,
        })
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns.load(Ordering::Relaxed)
    }

    /// Changes the turn limit for subsequent builds. Zero is rejected.
    pub fn set_max_turns(&self, max_turns: usize) -> Result<(), TidingsError> {
        validate_turns(max_turns)?;
        self.max_turns.store(max_turns, Ordering::Relaxed);
        info!(max_turns, "context window resized");
        Ok(())
    }

    /// Builds the message sequence for one model call.
    ///
    /// Never mutates the history. At most one summarization call is made,
    /// and only when the history overflows without a cached summary.
    pub async fn build(&self, request: ContextRequest<'_>) -> Result<BuiltContext, TidingsError> {
        let max_turns = self.max_turns();
        let history = request.history;
        let total_turns = history.len() / 2;

        let mut messages = vec![ChatMessage::system(request.system_prompt)];
        let mut generated_summary = None;

        let verbatim = if total_turns > max_turns {
            let window = max_turns * 2;

            let summary = match request.summary {
                Some(cached) => Some(cached.to_string()),
                None => {
                    info!(total_turns, max_turns, summarized = window, "context overflow, summarizing");
                    let fresh = self
                        .summarizer
                        .summarize(&history[..window], request.model)
                        .await?;
                    generated_summary = fresh.clone();
                    fresh
                }
            };

            if let Some(summary) = summary {
                messages.push(ChatMessage::system(format!("{SUMMARY_PREFIX}{summary}")));
            }

            &history[history.len() - window..]
        } else {
            history
        };

        messages.extend(verbatim.iter().filter_map(to_chat_message));
        messages.push(user_turn(request.query, request.images));

        debug!(
            total_turns,
            max_turns,
            sent = messages.len(),
            images = request.images.len(),
            "context built"
        );

        Ok(BuiltContext {
            messages,
            generated_summary,
        })
    }
}

fn validate_turns(max_turns: usize) -> Result<(), TidingsError> {
    if max_turns == 0 {
        return Err(TidingsError::Config(
            "max_context_turns must be greater than 0".into(),
        ));
    }
    Ok(())
}

fn to_chat_message(message: &Message) -> Option<ChatMessage> {
    match message.role {
        Role::User => Some(ChatMessage::user(message.content.clone())),
        Role::Assistant => Some(ChatMessage::assistant(message.content.clone())),
        Role::System => None,
    }
}

/// The new user turn: plain text, or text plus one part per image in order.
fn user_turn(query: &str, images: &[ImageRef]) -> ChatMessage {
    if images.is_empty() {
        return ChatMessage::user(query);
    }

    let mut parts = vec![ContentPart::Text {
        text: query.to_string(),
    }];
    parts.extend(images.iter().map(|image| ContentPart::Image {
        media_type: image.media_type.clone(),
        data: image.data.clone(),
    }));

    ChatMessage {
        role: Role::User,
        content: MessageContent::Parts(parts),
    }
}
