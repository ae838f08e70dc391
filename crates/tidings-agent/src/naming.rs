// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation auto-naming after a completed turn.

use tidings_context::Summarizer;
use tidings_core::TidingsError;
use tidings_core::types::Role;
use tracing::{debug, warn};

use crate::conversation::{ConversationStore, DEFAULT_NAME};

/// Character limit for a name taken from the first user message.
pub const QUERY_TITLE_CHARS: usize = 20;

/// Character limit for a name taken from the rolling summary.
pub const SUMMARY_TITLE_CHARS: usize = 30;

/// Names conversations from their first query, then from a summary.
#[derive(Clone)]
pub struct AutoNamer {
    summarizer: Summarizer,
    summarize_titles: bool,
}

impl AutoNamer {
    pub fn new(summarizer: Summarizer, summarize_titles: bool) -> Self {
        Self {
            summarizer,
            summarize_titles,
        }
    }

    /// Updates the conversation name after a turn was appended.
    ///
    /// User-renamed conversations are left alone. Summary failures are
    /// logged; the turn itself has already been committed.
    pub async fn name_after_turn(&self, store: &ConversationStore, conversation_id: &str, model: Option<&str>) {
        if let Err(e) = self.try_name(store, conversation_id, model).await {
            warn!(conversation_id, error = %e, "auto-naming failed");
        }
    }

    async fn try_name(
        &self,
        store: &ConversationStore,
        conversation_id: &str,
        model: Option<&str>,
    ) -> Result<(), TidingsError> {
        let snapshot = store.get(conversation_id).await?;
        if snapshot.user_named {
            return Ok(());
        }

        if snapshot.name == DEFAULT_NAME
            && let Some(first) = snapshot.messages.iter().find(|m| m.role == Role::User)
            && !first.content.trim().is_empty()
        {
            let title = truncate_title(first.content.trim(), QUERY_TITLE_CHARS);
            debug!(conversation_id, %title, "naming from first query");
            store.set_auto_name(conversation_id, title).await?;
        }

        if self.summarize_titles && snapshot.messages.len() >= 2 {
            if let Some(summary) = self.summarizer.summarize(&snapshot.messages, model).await? {
                let title = truncate_title(&summary, SUMMARY_TITLE_CHARS);
                debug!(conversation_id, %title, "naming from summary");
                store.set_auto_name(conversation_id, title).await?;
            }
        }
        Ok(())
    }
}

/// Cuts `text` to `max_chars` characters, appending "..." when cut.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
