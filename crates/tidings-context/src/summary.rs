// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-sentence conversation summaries via the language model.
//!
//! Shared by context overflow handling and conversation naming.

use std::sync::Arc;

use tidings_core::types::{ChatMessage, CompletionRequest, Message};
use tidings_core::{LanguageModel, TidingsError};
use tracing::debug;

const SUMMARY_PROMPT: &str = "Summarize the main content of the following conversation in one sentence:";

/// Produces one-sentence summaries of message sequences.
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    temperature: Option<f32>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Summarizes `messages`. Returns `Ok(None)` when the model answers
    /// with blank text.
    pub async fn summarize(
        &self,
        messages: &[Message],
        model: Option<&str>,
    ) -> Result<Option<String>, TidingsError> {
        let mut prompt = format!("{SUMMARY_PROMPT}\n\n");
        for message in messages {
            prompt.push_str(&format!("{}: {}\n", message.role, message.content));
        }
        prompt.push_str("\nSummary:");

        let mut request =
            CompletionRequest::new(vec![ChatMessage::user(prompt)]).with_model(model.map(str::to_string));
        request.temperature = self.temperature;

        let text = self.model.complete(request).await?;
        let summary = text.trim();
        debug!(messages = messages.len(), summary_len = summary.len(), "summary generated");

        Ok((!summary.is_empty()).then(|| summary.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidings_core::types::Role;
    use tidings_test_utils::MockProvider;

    #[tokio::test]
    async fn prompt_lists_roles_and_content() {
        let model = Arc::new(MockProvider::with_completions(vec!["  They talked about tea.  "]));
        let summarizer = Summarizer::new(model.clone());

        let messages = vec![
            Message::new(Role::User, "green or black?"),
            Message::new(Role::Assistant, "green"),
        ];
        let summary = summarizer.summarize(&messages, Some("tiny")).await.unwrap();
        assert_eq!(summary.as_deref(), Some("They talked about tea."));

        let request = &model.complete_requests().await[0];
        assert_eq!(request.model.as_deref(), Some("tiny"));
        let text = request.messages[0].content.text();
        assert!(text.contains("user: green or black?\nassistant: green\n"));
        assert!(text.ends_with("Summary:"));
    }

    #[tokio::test]
    async fn blank_answer_is_none() {
        let model = Arc::new(MockProvider::with_completions(vec!["   "]));
        let summary = Summarizer::new(model).summarize(&[], None).await.unwrap();
        assert!(summary.is_none());
    }

    #[tokio::test]
    async fn model_error_propagates() {
        let model = Arc::new(MockProvider::new());
        model.push_completion_error("timeout").await;
        assert!(Summarizer::new(model).summarize(&[], None).await.is_err());
    }
}
