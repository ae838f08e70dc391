// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body of one generation: tool dispatch, or retrieval plus model streaming.
//!
//! The body only publishes chunk events. It returns the terminal event to
//! its supervisor, which publishes it after the body has fully stopped, so
//! no chunk can follow a terminal event.
//!
//! Cancellation checkpoints:
//! - before each tool-output slice (and while pacing between slices),
//! - before context assembly and before the model call,
//! - while waiting for each streamed fragment.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tidings_context::{ContextRequest, ContextWindow, render_document_prompt};
use tidings_core::types::{CompletionRequest, GenerationEvent, ImageRef, TerminalError};
use tidings_core::{LanguageModel, TidingsError};
use tidings_tools::{Dispatch, IntentDispatcher, ToolSuccess};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::conversation::ConversationStore;
use crate::delivery::EventSink;
use crate::naming::AutoNamer;

/// Appended to partial model output when a stop request arrives mid-stream.
pub const INTERRUPTION_MARKER: &str = "\n\nInterrupted.";

/// Preamble announcing the tool that produced the answer.
pub fn tool_preamble(display_name: &str) -> String {
    format!("📰 Fetching information from {display_name}...\n\n")
}

/// Prompt and pacing settings for the pipeline.
#[derive(Debug, Clone)]
pub(crate) struct PipelineSettings {
    pub system_prompt: String,
    pub document_prompt: String,
    pub retrieval_k: usize,
    pub temperature: Option<f32>,
    pub slice_chars: usize,
    pub slice_delay: Duration,
}

/// Collaborators shared by every generation.
pub(crate) struct Pipeline {
    pub store: Arc<ConversationStore>,
    pub dispatcher: IntentDispatcher,
    pub window: ContextWindow,
    pub model: Arc<dyn LanguageModel>,
    pub namer: AutoNamer,
    pub settings: PipelineSettings,
}

/// One accepted generation request.
pub(crate) struct GenerationJob {
    pub conversation_id: String,
    pub query: String,
    pub model: Option<String>,
    pub token: CancellationToken,
    pub sink: EventSink,
}

/// Early exit from the body.
enum Halt {
    Interrupted,
    Failed(TidingsError),
}

impl From<TidingsError> for Halt {
    fn from(e: TidingsError) -> Self {
        Halt::Failed(e)
    }
}

fn checkpoint(token: &CancellationToken) -> Result<(), Halt> {
    if token.is_cancelled() {
        return Err(Halt::Interrupted);
    }
    Ok(())
}

impl Pipeline {
    /// Runs the job and returns its terminal event.
    pub(crate) async fn run(&self, job: &GenerationJob) -> GenerationEvent {
        match self.execute(job).await {
            Ok(output) => GenerationEvent::Done {
                output: Some(output),
            },
            Err(Halt::Interrupted) => {
                info!(conversation_id = %job.conversation_id, "generation interrupted");
                GenerationEvent::Error {
                    error: TerminalError::Interrupted,
                }
            }
            Err(Halt::Failed(e)) => {
                error!(conversation_id = %job.conversation_id, error = %e, "generation failed");
                GenerationEvent::Error {
                    error: TerminalError::Failed(e.to_string()),
                }
            }
        }
    }

    async fn execute(&self, job: &GenerationJob) -> Result<String, Halt> {
        let model = job.model.as_deref();

        if !job.query.trim().is_empty() {
            match self.dispatcher.detect(&job.query, model).await {
                Dispatch::ToolUsed(success) => return self.answer_from_tool(job, success).await,
                Dispatch::ToolFailed { tool_name, error } => {
                    warn!(tool = %tool_name, %error, "tool failed, answering with the model");
                }
                Dispatch::NoTool(reason) => {
                    debug!(?reason, "no tool used");
                }
            }
        }

        self.answer_from_model(job).await
    }

    async fn answer_from_tool(&self, job: &GenerationJob, success: ToolSuccess) -> Result<String, Halt> {
        let preamble = tool_preamble(&success.display_name);
        info!(tool = %success.tool_name, "answering from tool output");
        job.sink.chunk(preamble.clone());

        let pacing = self.settings.slice_delay;
        for slice in char_slices(&success.rendered, self.settings.slice_chars) {
            checkpoint(&job.token)?;
            job.sink.chunk(slice);
            tokio::select! {
                _ = job.token.cancelled() => return Err(Halt::Interrupted),
                _ = tokio::time::sleep(pacing) => {}
            }
        }
        checkpoint(&job.token)?;

        let output = format!("{preamble}{}", success.rendered);
        self.commit(job, Vec::new(), &output).await?;
        Ok(output)
    }

    async fn answer_from_model(&self, job: &GenerationJob) -> Result<String, Halt> {
        let model = job.model.as_deref();
        let snapshot = self.store.get(&job.conversation_id).await?;

        let system_prompt = match &snapshot.document {
            Some(document) => {
                let passages = document
                    .source
                    .similarity_search(&job.query, self.settings.retrieval_k)
                    .await
                    .map_err(|e| TidingsError::Document {
                        message: format!("retrieval from {} failed", document.label),
                        source: Some(Box::new(e)),
                    })?;
                debug!(document = %document.label, passages = passages.len(), "retrieved passages");
                render_document_prompt(&self.settings.document_prompt, &passages)
            }
            None => self.settings.system_prompt.clone(),
        };
        checkpoint(&job.token)?;

        let built = self
            .window
            .build(ContextRequest {
                history: &snapshot.messages,
                summary: snapshot.summary.as_deref(),
                query: &job.query,
                system_prompt: &system_prompt,
                images: &snapshot.images,
                model,
            })
            .await?;
        if let Some(summary) = built.generated_summary {
            self.store
                .set_summary_if_absent(&job.conversation_id, summary)
                .await?;
        }
        checkpoint(&job.token)?;

        let mut request = CompletionRequest::new(built.messages).with_model(job.model.clone());
        request.temperature = self.settings.temperature;
        let mut fragments = self.model.stream(request).await?;

        let mut output = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = job.token.cancelled() => None,
                item = fragments.next() => Some(item),
            };

            match next {
                None => {
                    if !output.is_empty() {
                        output.push_str(INTERRUPTION_MARKER);
                        job.sink.chunk(INTERRUPTION_MARKER);
                    }
                    debug!(partial_len = output.len(), "stream abandoned");
                    return Err(Halt::Interrupted);
                }
                Some(None) => break,
                Some(Some(Err(e))) => return Err(Halt::Failed(e)),
                Some(Some(Ok(fragment))) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    output.push_str(&fragment);
                    job.sink.chunk(fragment);
                }
            }
        }
        checkpoint(&job.token)?;

        self.commit(job, snapshot.images, &output).await?;
        Ok(output)
    }

    /// Appends the turn and renames the conversation.
    async fn commit(
        &self,
        job: &GenerationJob,
        images: Vec<ImageRef>,
        output: &str,
    ) -> Result<(), TidingsError> {
        self.store
            .append_turn(&job.conversation_id, &job.query, images, output)
            .await?;
        self.namer
            .name_after_turn(&self.store, &job.conversation_id, job.model.as_deref())
            .await;
        Ok(())
    }
}

/// Splits `text` into slices of at most `size` characters.
pub(crate) fn char_slices(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_respect_char_boundaries() {
        assert_eq!(char_slices("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
        assert_eq!(char_slices("新闻标题", 3), vec!["新闻标", "题"]);
        assert!(char_slices("", 10).is_empty());
    }

    #[test]
    fn zero_slice_size_is_treated_as_one() {
        assert_eq!(char_slices("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn preamble_names_the_tool() {
        assert_eq!(
            tool_preamble("News search"),
            "📰 Fetching information from News search...\n\n"
        );
    }
}
