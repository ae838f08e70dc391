// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assistant facade: start, stop, subscribe and status.
//!
//! One `Assistant` owns one single-flight controller. Clones share it.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tidings_config::model::TidingsConfig;
use tidings_context::{ContextWindow, Summarizer};
use tidings_core::types::{GenerationEvent, TerminalError};
use tidings_core::{LanguageModel, TidingsError};
use tidings_tools::{IntentDispatcher, ToolProvider, ToolRegistry};
use tracing::{error, info};

use crate::controller::{ActiveGeneration, GenerationController, GenerationOutcome, GenerationState};
use crate::conversation::ConversationStore;
use crate::delivery::DeliveryChannel;
use crate::events::{EventStream, event_stream};
use crate::generation::{GenerationJob, Pipeline, PipelineSettings};
use crate::naming::AutoNamer;

/// Why a start request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Another generation is running.
    Busy,
    /// The query is blank and no images are attached.
    EmptyQuery,
    UnknownConversation(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Busy => write!(f, "a reply is already being generated"),
            Rejection::EmptyQuery => write!(f, "enter a question or attach an image"),
            Rejection::UnknownConversation(id) => write!(f, "conversation not found: {id}"),
        }
    }
}

/// Result of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted { conversation_id: String },
    Rejected(Rejection),
}

impl StartOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, StartOutcome::Accepted { .. })
    }
}

/// Snapshot of the assistant and its current conversation.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantStatus {
    pub is_generating: bool,
    pub has_document: bool,
    pub current_document: Option<String>,
    pub message_count: usize,
    pub max_context_turns: usize,
    pub conversation_id: String,
    pub conversation_name: String,
}

/// Builds an [`Assistant`] from configuration and collaborators.
pub struct AssistantBuilder {
    config: TidingsConfig,
    model: Arc<dyn LanguageModel>,
    registry: ToolRegistry,
}

impl AssistantBuilder {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            config: TidingsConfig::default(),
            model,
            registry: ToolRegistry::new(),
        }
    }

    pub fn config(mut self, config: TidingsConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers every tool of `provider`. Duplicate tool names are rejected.
    pub fn tool_provider(mut self, provider: Arc<dyn ToolProvider>) -> Result<Self, TidingsError> {
        self.registry.register(provider)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Assistant, TidingsError> {
        let TidingsConfig {
            agent,
            ollama,
            delivery,
            ..
        } = self.config;

        let summarizer = Summarizer::new(Arc::clone(&self.model)).with_temperature(ollama.temperature);
        let window = ContextWindow::new(agent.max_context_turns, summarizer.clone())?;
        let tool_count = self.registry.len();
        let dispatcher = IntentDispatcher::new(Arc::clone(&self.model), Arc::new(self.registry))
            .with_temperature(ollama.classifier_temperature);

        let store = Arc::new(ConversationStore::new());
        let channel = Arc::new(DeliveryChannel::new());
        let controller = Arc::new(GenerationController::new(Arc::clone(&channel)));

        let pipeline = Pipeline {
            store: Arc::clone(&store),
            dispatcher,
            window,
            model: self.model,
            namer: AutoNamer::new(summarizer, agent.summarize_titles),
            settings: PipelineSettings {
                system_prompt: agent.system_prompt,
                document_prompt: agent.document_prompt,
                retrieval_k: agent.retrieval_k,
                temperature: Some(ollama.temperature),
                slice_chars: delivery.slice_chars,
                slice_delay: Duration::from_millis(delivery.slice_delay_ms),
            },
        };

        info!(
            tools = tool_count,
            max_context_turns = agent.max_context_turns,
            "assistant ready"
        );

        Ok(Assistant {
            inner: Arc::new(Inner {
                pipeline: Arc::new(pipeline),
                controller,
                delivery: channel,
                store,
                poll_interval: Duration::from_millis(delivery.poll_interval_ms),
            }),
        })
    }
}

struct Inner {
    pipeline: Arc<Pipeline>,
    controller: Arc<GenerationController>,
    delivery: Arc<DeliveryChannel>,
    store: Arc<ConversationStore>,
    poll_interval: Duration,
}

/// Conversational assistant core.
#[derive(Clone)]
pub struct Assistant {
    inner: Arc<Inner>,
}

impl Assistant {
    pub fn builder(model: Arc<dyn LanguageModel>) -> AssistantBuilder {
        AssistantBuilder::new(model)
    }

    /// Conversation management.
    pub fn conversations(&self) -> &ConversationStore {
        &self.inner.store
    }

    /// Starts a generation for `conversation_id`, or the current
    /// conversation when `None`. Returns without waiting for the reply.
    ///
    /// Rejections leave every piece of state untouched.
    pub async fn start_generation(
        &self,
        conversation_id: Option<&str>,
        query: &str,
        model: Option<&str>,
    ) -> StartOutcome {
        let inner = &self.inner;
        if inner.controller.is_running() {
            return StartOutcome::Rejected(Rejection::Busy);
        }

        let conversation = match conversation_id {
            Some(id) => match inner.store.get(id).await {
                Ok(conversation) => conversation,
                Err(_) => return StartOutcome::Rejected(Rejection::UnknownConversation(id.to_string())),
            },
            None => inner.store.current().await,
        };

        let query = query.trim();
        if query.is_empty() && conversation.images.is_empty() {
            return StartOutcome::Rejected(Rejection::EmptyQuery);
        }

        let Some(active) = inner.controller.try_begin() else {
            return StartOutcome::Rejected(Rejection::Busy);
        };

        let job = GenerationJob {
            conversation_id: conversation.id.clone(),
            query: query.to_string(),
            model: model.map(str::to_string),
            token: active.token(),
            sink: active.sink(),
        };
        info!(
            conversation_id = %conversation.id,
            epoch = active.epoch(),
            query_len = query.len(),
            images = conversation.images.len(),
            "generation accepted"
        );

        tokio::spawn(supervise(Arc::clone(&inner.pipeline), job, active));

        StartOutcome::Accepted {
            conversation_id: conversation.id,
        }
    }

    /// Requests cooperative cancellation. Returns `false` when idle.
    pub fn stop_generation(&self) -> bool {
        self.inner.controller.request_stop()
    }

    /// Events of the running (or next) generation. Ends after one terminal
    /// event, or with an implicit `done` once idle with nothing queued.
    pub fn subscribe_events(&self) -> EventStream {
        event_stream(
            Arc::clone(&self.inner.delivery),
            Arc::clone(&self.inner.controller),
            self.inner.poll_interval,
        )
    }

    pub fn state(&self) -> GenerationState {
        self.inner.controller.state()
    }

    pub fn last_outcome(&self) -> Option<GenerationOutcome> {
        self.inner.controller.last_outcome()
    }

    pub async fn wait_until_idle(&self) {
        self.inner.controller.wait_until_idle().await;
    }

    /// Status of the assistant and the current conversation.
    pub async fn status(&self) -> AssistantStatus {
        let conversation = self.inner.store.current().await;
        AssistantStatus {
            is_generating: self.inner.controller.is_running(),
            has_document: conversation.document.is_some(),
            current_document: conversation.document.as_ref().map(|d| d.label.clone()),
            message_count: conversation.messages.len(),
            max_context_turns: self.max_context_turns(),
            conversation_id: conversation.id,
            conversation_name: conversation.name,
        }
    }

    pub fn max_context_turns(&self) -> usize {
        self.inner.pipeline.window.max_turns()
    }

    /// Changes the context window for later generations. Zero is rejected.
    pub fn set_max_context_turns(&self, max_turns: usize) -> Result<(), TidingsError> {
        self.inner.pipeline.window.set_max_turns(max_turns)
    }

    /// Names of the registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.inner
            .pipeline
            .dispatcher
            .registry()
            .schemas()
            .into_iter()
            .map(|schema| schema.name.clone())
            .collect()
    }
}

/// Runs the body in its own task so a panic still ends in a terminal event.
async fn supervise(pipeline: Arc<Pipeline>, job: GenerationJob, active: ActiveGeneration) {
    let epoch = active.epoch();
    let body = tokio::spawn(async move { pipeline.run(&job).await });

    let terminal = match body.await {
        Ok(terminal) => terminal,
        Err(e) => {
            let reason = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                "generation task was cancelled".to_string()
            };
            error!(epoch, %reason, "generation task aborted");
            GenerationEvent::Error {
                error: TerminalError::Failed(reason),
            }
        }
    };

    active.complete(terminal);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("generation task panicked: {detail}"),
        None => "generation task panicked".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_described() {
        assert_eq!(
            panic_message(Box::new("boom")),
            "generation task panicked: boom"
        );
        assert_eq!(
            panic_message(Box::new(String::from("bang"))),
            "generation task panicked: bang"
        );
        assert_eq!(panic_message(Box::new(7_u8)), "generation task panicked");
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(Rejection::Busy.to_string(), "a reply is already being generated");
        assert!(!StartOutcome::Rejected(Rejection::EmptyQuery).is_accepted());
    }
}
