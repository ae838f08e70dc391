// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! `MockProvider` implements `LanguageModel` with scripted responses.
//! Completions and streams are popped from separate FIFO queues; when a
//! queue is empty the default text "mock response" is returned.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::sync::Mutex;

use tidings_core::types::{AdapterType, CompletionRequest, HealthStatus};
use tidings_core::{FragmentStream, LanguageModel, PluginAdapter, TidingsError};

const DEFAULT_RESPONSE: &str = "mock response";

/// Scripted behavior for one `stream` call.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Yield these fragments, then end.
    Fragments(Vec<String>),
    /// Yield these fragments, then a provider error.
    FailAfter(Vec<String>, String),
    /// Yield these fragments, then never yield again.
    Stall(Vec<String>),
    /// `stream` itself returns a provider error.
    Refuse(String),
    /// `stream` panics.
    Panic(String),
}

impl StreamScript {
    /// Convenience for a fragment list.
    pub fn fragments(parts: &[&str]) -> Self {
        StreamScript::Fragments(parts.iter().map(|p| p.to_string()).collect())
    }
}

/// A mock language model with scripted completions and streams.
pub struct MockProvider {
    completions: Mutex<VecDeque<Result<String, String>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    complete_requests: Mutex<Vec<CompletionRequest>>,
    stream_requests: Mutex<Vec<CompletionRequest>>,
    complete_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    fragments_yielded: Arc<AtomicUsize>,
    fragment_delay: Option<Duration>,
    completion_delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with empty queues.
    pub fn new() -> Self {
        Self {
            completions: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            complete_requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
            complete_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            fragments_yielded: Arc::new(AtomicUsize::new(0)),
            fragment_delay: None,
            completion_delay: None,
        }
    }

    /// Create a mock provider pre-loaded with completion responses.
    pub fn with_completions(responses: Vec<&str>) -> Self {
        Self {
            completions: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            ..Self::new()
        }
    }

    /// Sleep this long before every streamed fragment.
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = Some(delay);
        self
    }

    /// Sleep this long before every completion returns.
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = Some(delay);
        self
    }

    /// Queue a completion response.
    pub async fn push_completion(&self, text: &str) {
        self.completions.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queue a failing completion.
    pub async fn push_completion_error(&self, message: &str) {
        self.completions
            .lock()
            .await
            .push_back(Err(message.to_string()));
    }

    /// Queue a stream script.
    pub async fn push_stream(&self, script: StreamScript) {
        self.streams.lock().await.push_back(script);
    }

    /// Number of `complete` calls so far.
    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    /// Number of `stream` calls so far.
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Number of fragments actually pulled from returned streams.
    pub fn fragments_yielded(&self) -> usize {
        self.fragments_yielded.load(Ordering::SeqCst)
    }

    /// Requests received by `complete`, in order.
    pub async fn complete_requests(&self) -> Vec<CompletionRequest> {
        self.complete_requests.lock().await.clone()
    }

    /// Requests received by `stream`, in order.
    pub async fn stream_requests(&self) -> Vec<CompletionRequest> {
        self.stream_requests.lock().await.clone()
    }

    fn fragment_stream(&self, fragments: Vec<String>) -> FragmentStream {
        let delay = self.fragment_delay;
        let counter = Arc::clone(&self.fragments_yielded);
        Box::pin(stream::iter(fragments).then(move |fragment| {
            let counter = Arc::clone(&counter);
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(fragment)
            }
        }))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LanguageModel
    }

    async fn health_check(&self) -> Result<HealthStatus, TidingsError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LanguageModel for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TidingsError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.complete_requests.lock().await.push(request);

        if let Some(delay) = self.completion_delay {
            tokio::time::sleep(delay).await;
        }

        match self.completions.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(TidingsError::provider(message)),
            None => Ok(DEFAULT_RESPONSE.to_string()),
        }
    }

    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, TidingsError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.stream_requests.lock().await.push(request);

        let script = self
            .streams
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| StreamScript::fragments(&[DEFAULT_RESPONSE]));

        match script {
            StreamScript::Fragments(fragments) => Ok(self.fragment_stream(fragments)),
            StreamScript::FailAfter(fragments, message) => Ok(Box::pin(
                self.fragment_stream(fragments)
                    .chain(stream::once(async move { Err(TidingsError::provider(message)) })),
            )),
            StreamScript::Stall(fragments) => {
                Ok(Box::pin(self.fragment_stream(fragments).chain(stream::pending())))
            }
            StreamScript::Refuse(message) => Err(TidingsError::provider(message)),
            StreamScript::Panic(message) => panic!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockProvider::new();
        let text = provider.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(text, "mock response");

        let fragments: Vec<String> = provider
            .stream(CompletionRequest::default())
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["mock response"]);
    }

    #[tokio::test]
    async fn queued_completions_returned_in_order() {
        let provider = MockProvider::with_completions(vec!["first", "second"]);
        provider.push_completion_error("boom").await;

        assert_eq!(provider.complete(CompletionRequest::default()).await.unwrap(), "first");
        assert_eq!(provider.complete(CompletionRequest::default()).await.unwrap(), "second");
        assert!(provider.complete(CompletionRequest::default()).await.is_err());
        assert_eq!(provider.complete_calls(), 3);
        assert_eq!(provider.complete_requests().await.len(), 3);
    }

    #[tokio::test]
    async fn fail_after_yields_fragments_then_error() {
        let provider = MockProvider::new();
        provider
            .push_stream(StreamScript::FailAfter(vec!["a".into()], "dropped".into()))
            .await;

        let items: Vec<_> = provider
            .stream(CompletionRequest::default())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "a");
        assert!(items[1].is_err());
        assert_eq!(provider.fragments_yielded(), 1);
    }

    #[tokio::test]
    async fn refuse_fails_the_call() {
        let provider = MockProvider::new();
        provider.push_stream(StreamScript::Refuse("offline".into())).await;
        assert!(provider.stream(CompletionRequest::default()).await.is_err());
        assert_eq!(provider.stream_calls(), 1);
    }
}
