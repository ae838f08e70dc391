// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model collaborator trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::TidingsError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// A lazy, finite, non-restartable sequence of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, TidingsError>> + Send>>;

/// Language model used for classification, summarization, and answers.
///
/// `complete` is the synchronous single-shot call used for intent
/// classification and summaries. `stream` yields the answer incrementally;
/// dropping the returned stream abandons the remainder of the response.
#[async_trait]
pub trait LanguageModel: PluginAdapter {
    /// Sends a completion request and returns the full response text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, TidingsError>;

    /// Sends a completion request and returns the response as text fragments.
    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, TidingsError>;
}
