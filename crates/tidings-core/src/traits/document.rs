// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document context source produced by the (external) ingestion pipeline.

use async_trait::async_trait;

use crate::error::TidingsError;
use crate::types::Passage;

/// A retrievable context source bound to a conversation.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Returns up to `k` passages relevant to `query`, most relevant first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Passage>, TidingsError>;
}
