// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document source returning a fixed list of passages.

use std::sync::Mutex;

use async_trait::async_trait;
use tidings_core::types::Passage;
use tidings_core::{DocumentSource, TidingsError};

/// Returns the first `k` configured passages for every query and records
/// each `(query, k)` pair.
#[derive(Debug, Default)]
pub struct StaticDocuments {
    passages: Vec<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticDocuments {
    pub fn new(passages: Vec<&str>) -> Self {
        Self {
            passages: passages.into_iter().map(str::to_string).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every search issued so far.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSource for StaticDocuments {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Passage>, TidingsError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((query.to_string(), k));
        }
        Ok(self
            .passages
            .iter()
            .take(k)
            .map(|p| Passage::new(p.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_top_k_and_records_query() {
        let docs = StaticDocuments::new(vec!["a", "b", "c"]);
        let hits = docs.similarity_search("what?", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].content, "b");
        assert_eq!(docs.queries(), vec![("what?".to_string(), 2)]);
    }
}
