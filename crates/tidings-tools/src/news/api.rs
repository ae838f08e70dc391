// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the news API and markdown rendering of articles.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Response envelope. `error_code` is zero on success.
#[derive(Debug, Deserialize)]
pub(crate) struct NewsResponse {
    pub error_code: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub result: Option<NewsResult>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NewsResult {
    #[serde(default)]
    pub data: Vec<Article>,
}

/// One news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "author_name")]
    pub source: Option<String>,
    #[serde(default, alias = "date")]
    pub time: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Renders articles as a numbered markdown list under `heading`.
pub fn render_articles(heading: &str, articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No matching news found.".to_string();
    }

    let mut out = format!("## {heading}\n\n");
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(
            out,
            "### {}. {}",
            i + 1,
            article.title.as_deref().unwrap_or("Untitled")
        );
        let _ = writeln!(out, "**Source**: {}", article.source.as_deref().unwrap_or("Unknown"));
        let _ = writeln!(out, "**Time**: {}", article.time.as_deref().unwrap_or("Unknown"));
        let _ = writeln!(
            out,
            "**Summary**: {}",
            article.digest.as_deref().unwrap_or("No summary")
        );
        let _ = writeln!(out, "**Link**: {}\n", article.url.as_deref().unwrap_or(""));
    }
    out
}
