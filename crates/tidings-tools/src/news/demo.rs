// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder articles served when no API key is configured.

use chrono::{Duration, Local};

use super::api::Article;

fn stamp(hours_ago: i64) -> Option<String> {
    Some(
        (Local::now() - Duration::hours(hours_ago))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

fn article(title: String, source: &str, hours_ago: i64, digest: String, url: String) -> Article {
    Article {
        title: Some(title),
        source: Some(source.to_string()),
        time: stamp(hours_ago),
        digest: Some(digest),
        url: Some(url),
    }
}

pub(crate) fn headlines(page_size: usize) -> Vec<Article> {
    let mut articles = vec![
        article(
            "Headline example 1 - a demo news title".into(),
            "Example Media",
            0,
            "This is a demo article. With an API key configured, real summaries appear here.".into(),
            "https://example.com/news/1".into(),
        ),
        article(
            "Headline example 2 - another demo story".into(),
            "Example Media 2",
            1,
            "A second demo article. Configure news.api_key to fetch live headlines.".into(),
            "https://example.com/news/2".into(),
        ),
        article(
            "Headline example 3 - more demo content".into(),
            "Example Media 3",
            2,
            "A third demo article.".into(),
            "https://example.com/news/3".into(),
        ),
    ];
    articles.truncate(page_size);
    articles
}

pub(crate) fn by_type(code: &str, category: &str, page_size: usize) -> Vec<Article> {
    let mut articles = vec![
        article(
            format!("{category} news example 1"),
            "Example Media",
            0,
            format!("A demo {category} article."),
            format!("https://example.com/news/{code}/1"),
        ),
        article(
            format!("{category} news example 2"),
            "Example Media 2",
            1,
            format!("Another demo {category} article."),
            format!("https://example.com/news/{code}/2"),
        ),
    ];
    articles.truncate(page_size);
    articles
}

pub(crate) fn search(keyword: &str, page_size: usize) -> Vec<Article> {
    let mut articles = vec![
        article(
            format!("Search result 1 for '{keyword}'"),
            "Search Media",
            0,
            format!("A demo search result about '{keyword}'."),
            format!("https://example.com/search/{keyword}/1"),
        ),
        article(
            format!("Search result 2 for '{keyword}'"),
            "Search Media 2",
            1,
            format!("Another demo search result about '{keyword}'."),
            format!("https://example.com/search/{keyword}/2"),
        ),
    ];
    articles.truncate(page_size);
    articles
}
