// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! News tool provider backed by the juhe.cn headline API.
//!
//! Serves three tools: `get_headlines`, `get_news_by_type` and `search_news`.
//! Without an API key the provider runs in demo mode and returns placeholder
//! articles instead of calling the network. Successful results are cached
//! by call signature.

mod api;
mod demo;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tidings_config::model::NewsConfig;
use tidings_core::types::{AdapterType, HealthStatus, ParamType, ToolInvocationResult, ToolParameter, ToolSchema};
use tidings_core::{PluginAdapter, TidingsError};
use tracing::{debug, info, warn};

use crate::cache::{ToolResultCache, cache_key};
use crate::provider::ToolProvider;

pub use api::{Article, render_articles};

/// Upper bound on articles per request accepted by the API.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Category codes accepted by `get_news_by_type`, with display names.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("top", "Top"),
    ("shehui", "Society"),
    ("guonei", "Domestic"),
    ("guoji", "International"),
    ("yule", "Entertainment"),
    ("tiyu", "Sports"),
    ("keji", "Technology"),
    ("caijing", "Finance"),
];

/// Display name for a category code; unknown codes are shown as-is.
pub fn category_name(code: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NewsQuery {
    Headlines,
    ByType(String),
    Search(String),
}

impl NewsQuery {
    fn heading(&self) -> String {
        match self {
            NewsQuery::Headlines => "Top headlines".to_string(),
            NewsQuery::ByType(code) => format!("{} news", category_name(code)),
            NewsQuery::Search(keyword) => format!("Search results: {keyword}"),
        }
    }
}

/// News tool provider.
pub struct NewsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    default_page_size: i64,
    cache: ToolResultCache,
}

impl NewsProvider {
    /// Builds the provider from configuration. An empty API key counts as absent.
    pub fn new(config: &NewsConfig) -> Result<Self, TidingsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TidingsError::Tool {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let api_key = config
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| SecretString::from(key.clone()));

        if api_key.is_none() {
            info!("news provider running in demo mode");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_page_size: i64::from(config.default_page_size),
            cache: ToolResultCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Whether the provider serves placeholder data.
    pub fn is_demo(&self) -> bool {
        self.api_key.is_none()
    }

    fn page_size_param(&self) -> ToolParameter {
        ToolParameter::optional(
            "page_size",
            ParamType::Integer,
            "Number of articles to return, 1-50",
            json!(self.default_page_size),
        )
    }

    fn parse_query(tool_name: &str, params: &Map<String, Value>) -> Result<NewsQuery, String> {
        let text = |name: &str| {
            params
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("missing required parameter `{name}`"))
        };

        match tool_name {
            "get_headlines" => Ok(NewsQuery::Headlines),
            "get_news_by_type" => text("news_type").map(NewsQuery::ByType),
            "search_news" => text("keyword").map(NewsQuery::Search),
            other => Err(format!("unknown tool: {other}")),
        }
    }

    fn page_size(&self, params: &Map<String, Value>) -> i64 {
        params
            .get("page_size")
            .and_then(Value::as_i64)
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE)
    }

    async fn run(&self, tool_name: &str, params: &Map<String, Value>) -> Result<(Vec<Article>, String), String> {
        let query = Self::parse_query(tool_name, params)?;
        let page_size = self.page_size(params);

        match &self.api_key {
            None => {
                // page_size is clamped to 1..=50
                let n = page_size as usize;
                let articles = match &query {
                    NewsQuery::Headlines => demo::headlines(n),
                    NewsQuery::ByType(code) => demo::by_type(code, category_name(code), n),
                    NewsQuery::Search(keyword) => demo::search(keyword, n),
                };
                Ok((articles, format!("{} (demo data)", query.heading())))
            }
            Some(key) => {
                let articles = self.fetch(&query, page_size, key).await?;
                Ok((articles, query.heading()))
            }
        }
    }

    async fn fetch(&self, query: &NewsQuery, page_size: i64, key: &SecretString) -> Result<Vec<Article>, String> {
        let (endpoint, selector) = match query {
            NewsQuery::Headlines => ("index", ("type", "top".to_string())),
            NewsQuery::ByType(code) => ("index", ("type", code.clone())),
            NewsQuery::Search(keyword) => ("content", ("q", keyword.clone())),
        };

        let url = reqwest::Url::parse_with_params(
            &format!("{}/{endpoint}", self.base_url),
            [
                selector,
                ("page_size", page_size.to_string()),
                ("key", key.expose_secret().to_string()),
            ],
        )
        .map_err(|e| format!("invalid news API URL: {e}"))?;

        debug!(endpoint, page_size, "requesting news");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP error: {}", status.as_u16()));
        }

        let body: api::NewsResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {e}"))?;

        if body.error_code != 0 {
            return Err(body
                .reason
                .unwrap_or_else(|| format!("news API error code {}", body.error_code)));
        }

        Ok(body.result.unwrap_or_default().data)
    }
}

#[async_trait]
impl PluginAdapter for NewsProvider {
    fn name(&self) -> &str {
        "news"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, TidingsError> {
        Ok(if self.is_demo() {
            HealthStatus::Degraded("no API key configured, serving demo data".into())
        } else {
            HealthStatus::Healthy
        })
    }
}

#[async_trait]
impl ToolProvider for NewsProvider {
    fn tools(&self) -> Vec<ToolSchema> {
        let categories = CATEGORIES
            .iter()
            .map(|(code, name)| format!("{code} ({name})"))
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            ToolSchema::new("get_headlines", "Fetch the latest top headlines")
                .display_name("Headlines")
                .param(self.page_size_param()),
            ToolSchema::new("get_news_by_type", "Fetch news of one category")
                .display_name("News by category")
                .param(ToolParameter::required(
                    "news_type",
                    ParamType::String,
                    &format!("News category: {categories}"),
                ))
                .param(self.page_size_param()),
            ToolSchema::new("search_news", "Search news articles by keyword")
                .display_name("News search")
                .param(ToolParameter::required("keyword", ParamType::String, "Search keyword"))
                .param(self.page_size_param()),
        ]
    }

    async fn execute(&self, tool_name: &str, params: &Map<String, Value>) -> ToolInvocationResult {
        let key = cache_key(tool_name, params);
        if let Some(hit) = self.cache.get(&key) {
            debug!(tool = tool_name, "news cache hit");
            return hit;
        }

        match self.run(tool_name, params).await {
            Ok((articles, heading)) => {
                let result = ToolInvocationResult::Success {
                    tool_name: tool_name.to_string(),
                    rendered: render_articles(&heading, &articles),
                    data: serde_json::to_value(&articles).unwrap_or(Value::Null),
                };
                self.cache.put(key, result.clone());
                result
            }
            Err(error) => {
                warn!(tool = tool_name, %error, "news request failed");
                ToolInvocationResult::failure(tool_name, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_provider() -> NewsProvider {
        NewsProvider::new(&NewsConfig::default()).unwrap()
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn schemas_expose_three_tools_with_display_names() {
        let tools = demo_provider().tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_headlines", "get_news_by_type", "search_news"]);
        assert_eq!(tools[2].label(), "News search");
        assert!(tools[1].parameters[0].required);
        assert_eq!(tools[0].parameters[0].default, Some(json!(10)));
    }

    #[test]
    fn category_names_fall_back_to_code() {
        assert_eq!(category_name("keji"), "Technology");
        assert_eq!(category_name("weather"), "weather");
    }

    #[tokio::test]
    async fn demo_mode_returns_placeholder_articles() {
        let provider = demo_provider();
        assert!(provider.is_demo());

        let result = provider
            .execute("get_headlines", &params(json!({"page_size": 2})))
            .await;
        match result {
            ToolInvocationResult::Success { data, rendered, .. } => {
                assert_eq!(data.as_array().unwrap().len(), 2);
                assert!(rendered.starts_with("## Top headlines (demo data)"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn demo_search_mentions_keyword() {
        let result = demo_provider()
            .execute("search_news", &params(json!({"keyword": "chips"})))
            .await;
        let ToolInvocationResult::Success { rendered, .. } = result else {
            panic!("expected success");
        };
        assert!(rendered.contains("Search results: chips (demo data)"));
        assert!(rendered.contains("Search result 1 for 'chips'"));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure_result() {
        let result = demo_provider().execute("get_weather", &Map::new()).await;
        assert_eq!(
            result,
            ToolInvocationResult::failure("get_weather", "unknown tool: get_weather")
        );
    }

    #[tokio::test]
    async fn missing_keyword_is_a_failure_result() {
        let result = demo_provider().execute("search_news", &Map::new()).await;
        assert!(!result.is_success());
    }

    #[test]
    fn page_size_is_clamped() {
        let provider = demo_provider();
        assert_eq!(provider.page_size(&params(json!({"page_size": 500}))), 50);
        assert_eq!(provider.page_size(&params(json!({"page_size": 0}))), 1);
        assert_eq!(provider.page_size(&Map::new()), 10);
    }

    #[tokio::test]
    async fn demo_health_is_degraded() {
        let status = demo_provider().health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded(_)));
    }
}
