//! External question source.
//!
//! The FAQ pipeline asks a question source for real, popular questions about
//! each topic and answers them from the corpus. When the source has nothing
//! (or is unreachable) the pipeline falls back to corpus-only generation, so
//! the trait is infallible by signature: implementations log and return an
//! empty list.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::security::{ExposeSecret, SecretString};

/// A candidate question with its popularity metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalQuestion {
    pub title: String,
    pub score: i64,
    pub view_count: u64,
    pub link: String,
}

impl ExternalQuestion {
    pub fn new(title: impl Into<String>, score: i64) -> Self {
        Self {
            title: title.into(),
            score,
            view_count: 0,
            link: String::new(),
        }
    }

    pub fn with_view_count(mut self, views: u64) -> Self {
        self.view_count = views;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }
}

/// Source of ranked candidate questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Up to `limit` questions for `query`. Empty on any failure.
    async fn search(&self, query: &str, limit: usize) -> Vec<ExternalQuestion>;
}

const STACKEXCHANGE_SEARCH_URL: &str = "https://api.stackexchange.com/2.3/search/advanced";

/// Stack Overflow questions via the StackExchange API, most-voted first.
pub struct StackOverflowSource {
    client: reqwest::Client,
    base_url: String,
    /// Optional tag every query is restricted to (e.g. `fastapi`)
    tag: Option<String>,
    api_key: Option<SecretString>,
}

impl StackOverflowSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: STACKEXCHANGE_SEARCH_URL.to_string(),
            tag: None,
            api_key: None,
        }
    }

    /// Restrict searches to one tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Use an app key for a higher request quota.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ExternalQuestion>, String> {
        let pagesize = limit.clamp(1, 100).to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("order", "desc"),
            ("sort", "votes"),
            ("site", "stackoverflow"),
            ("q", query),
            ("pagesize", pagesize.as_str()),
        ];
        if let Some(tag) = &self.tag {
            params.push(("tagged", tag.as_str()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.expose_secret()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("StackExchange API returned {}", response.status()));
        }

        let body: SearchResponse = response.json().await.map_err(|e| e.to_string())?;

        Ok(body
            .items
            .into_iter()
            .map(|item| ExternalQuestion {
                title: decode_entities(&item.title),
                score: item.score,
                view_count: item.view_count,
                link: item.link,
            })
            .collect())
    }
}

impl Default for StackOverflowSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionSource for StackOverflowSource {
    async fn search(&self, query: &str, limit: usize) -> Vec<ExternalQuestion> {
        match self.fetch(query, limit).await {
            Ok(mut questions) => {
                questions.truncate(limit);
                debug!(query, found = questions.len(), "Stack Overflow search");
                questions
            }
            Err(e) => {
                warn!(query, error = %e, "Stack Overflow search failed");
                Vec::new()
            }
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    view_count: u64,
    #[serde(default)]
    link: String,
}

/// Titles come back HTML-escaped.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("How to use &quot;Depends&quot; &amp; &lt;T&gt; in FastAPI&#39;s router?"),
            "How to use \"Depends\" & <T> in FastAPI's router?"
        );
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"items":[{"title":"Q","link":"https://stackoverflow.com/q/1"}],"has_more":false}"#,
        )
        .unwrap();
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].score, 0);
    }

    #[tokio::test]
    async fn test_unreachable_source_returns_empty() {
        let source = StackOverflowSource::new().with_base_url("http://127.0.0.1:9/search");
        let results = source.search("dependencies", 5).await;
        assert!(results.is_empty());
    }
}
