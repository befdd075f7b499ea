//! Article fetching through the provider's search endpoint.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::FetchError;

/// One search hit, already translated out of the provider's response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Publication date as reported by the provider, if any
    pub date: Option<String>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            date: None,
        }
    }
}

/// Inclusive date range `[today - days_back, today]` handed to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub after: NaiveDate,
    pub before: NaiveDate,
}

impl DateWindow {
    /// A window reaching past the earliest representable date starts there.
    pub fn ending(today: NaiveDate, days_back: u32) -> Self {
        Self {
            after: today
                .checked_sub_days(Days::new(u64::from(days_back)))
                .unwrap_or(NaiveDate::MIN),
            before: today,
        }
    }

    /// Provider filter format, e.g. "10/19/2026"
    pub fn after_filter(&self) -> String {
        self.after.format("%m/%d/%Y").to_string()
    }

    pub fn before_filter(&self) -> String {
        self.before.format("%m/%d/%Y").to_string()
    }
}

/// Search capability used by the brief assembler.
#[async_trait::async_trait]
pub trait NewsSearch: Send + Sync {
    /// Return at most `max_results` articles about `topic` from the last `days_back` days,
    /// in the provider's order.
    async fn search(
        &self,
        topic: &str,
        max_results: usize,
        days_back: u32,
    ) -> Result<Vec<Article>, FetchError>;
}

/// Client for the Perplexity search endpoint (`POST {base}/search`).
pub struct PerplexitySearch {
    endpoint: String,
    api_key: String,
    query_suffix: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl PerplexitySearch {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            query_suffix: String::new(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Words appended to every topic to form the query (e.g. "today").
    pub fn with_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.query_suffix = suffix.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout = timeout_secs.map(Duration::from_secs);
        self
    }

    fn query_for(&self, topic: &str) -> String {
        let suffix = self.query_suffix.trim();
        if suffix.is_empty() {
            topic.to_string()
        } else {
            format!("{} {}", topic, suffix)
        }
    }

    /// Search using an explicit window instead of one ending today.
    pub async fn search_window(
        &self,
        topic: &str,
        max_results: usize,
        window: DateWindow,
    ) -> Result<Vec<Article>, FetchError> {
        let req_body = SearchRequest {
            query: self.query_for(topic),
            max_results,
            search_after_date_filter: window.after_filter(),
            search_before_date_filter: window.before_filter(),
        };

        info!(
            topic,
            after = %req_body.search_after_date_filter,
            before = %req_body.search_before_date_filter,
            "searching for articles"
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req_body);
        if let Some(limit) = self.timeout {
            builder = builder.timeout(limit);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::new(topic, format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(
                topic,
                format!("search API error {}: {}", status, body),
            ));
        }

        let resp_body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(topic, format!("failed to parse search response: {}", e)))?;

        let articles: Vec<Article> = resp_body
            .results
            .into_iter()
            .take(max_results)
            .map(|r| Article {
                title: r.title,
                url: r.url,
                snippet: r.snippet,
                date: r.date,
            })
            .collect();

        debug!(topic, count = articles.len(), "search returned");
        Ok(articles)
    }
}

#[async_trait::async_trait]
impl NewsSearch for PerplexitySearch {
    async fn search(
        &self,
        topic: &str,
        max_results: usize,
        days_back: u32,
    ) -> Result<Vec<Article>, FetchError> {
        let window = DateWindow::ending(Local::now().date_naive(), days_back);
        self.search_window(topic, max_results, window).await
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    max_results: usize,
    search_after_date_filter: String,
    search_before_date_filter: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_days_back() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = DateWindow::ending(today, 1);
        assert_eq!(window.after_filter(), "02/28/2026");
        assert_eq!(window.before_filter(), "03/01/2026");

        let same_day = DateWindow::ending(today, 0);
        assert_eq!(same_day.after, same_day.before);
    }

    #[test]
    fn oversized_window_clamps_instead_of_overflowing() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let window = DateWindow::ending(today, u32::MAX);
        assert_eq!(window.after, NaiveDate::MIN);
        assert_eq!(window.before, today);
    }

    #[test]
    fn query_suffix_appended() {
        let search = PerplexitySearch::new("https://example.test/", "key").with_query_suffix("today");
        assert_eq!(search.query_for("ai"), "ai today");
        assert_eq!(search.endpoint, "https://example.test/search");
    }
}
