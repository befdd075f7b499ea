use chrono::{DateTime, Local};
use common::Config;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::llm::summarizer::Summarizer;
use crate::llm::LlmProvider;
use crate::search::{Article, NewsSearch};

/// An article together with its summary (real or fallback).
#[derive(Debug, Clone, PartialEq)]
pub struct BriefItem {
    pub article: Article,
    pub summary: String,
}

/// All items gathered for one configured topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSection {
    pub topic: String,
    pub items: Vec<BriefItem>,
    /// Set when the search for this topic failed
    pub fetch_error: Option<String>,
}

/// Result of one pipeline run. Topic order follows the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Brief {
    pub generated_at: DateTime<Local>,
    pub topics: Vec<TopicSection>,
}

impl Brief {
    pub fn article_count(&self) -> usize {
        self.topics.iter().map(|t| t.items.len()).sum()
    }

    pub fn failed_topics(&self) -> impl Iterator<Item = &TopicSection> {
        self.topics.iter().filter(|t| t.fetch_error.is_some())
    }
}

/// Drives the fetch → summarize loop over every configured topic.
pub struct BriefAssembler<'a, S: NewsSearch + ?Sized, P: LlmProvider + ?Sized> {
    search: &'a S,
    llm: &'a P,
}

impl<'a, S: NewsSearch + ?Sized, P: LlmProvider + ?Sized> BriefAssembler<'a, S, P> {
    pub fn new(search: &'a S, llm: &'a P) -> Self {
        Self { search, llm }
    }

    /// Build a brief stamped with the current local time.
    pub async fn build(&self, config: &Config) -> Brief {
        self.build_at(config, Local::now()).await
    }

    /// Topics and articles are processed strictly in order, one call at a time.
    pub async fn build_at(&self, config: &Config, generated_at: DateTime<Local>) -> Brief {
        let summarizer = Summarizer::new(self.llm, config.summary_prompt.clone());
        let mut topics = Vec::with_capacity(config.topics.len());

        for topic in &config.topics {
            info!(topic = %topic, "processing topic");

            let articles = match self
                .search
                .search(topic, config.articles_per_topic, config.days_back)
                .await
            {
                Ok(articles) => articles,
                Err(e) => {
                    warn!(topic = %topic, "{}", e);
                    topics.push(TopicSection {
                        topic: topic.clone(),
                        items: Vec::new(),
                        fetch_error: Some(e.cause),
                    });
                    continue;
                }
            };

            if articles.is_empty() {
                warn!(topic = %topic, "no articles found");
            } else if articles.len() < config.articles_per_topic {
                info!(
                    topic = %topic,
                    "found {} articles (requested {})",
                    articles.len(),
                    config.articles_per_topic
                );
            }

            let unique = dedup_by_url(articles);

            let mut items = Vec::with_capacity(unique.len());
            for article in unique {
                let summary = summarizer.summarize(&article, config.max_tokens).await;
                items.push(BriefItem { article, summary });
            }

            info!(topic = %topic, "processed {} article(s)", items.len());
            topics.push(TopicSection {
                topic: topic.clone(),
                items,
                fetch_error: None,
            });
        }

        Brief {
            generated_at,
            topics,
        }
    }
}

/// Keep the first occurrence of each URL, preserving order.
fn dedup_by_url(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let mut seen = HashSet::new();
    let unique: Vec<Article> = articles
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect();

    if unique.len() < before {
        info!("removed {} duplicate article(s)", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let articles = vec![
            Article::new("a", "https://x/1", ""),
            Article::new("b", "https://x/2", ""),
            Article::new("a again", "https://x/1", ""),
            Article::new("c", "https://x/3", ""),
        ];
        let titles: Vec<String> = dedup_by_url(articles).into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }
}
