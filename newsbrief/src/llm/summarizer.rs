// Summarizer module
use tracing::{info, warn};

use super::{LlmProvider, LlmRequest};
use crate::search::Article;

/// Placeholder stored when the remote model could not produce a summary
pub const FALLBACK_SUMMARY: &str = "Summary unavailable";

/// Turns one article into a short summary, never failing.
pub struct Summarizer<'a, P: LlmProvider + ?Sized> {
    provider: &'a P,
    instruction: String,
}

impl<'a, P: LlmProvider + ?Sized> Summarizer<'a, P> {
    pub fn new(provider: &'a P, instruction: impl Into<String>) -> Self {
        Self {
            provider,
            instruction: instruction.into(),
        }
    }

    /// Summarize `article` within `max_tokens`. Any failure yields [`FALLBACK_SUMMARY`].
    pub async fn summarize(&self, article: &Article, max_tokens: usize) -> String {
        let request = LlmRequest {
            prompt: build_prompt(&self.instruction, article),
            max_tokens: Some(max_tokens),
            timeout_seconds: None,
        };

        match self.provider.generate(request).await {
            Ok(response) if response.content.trim().is_empty() => {
                warn!(title = %article.title, "model returned an empty summary, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
            Ok(response) => {
                info!(
                    title = %article.title,
                    tokens = response.usage.total_tokens,
                    "article summarized"
                );
                response.content.trim().to_string()
            }
            Err(e) => {
                warn!(title = %article.title, url = %article.url, "summarization failed: {}, using fallback", e);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }
}

fn build_prompt(instruction: &str, article: &Article) -> String {
    format!(
        "{}\n\nTitle: {}\nContent: {}\nSource: {}",
        instruction.trim(),
        article.title,
        article.snippet,
        article.url
    )
}
