use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use crate::error::SummarizeError;

/// Remote LLM provider using an OpenAI-compatible chat-completions API
pub struct RemoteLlmProvider {
    endpoint: String,
    api_key: String,
    model: String,
    default_timeout: Option<Duration>,
    client: reqwest::Client,
}

impl RemoteLlmProvider {
    /// `endpoint` is the full chat-completions URL.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Provider rooted at an API base such as "https://api.perplexity.ai".
    pub fn from_base_url(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self::new(endpoint, api_key, model)
    }

    /// Timeout applied when a request does not carry its own.
    pub fn with_default_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.default_timeout = timeout_secs.map(Duration::from_secs);
        self
    }
}

#[async_trait::async_trait]
impl LlmProvider for RemoteLlmProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, SummarizeError> {
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs)
            .or(self.default_timeout);

        let req_body = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
        };

        let send = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send();

        let response = match timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| SummarizeError::Timeout)??,
            None => send.await?,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api { status, body });
        }

        let body_text = match timeout {
            Some(limit) => tokio::time::timeout(limit, response.text())
                .await
                .map_err(|_| SummarizeError::Timeout)??,
            None => response.text().await?,
        };

        let resp_body: OpenAiResponse = serde_json::from_str(&body_text)
            .map_err(|e| SummarizeError::Malformed(e.to_string()))?;

        let choice = resp_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummarizeError::Malformed("response has no choices".into()))?;

        let content = choice.message.content.trim().to_string();
        if content.is_empty() {
            return Err(SummarizeError::EmptyCompletion);
        }

        let usage = resp_body
            .usage
            .map(|u| UsageMetadata {
                prompt_tokens: u.prompt_tokens.unwrap_or(0),
                completion_tokens: u.completion_tokens.unwrap_or(0),
                total_tokens: u.total_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            usage,
            model: resp_body.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}
