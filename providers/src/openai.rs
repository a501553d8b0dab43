use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    ApiConfig, ProviderError, api_client, handle_response,
    retry::send_with_retry,
};

/// Token accounting reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ApiUsage {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// First choice of a Chat Completions response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: ApiUsage,
    pub finish_reason: Option<String>,
}

// Wire shapes. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_request_body(config: &ApiConfig, prompt: &str) -> Value {
    json!({
        "model": config.model().as_str(),
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "max_tokens": config.max_tokens(),
        "temperature": config.temperature(),
    })
}

fn into_completion(response: ChatResponse) -> Result<Completion, ProviderError> {
    let usage = response.usage.unwrap_or_default();
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(ProviderError::EmptyCompletion {
            finish_reason: "no choices".to_string(),
        });
    };

    let content = choice
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty());
    let Some(content) = content else {
        return Err(ProviderError::EmptyCompletion {
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
        });
    };

    Ok(Completion {
        content,
        usage,
        finish_reason: choice.finish_reason,
    })
}

/// Chat Completions client bound to one [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ProviderError> {
        let http = api_client(config.base_url(), config.timeout())?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Send `prompt` as a single user message and return the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url());
        let auth_header = format!("Bearer {}", self.config.api_key());
        let body = build_request_body(&self.config, prompt);

        let outcome = send_with_retry(
            || {
                self.http
                    .post(&url)
                    .header("Authorization", &auth_header)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            Some(self.config.timeout()),
            self.config.retry(),
        )
        .await;

        let response = handle_response(outcome).await?;
        let parsed: ChatResponse = response.json().await.map_err(ProviderError::Decode)?;
        let completion = into_completion(parsed)?;

        if completion.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                model = %self.config.model(),
                max_tokens = self.config.max_tokens(),
                "Completion truncated by max_tokens"
            );
        }
        tracing::debug!(
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "Chat completion finished"
        );

        Ok(completion)
    }
}
