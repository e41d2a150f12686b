//! OpenRouter chat-completions client.
//!
//! One request per analysis: the prompt goes up as a single user message with
//! temperature pinned to zero, the raw completion text comes back. No retry,
//! no streaming; the transport timeout is the only hang protection.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::settings::Config;

/// Upper bound on the single upstream call; a hang here would hang the request
const COMPLETIONS_TIMEOUT: Duration = Duration::from_secs(60);

/// Application identifier sent in the X-Title header
const APP_TITLE: &str = "TermsCheck - AI Terms Analyzer";

#[derive(Debug, Error)]
pub enum AiClientError {
    #[error("OPENROUTER_API_KEY not set")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OpenRouter API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Chat message in the completions request
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenRouter chat-completions request format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Completions envelope; only the first choice's text is used
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error body OpenRouter returns on non-success statuses
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// OpenRouter API client, read-only after construction
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    site_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(COMPLETIONS_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.api_base.clone(),
            api_key: config.api_key.clone(),
            site_url: config.site_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Send one completion request and return the model's raw text.
    ///
    /// Non-success statuses become [`AiClientError::Api`] with whatever error
    /// message the upstream body carried ("Unknown error" when it carried
    /// none). A success with no choices returns the empty string.
    pub async fn complete(&self, prompt: &str) -> Result<String, AiClientError> {
        let api_key = self.api_key.as_deref().ok_or(AiClientError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", APP_TITLE)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let detail: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let message = detail
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(AiClientError::Api { status, message });
        }

        let envelope: ChatResponse = response.json().await?;
        Ok(envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
