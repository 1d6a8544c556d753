use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{ChatMessage, ChatRole};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// Used only to turn the locally computed lead analysis into prose.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl CompletionClient {
    /// Creates a new `CompletionClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API, e.g. `https://api.openai.com/v1`.
    /// * `api_key` - Bearer credential; requests fail with `Unauthorized` while it is `None`.
    /// * `model` - Model identifier sent with every request.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create completion client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.completion_base_url.clone(),
            config.completion_api_key.clone(),
            config.completion_model.clone(),
            Duration::from_secs(config.completion_timeout_secs),
        )
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the instruction, the prior conversation and the new message.
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The generated text of the first choice.
    pub async fn complete(
        &self,
        instruction: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Unauthorized("Completion API key is not configured".to_string())
        })?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(ChatRole::System, instruction));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::new(ChatRole::User, message));

        let url = format!("{}/chat/completions", self.base_url);
        tracing::info!(
            "Requesting completion ({} messages) from {}",
            messages.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "temperature": 0.7,
            }))
            .send()
            .await
            .map_err(AppError::from)
            .context("Completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Completion API returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Completion API returned {}: {}",
                status, error_text
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(AppError::from)
            .context("Failed to read completion response")?;
        let body: CompletionResponse = serde_json::from_str(&raw)
            .map_err(AppError::from)
            .context("Failed to parse completion response")?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AppError::ExternalApiError("Completion response had no content".to_string())
            })
    }
}
