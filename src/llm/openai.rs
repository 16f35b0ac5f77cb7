//! OpenAI chat-completions client.

use super::{CompletionChoice, CompletionClient};
use crate::TranscriptMessage;
use crate::error::{CompletionError, Result};

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        transcript: &[TranscriptMessage],
    ) -> Result<Vec<CompletionChoice>> {
        // The transcript serializes directly to the wire shape
        // [{"role": "...", "content": "..."}]. An empty transcript is sent
        // as-is; no empty-guard is applied.
        let body = serde_json::json!({
            "model": model,
            "messages": transcript,
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::Transport)?;

        let status = response.status();
        let response_text = response.text().await.map_err(CompletionError::Transport)?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: response_text,
            }
            .into());
        }

        let response_body: serde_json::Value =
            serde_json::from_str(&response_text).map_err(|error| {
                CompletionError::InvalidResponse(format!(
                    "response ({status}) is not valid JSON: {error}"
                ))
            })?;

        Ok(parse_choices(&response_body))
    }
}

/// Extract candidate texts from a chat-completions response body, in order.
///
/// Choices without message content are skipped, which matches concatenating
/// them as empty strings downstream.
fn parse_choices(body: &serde_json::Value) -> Vec<CompletionChoice> {
    body["choices"]
        .as_array()
        .map(|choices| {
            choices
                .iter()
                .filter_map(|choice| choice["message"]["content"].as_str())
                .map(|text| CompletionChoice { text: text.to_string() })
                .collect()
        })
        .unwrap_or_default()
}
