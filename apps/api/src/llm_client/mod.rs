//! LLM Client: the single point of entry for text-generation calls in Itinera.
//!
//! No other module talks to the provider directly; everything goes through
//! the `TextGenerator` trait so the orchestration can be exercised with fakes.
//!
//! Exactly one HTTP attempt per call. Callers decide whether to retry.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// What the provider handed back, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCompletion {
    /// The usual case: message content as text.
    Text(String),
    /// Content the provider already decoded into JSON.
    Structured(Value),
    /// No choices, or null content.
    Empty,
}

/// Anything that can turn a prompt into a completion.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<RawCompletion, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl ChatResponse {
    fn into_completion(self) -> RawCompletion {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        match content {
            None | Some(Value::Null) => RawCompletion::Empty,
            Some(Value::String(text)) => RawCompletion::Text(text),
            Some(Value::Array(parts)) if parts.iter().any(is_text_part) => {
                RawCompletion::Text(join_text_parts(&parts))
            }
            Some(other) => RawCompletion::Structured(other),
        }
    }
}

/// `{"type": "text", "text": "..."}`, as used by array-style message content.
fn is_text_part(part: &Value) -> bool {
    part.get("type").and_then(Value::as_str) == Some("text")
        && part.get("text").map_or(false, Value::is_string)
}

fn join_text_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter(|part| is_text_part(part))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<RawCompletion, LlmError> {
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat.into_completion())
    }
}

/// Pulls `error.message` out of a provider error body, falling back to the body itself.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<ProviderError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> RawCompletion {
        serde_json::from_value::<ChatResponse>(body)
            .unwrap()
            .into_completion()
    }

    #[test]
    fn test_text_content() {
        let completion = parse(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"summary\":\"x\"}"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }));
        assert_eq!(completion, RawCompletion::Text("{\"summary\":\"x\"}".to_string()));
    }

    #[test]
    fn test_structured_content() {
        let completion = parse(json!({
            "choices": [{"message": {"content": {"summary": "x"}}}]
        }));
        assert_eq!(completion, RawCompletion::Structured(json!({"summary": "x"})));
    }

    #[test]
    fn test_content_parts_are_joined_as_text() {
        let completion = parse(json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "{\"summary\":"},
                {"type": "image_url", "image_url": {"url": "https://x"}},
                {"type": "text", "text": "\"x\"}"}
            ]}}]
        }));
        assert_eq!(completion, RawCompletion::Text("{\"summary\":\"x\"}".to_string()));
    }

    #[test]
    fn test_array_without_text_parts_stays_structured() {
        let completion = parse(json!({"choices": [{"message": {"content": [1, 2]}}]}));
        assert_eq!(completion, RawCompletion::Structured(json!([1, 2])));
    }

    #[test]
    fn test_null_content_and_no_choices_are_empty() {
        assert_eq!(
            parse(json!({"choices": [{"message": {"content": null}}]})),
            RawCompletion::Empty
        );
        assert_eq!(parse(json!({"choices": []})), RawCompletion::Empty);
    }

    #[test]
    fn test_provider_message_extracts_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(provider_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_provider_message_falls_back_to_body() {
        assert_eq!(provider_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn test_request_omits_unset_temperature() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
