//! Chat client for OpenAI-compatible completion APIs
//!
//! The loop talks to the model through the [`ModelClient`] trait so tests can
//! script responses. The concrete client targets any OpenAI-compatible
//! `/chat/completions` endpoint (OpenRouter, vLLM, llama.cpp server, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message role in a chat conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the model-facing conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token accounting for one model call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// One complete model response: text plus metering info
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub content: String,
    pub usage: Usage,
}

/// Error type for chat operations
#[derive(Debug)]
pub enum ChatError {
    Request(reqwest::Error),
    Parse(serde_json::Error),
    Api { status: u16, body: String },
    EmptyResponse,
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::Request(e) => write!(f, "Request error: {}", e),
            ChatError::Parse(e) => write!(f, "Parse error: {}", e),
            ChatError::Api { status, body } => write!(f, "API error {}: {}", status, body),
            ChatError::EmptyResponse => write!(f, "Empty response from model"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Request(e)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Parse(e)
    }
}

/// The model-call collaborator: one blocking (from the loop's view) chat
/// completion per call. Errors are fatal to the run; any retry policy lives
/// behind this trait, not in the loop.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn chat(&self, history: &[Message]) -> Result<ChatTurn, ChatError>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Clone)]
pub struct OpenAiChatClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    /// Create a new chat client
    ///
    /// # Arguments
    /// * `base_url` - API base (e.g., "https://openrouter.ai/api/v1")
    /// * `api_key` - Bearer token for the API
    /// * `model` - Model identifier (e.g., "openai/gpt-4.1-nano")
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 2048,
            temperature: 0.7,
            client: reqwest::Client::new(),
        }
    }

    /// Override the completion token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The model this client is configured for
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for OpenAiChatClient {
    async fn chat(&self, history: &[Message]) -> Result<ChatTurn, ChatError> {
        let endpoint = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": history,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let completion: CompletionResponse = serde_json::from_str(&text)?;
        let choice = completion.choices.into_iter().next().ok_or(ChatError::EmptyResponse)?;
        let content = choice.message.content.ok_or(ChatError::EmptyResponse)?;

        Ok(ChatTurn {
            content,
            usage: completion.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"test message\""));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::System, Role::User, Role::Assistant] {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(role, back);
        }
    }

    #[test]
    fn test_completion_response_parse() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(parsed.usage.total_tokens, 12);
    }

    #[test]
    fn test_completion_response_missing_usage_defaults() {
        let raw = r#"{"choices": [{"message": {"content": "x"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.usage, Usage::default());
    }

    #[test]
    fn test_client_builder_overrides() {
        let client = OpenAiChatClient::new("http://localhost", "key", "test-model")
            .with_max_tokens(512)
            .with_temperature(0.0);
        assert_eq!(client.model(), "test-model");
        assert_eq!(client.max_tokens, 512);
        assert_eq!(client.temperature, 0.0);
    }
}
