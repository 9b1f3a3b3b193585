//! Remote language-model reply delegate.
//!
//! Talks to an OpenAI-style chat-completions endpoint. Failures here are
//! never fatal: the orchestrator substitutes a canned stalling line whenever
//! this adapter errors or times out.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{InboundMessage, ReplyError, ReplyStrategy};

/// Persona instruction for the bait character.
const SYSTEM_PROMPT: &str = "You are an easily confused person replying to a suspicious \
caller over chat. Keep answers to one or two short sentences, never share real personal \
or payment details, ask small clarifying questions, and keep the other side talking.";

/// Configuration for the chat-completions delegate.
#[derive(Debug, Clone)]
pub struct LlmReplyConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model identifier.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl LlmReplyConfig {
    /// Creates a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Chat-completions implementation of the reply strategy.
pub struct LlmReplyStrategy {
    config: LlmReplyConfig,
    client: Client,
}

impl LlmReplyStrategy {
    /// Creates a new delegate with the given configuration.
    pub fn new(config: LlmReplyConfig) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReplyError::unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Maps the conversation onto chat roles: whatever the correspondent
    /// sent is "user", our own prior utterances are "assistant".
    fn to_chat_messages(
        current: &InboundMessage,
        history: &[InboundMessage],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];

        for msg in history {
            let role = if msg.sender == current.sender {
                "user"
            } else {
                "assistant"
            };
            messages.push(ChatMessage {
                role: role.to_string(),
                content: msg.text.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: current.text.clone(),
        });
        messages
    }
}

#[async_trait]
impl ReplyStrategy for LlmReplyStrategy {
    async fn compose(
        &self,
        current: &InboundMessage,
        history: &[InboundMessage],
    ) -> Result<String, ReplyError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: Self::to_chat_messages(current, history),
            max_tokens: 120,
            temperature: 0.9,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReplyError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    ReplyError::unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::unavailable(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReplyError::malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        let reply = content.trim().to_string();
        if reply.is_empty() {
            return Err(ReplyError::malformed("empty completion"));
        }
        Ok(reply)
    }
}

impl std::fmt::Debug for LlmReplyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmReplyStrategy")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
