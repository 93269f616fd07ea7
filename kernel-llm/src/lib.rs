//! LLM service: a stateless chat-completion client, per spec.md §4.5.
//!
//! Grounded on `caliber-llm`'s provider-trait idiom (`EmbeddingProvider`/
//! `SummarizationProvider`: an `#[async_trait]` trait over `Send + Sync`,
//! a concrete `reqwest`-backed implementation, a mock for tests) but
//! trimmed to the spec's much smaller surface — no routing strategy, no
//! circuit breaker, no provider registry. `LlmClient` is the one
//! concrete implementation this crate ships; `LlmProvider` exists purely
//! so call sites can substitute a mock, matching the teacher's habit of
//! trait-based substitutability even for a single production client.

use async_trait::async_trait;
use kernel_core::{KernelError, KernelResult, LlmError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: "user".to_string(), content: content.into() }
    }
}

/// Hot-reconfigurable connection settings. Changing these affects only
/// calls started after the change; in-flight calls keep the settings they
/// started with (spec.md §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> KernelResult<ChatMessage>;
}

/// `reqwest`-backed chat-completion client over an OpenAI-compatible
/// `/chat/completions` endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    settings: RwLock<Arc<LlmSettings>>,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self { http: reqwest::Client::new(), settings: RwLock::new(Arc::new(settings)) }
    }

    /// Settings changes take effect for calls started after this returns;
    /// a call already in flight keeps the `Arc<LlmSettings>` it captured
    /// at invocation time.
    pub async fn reconfigure(&self, settings: LlmSettings) {
        *self.settings.write().await = Arc::new(settings);
    }

    async fn current_settings(&self) -> Arc<LlmSettings> {
        self.settings.read().await.clone()
    }
}

#[async_trait]
impl LlmProvider for LlmClient {
    async fn chat(&self, messages: &[ChatMessage]) -> KernelResult<ChatMessage> {
        let settings = self.current_settings().await;
        let endpoint = settings.base_url.clone();

        let body = ChatCompletionRequest {
            model: settings.model.clone(),
            temperature: settings.temperature,
            messages: messages.to_vec(),
        };

        let response = tokio::time::timeout(settings.timeout, self.http.post(&endpoint).json(&body).send())
            .await
            .map_err(|_| KernelError::from(LlmError::TimedOut { endpoint: endpoint.clone(), timeout_seconds: settings.timeout.as_secs() }))?
            .map_err(|e| KernelError::from(LlmError::RequestFailed { endpoint: endpoint.clone(), status: 0, message: e.to_string() }))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KernelError::from(LlmError::RequestFailed { endpoint, status: status.as_u16(), message }));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| KernelError::from(LlmError::InvalidResponse { endpoint: endpoint.clone(), reason: e.to_string() }))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| KernelError::from(LlmError::InvalidResponse { endpoint, reason: "empty choices array".to_string() }))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Deterministic stand-in for tests and offline rule development; never
/// makes a network call.
pub struct MockLlmProvider {
    pub fixed_reply: String,
}

impl MockLlmProvider {
    pub fn new(fixed_reply: impl Into<String>) -> Self {
        Self { fixed_reply: fixed_reply.into() }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(&self, _messages: &[ChatMessage]) -> KernelResult<ChatMessage> {
        Ok(ChatMessage::system(self.fixed_reply.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_echoes_fixed_reply() {
        let provider = MockLlmProvider::new("pong");
        let reply = provider.chat(&[ChatMessage::user("ping")]).await.unwrap();
        assert_eq!(reply.content, "pong");
    }

    #[tokio::test]
    async fn reconfigure_changes_subsequent_settings() {
        let client = LlmClient::new(LlmSettings {
            base_url: "http://localhost:1/a".to_string(),
            model: "m1".to_string(),
            temperature: 0.0,
            timeout: Duration::from_millis(10),
        });
        client
            .reconfigure(LlmSettings {
                base_url: "http://localhost:1/b".to_string(),
                model: "m2".to_string(),
                temperature: 0.5,
                timeout: Duration::from_millis(10),
            })
            .await;
        let settings = client.current_settings().await;
        assert_eq!(settings.model, "m2");
    }
}
