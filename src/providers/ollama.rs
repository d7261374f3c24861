/*!
 * Ollama chat client.
 */

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::{ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::http::{HttpTransport, RetryPolicy, normalize_endpoint};

/// Ollama client for interacting with the Ollama chat API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model name to use for generation
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum tokens to generate
    num_predict: Option<u32>,
    /// HTTP transport with retry and rate limiting
    transport: HttpTransport,
}

/// Chat message in Ollama format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to predict
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    pub model: String,
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Whether to stream the response
    pub stream: bool,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

/// Chat response from the Ollama API
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Generated message
    pub message: ChatMessage,
    /// Whether generation finished
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// Version response from the Ollama API
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

impl Ollama {
    /// Create a new Ollama client with default transport settings
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: normalize_endpoint(endpoint)?,
            model: model.into(),
            temperature: 0.3,
            num_predict: None,
            transport: HttpTransport::new("Ollama", Duration::from_secs(120), RetryPolicy::default(), None)?,
        })
    }

    /// Create a new Ollama client from configuration
    pub fn from_config(
        provider: &ProviderConfig,
        common: &TranslationCommonConfig,
    ) -> Result<Self, ProviderError> {
        let retry = RetryPolicy {
            max_retries: common.retry_count,
            backoff_base_ms: common.retry_backoff_ms,
        };
        Ok(Self {
            base_url: normalize_endpoint(&provider.endpoint)?,
            model: provider.model.clone(),
            temperature: common.temperature,
            num_predict: Some(provider.max_tokens),
            transport: HttpTransport::new(
                "Ollama",
                Duration::from_secs(provider.timeout_secs),
                retry,
                provider.rate_limit,
            )?,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    fn build_request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            stream: false,
            options: Some(ChatOptions {
                temperature: Some(self.temperature),
                num_predict: self.num_predict,
            }),
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        self.transport
            .send_json(|client| client.post(&url).json(&request))
            .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let _version: VersionResponse = self.transport.send_json(|client| client.get(&url)).await?;
        Ok(())
    }

    fn extract_text(response: &ChatResponse) -> Result<String, ProviderError> {
        if !response.done || response.done_reason.as_deref() == Some("length") {
            return Err(ProviderError::Truncated(format!(
                "Ollama stopped before completion ({})",
                response.done_reason.as_deref().unwrap_or("not done")
            )));
        }
        Ok(response.message.content.clone())
    }
}
