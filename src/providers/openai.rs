/*!
 * OpenAI-compatible chat completions client.
 *
 * Also used for LM Studio, which exposes the same API on a local server
 * and does not require an API key.
 */

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::{ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::http::{HttpTransport, RetryPolicy, normalize_endpoint};

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// Base URL, including the `/v1` prefix
    endpoint: String,
    /// API key for authentication, empty for local servers
    api_key: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum tokens to generate
    max_tokens: Option<u32>,
    /// HTTP transport with retry and rate limiting
    transport: HttpTransport,
}

/// Chat message in OpenAI format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completions request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    pub model: String,
    /// The conversation
    pub messages: Vec<OpenAIMessage>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    /// Generated message
    pub message: OpenAIMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Chat completions response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    /// Completion choices
    pub choices: Vec<OpenAIChoice>,
}

/// Model listing response
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl OpenAI {
    /// Create a new client with default transport settings
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            transport: HttpTransport::new("OpenAI", Duration::from_secs(60), RetryPolicy::default(), None)?,
        })
    }

    /// Create a new client from configuration
    pub fn from_config(
        provider: &ProviderConfig,
        common: &TranslationCommonConfig,
    ) -> Result<Self, ProviderError> {
        let retry = RetryPolicy {
            max_retries: common.retry_count,
            backoff_base_ms: common.retry_backoff_ms,
        };
        Ok(Self {
            endpoint: normalize_endpoint(&provider.endpoint)?,
            api_key: provider.api_key.clone(),
            model: provider.model.clone(),
            temperature: common.temperature,
            max_tokens: Some(provider.max_tokens),
            transport: HttpTransport::new(
                "OpenAI",
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

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    fn build_request(&self, system: &str, user: &str) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(system.to_string()),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(user.to_string()),
                },
            ],
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
        }
    }

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        self.transport
            .send_json(|client| self.authorize(client.post(&url)).json(&request))
            .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/models", self.endpoint);
        let _models: ModelList = self
            .transport
            .send_json(|client| self.authorize(client.get(&url)))
            .await?;
        Ok(())
    }

    fn extract_text(response: &OpenAIResponse) -> Result<String, ProviderError> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| ProviderError::ParseError("Response contained no choices".to_string()))?;
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(ProviderError::Truncated("finish_reason=length".to_string()));
        }
        Ok(choice.message.content.clone().unwrap_or_default())
    }
}
