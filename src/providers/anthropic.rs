use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::{ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::http::{HttpTransport, RetryPolicy, normalize_endpoint};

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic client for interacting with the Messages API
#[derive(Debug)]
pub struct Anthropic {
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum number of tokens to generate
    max_tokens: u32,
    /// HTTP transport with retry and rate limiting
    transport: HttpTransport,
}

/// Anthropic message request
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Anthropic response
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Why generation stopped
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl Anthropic {
    /// Create a new Anthropic client with default transport settings
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key: api_key.into(),
            endpoint: normalize_endpoint(endpoint)?,
            model: model.into(),
            temperature: 0.3,
            max_tokens: 4096,
            transport: HttpTransport::new("Anthropic", Duration::from_secs(120), RetryPolicy::default(), None)?,
        })
    }

    /// Create a new Anthropic client from configuration
    pub fn from_config(
        provider: &ProviderConfig,
        common: &TranslationCommonConfig,
    ) -> Result<Self, ProviderError> {
        let retry = RetryPolicy {
            max_retries: common.retry_count,
            backoff_base_ms: common.retry_backoff_ms,
        };
        Ok(Self {
            api_key: provider.api_key.clone(),
            endpoint: normalize_endpoint(&provider.endpoint)?,
            model: provider.model.clone(),
            temperature: common.temperature,
            max_tokens: provider.max_tokens,
            transport: HttpTransport::new(
                "Anthropic",
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
}

#[async_trait]
impl Provider for Anthropic {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    fn build_request(&self, system: &str, user: &str) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            system: (!system.is_empty()).then(|| system.to_string()),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
        }
    }

    async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.endpoint);
        self.transport
            .send_json(|client| {
                client
                    .post(&url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&request)
            })
            .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let mut request = self.build_request("", "Hello");
        request.max_tokens = 10;
        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &AnthropicResponse) -> Result<String, ProviderError> {
        if response.stop_reason.as_deref() == Some("max_tokens") {
            return Err(ProviderError::Truncated("stop_reason=max_tokens".to_string()));
        }
        Ok(response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect())
    }
}
