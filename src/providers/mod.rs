/*!
 * Provider implementations for text generation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API and compatible servers (LM Studio)
 * - Anthropic: Anthropic API integration
 *
 * The translation core only sees the [`TextGenerator`] capability; every
 * HTTP provider gets it through the blanket implementation over
 * [`Provider`].
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod http;
pub mod mock;
pub mod ollama;
pub mod openai;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind [`TextGenerator`].
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Build a request from a system directive and a user message
    fn build_request(&self, system: &str, user: &str) -> Self::Request;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    ///
    /// Fails with [`ProviderError::Truncated`] when the provider reports
    /// that generation stopped early.
    fn extract_text(response: &Self::Response) -> Result<String, ProviderError>;
}

/// The text generation capability consumed by the translation core
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a system directive and a user message
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

#[async_trait]
impl<P> TextGenerator for P
where
    P: Provider,
{
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = self.build_request(system, user);
        let response = self.complete(request).await?;
        P::extract_text(&response)
    }
}

/// Run a generation under a deadline
///
/// An elapsed deadline is reported as [`ProviderError::Timeout`] so callers
/// handle it like any other failed response.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    system: &str,
    user: &str,
    timeout: Duration,
) -> Result<String, ProviderError> {
    match tokio::time::timeout(timeout, generator.generate(system, user)).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Generation exceeded {:?}", timeout);
            Err(ProviderError::Timeout(timeout))
        }
    }
}

/// Build the generator configured for a provider
pub fn build_generator(
    provider: &TranslationProvider,
    config: &TranslationConfig,
) -> Result<Arc<dyn TextGenerator>> {
    let provider_config = &config.resolved_provider_config(provider);
    let common = &config.common;

    let generator: Arc<dyn TextGenerator> = match provider {
        TranslationProvider::Ollama => Arc::new(ollama::Ollama::from_config(provider_config, common)?),
        TranslationProvider::OpenAI | TranslationProvider::LMStudio => {
            Arc::new(openai::OpenAI::from_config(provider_config, common)?)
        }
        TranslationProvider::Anthropic => {
            Arc::new(anthropic::Anthropic::from_config(provider_config, common)?)
        }
    };

    debug!(
        "Built {} generator with model {}",
        provider.display_name(),
        provider_config.model
    );
    Ok(generator)
}
