use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::translation::prompts::StyleProfile;
use crate::validation::ValidationConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language tag (BCP-47)
    pub source_language: String,

    /// Target language tag (BCP-47)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Provider used per task
    #[serde(default)]
    pub task_mappings: TaskMappings,

    /// Repair loop settings
    #[serde(default)]
    pub repair: RepairConfig,

    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Style profile applied to every prompt
    #[serde(default)]
    pub profile: StyleProfile,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether the provider needs an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: HTTP timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,

    // @field: Maximum tokens to generate per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        let (model, endpoint, timeout_secs, rate_limit) = match provider_type {
            TranslationProvider::Ollama => (
                default_ollama_model(),
                default_ollama_endpoint(),
                default_timeout_secs(),
                None,
            ),
            TranslationProvider::OpenAI => (
                default_openai_model(),
                default_openai_endpoint(),
                default_timeout_secs(),
                Some(60),
            ),
            TranslationProvider::Anthropic => (
                default_anthropic_model(),
                default_anthropic_endpoint(),
                default_anthropic_timeout_secs(),
                // Slightly below the 50 requests per minute API limit
                Some(45),
            ),
            TranslationProvider::LMStudio => (
                default_lmstudio_model(),
                default_lmstudio_endpoint(),
                default_timeout_secs(),
                None,
            ),
        };

        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            concurrent_requests: default_concurrent_requests(),
            timeout_secs,
            rate_limit,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Deadline for a single generation, retries included
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// Pipeline task a provider can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Translation,
    Repair,
}

/// Provider override per task; unset tasks use `translation.provider`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TaskMappings {
    /// Provider for whole-segment and chunk translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationProvider>,

    /// Provider for token repair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<TranslationProvider>,
}

/// Repair loop configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepairConfig {
    /// Maximum repair requests per unit
    #[serde(default = "default_repair_budget")]
    pub budget: u32,

    /// Run repair automatically on units that fail translation
    #[serde(default = "default_true")]
    pub auto_repair: bool,

    /// Temperature used for repair requests
    #[serde(default = "default_repair_temperature")]
    pub temperature: f32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            budget: default_repair_budget(),
            auto_repair: true,
            temperature: default_repair_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_generation_timeout_secs() -> u64 {
    180
}

fn default_repair_budget() -> u32 {
    2
}

fn default_repair_temperature() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)
            .with_context(|| format!("Invalid source language '{}'", self.source_language))?;
        crate::language_utils::validate_language_code(&self.target_language)
            .with_context(|| format!("Invalid target language '{}'", self.target_language))?;

        for task in [Task::Translation, Task::Repair] {
            let provider = self.provider_for(task);
            let provider_config = self.translation.resolved_provider_config(&provider);
            if provider.requires_api_key() && provider_config.api_key.is_empty() {
                return Err(anyhow!(
                    "API key is required for {} provider ({:?} task)",
                    provider.display_name(),
                    task
                ));
            }
        }

        self.validation.validate().map_err(|e| anyhow!(e))?;
        Ok(())
    }

    /// Provider used for a task
    pub fn provider_for(&self, task: Task) -> TranslationProvider {
        let mapped = match task {
            Task::Translation => self.task_mappings.translation.as_ref(),
            Task::Repair => self.task_mappings.repair.as_ref(),
        };
        mapped.cloned().unwrap_or_else(|| self.translation.provider.clone())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Load the config file, writing a default one first if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found: {}. Creating default configuration.", path.display());
        let config = Self::default();
        config.save(path)?;
        info!("Default configuration written to {}", path.display());
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            task_mappings: TaskMappings::default(),
            repair: RepairConfig::default(),
            validation: ValidationConfig::default(),
            profile: StyleProfile::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Max concurrent requests for the active provider
    pub fn optimal_concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|p| p.concurrent_requests.max(1))
            .unwrap_or_else(default_concurrent_requests)
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Configuration for a provider, with empty fields filled from its defaults
    pub fn resolved_provider_config(&self, provider_type: &TranslationProvider) -> ProviderConfig {
        let defaults = ProviderConfig::new(provider_type.clone());
        let Some(configured) = self.get_provider_config(provider_type) else {
            return defaults;
        };

        let mut resolved = configured.clone();
        if resolved.endpoint.is_empty() {
            resolved.endpoint = defaults.endpoint;
        }
        if resolved.model.is_empty() {
            resolved.model = defaults.model;
        }
        resolved
    }

    /// Mutable access to a provider configuration, creating it with defaults if absent
    pub fn provider_config_mut(&mut self, provider_type: &TranslationProvider) -> &mut ProviderConfig {
        let provider_str = provider_type.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(provider_type.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
