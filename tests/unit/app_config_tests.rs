/*!
 * Tests for application configuration functionality
 */

use tagguard::app_config::{Config, LogLevel, Task, TranslationProvider};
use tagguard::translation::prompts::TermStrictness;

use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.repair.budget, 2);
    assert!(config.repair.auto_repair);
    assert_eq!(config.log_level, LogLevel::Info);

    let ollama_config = config
        .translation
        .get_provider_config(&TranslationProvider::Ollama)
        .expect("Ollama provider config should exist");
    assert_eq!(ollama_config.concurrent_requests, 4);
    assert_eq!(ollama_config.model, "llama3");
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let loaded = Config::load_or_create(&path).unwrap();
    assert_eq!(loaded.target_language, created.target_language);
    assert_eq!(loaded.repair, created.repair);
}

#[test]
fn test_fromFile_withPartialConfig_shouldFillDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "de-CH",
            "translation": {"provider": "ollama"},
            "profile": {"formality": "formal", "terminology": {"strictness": "strict"}}
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.target_language, "de-CH");
    assert_eq!(config.repair.budget, 2);
    assert_eq!(config.profile.formality, "formal");
    assert_eq!(config.profile.terminology.strictness, TermStrictness::Strict);
    assert!(config.validate().is_ok());
}

#[test]
fn test_providerFor_withTaskMapping_shouldUseMappedProvider() {
    let mut config = Config::default();
    config.task_mappings.repair = Some(TranslationProvider::OpenAI);

    assert_eq!(config.provider_for(Task::Translation), TranslationProvider::Ollama);
    assert_eq!(config.provider_for(Task::Repair), TranslationProvider::OpenAI);
}

#[test]
fn test_validate_withKeylessRemoteProvider_shouldFailUntilKeySet() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    assert!(config.validate().is_err());

    config
        .translation
        .provider_config_mut(&TranslationProvider::Anthropic)
        .api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "xyz".to_string();
    assert!(config.validate().is_err());
}
