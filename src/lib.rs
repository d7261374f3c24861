/*!
 * # tagguard - token-safe AI translation for XLIFF segments
 *
 * A Rust library that lets an untrusted text generation service translate
 * segments carrying inline XLIFF markup while keeping every marker intact.
 *
 * ## Features
 *
 * - Abstraction of inline markup (`<bpt>`, `<ept>`, `<ph>`, `<it>`, `<g>`,
 *   `<x/>`, `<bx/>`, `<ex/>`, `<mrk>`) into numbered `{k}` tokens
 * - Token multiset validation with soft length and ordering warnings
 * - Whole-segment translation with a chunk-isolated fallback
 * - Bounded repair loop that fixes token placement without retranslating
 * - Byte-exact restoration of the original markers
 * - Providers:
 *   - Ollama (local LLM)
 *   - OpenAI API and compatible servers (LM Studio)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `markup`: Abstraction and restoration of inline markup
 * - `validation`: QA classification of candidate targets
 * - `translation`: Translation pipeline:
 *   - `translation::translator`: Whole-segment translation with chunk fallback
 *   - `translation::repair`: Bounded token repair
 *   - `translation::store`: Unit arena with atomic commits and export guard
 *   - `translation::batch`: Concurrent processing with cancellation
 *   - `translation::prompts`: Style profiles and prompt construction
 * - `providers`: Client implementations for various LLM providers
 * - `file_utils`: JSON unit batch files
 * - `app_controller`: Main application controller
 * - `language_utils`: Language tag utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, RepairError, StoreError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use markup::{Abstraction, TokenMap, abstract_segment, restore};
pub use translation::{
    RepairEngine, RepairOutcome, TokenSafeTranslator, TranslationOutcome, TranslationService, Unit,
    UnitStatus, UnitStore,
};
pub use validation::{QaDetails, QaResult, QaStatus, validate};
