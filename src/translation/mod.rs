/*!
 * Token-safe translation pipeline.
 *
 * This module drives text generators over abstracted units. It is split into
 * several submodules:
 *
 * - `unit`: Unit model and lifecycle status
 * - `store`: Unit arena with checkout/commit and export guard
 * - `chunking`: Chunk-isolated view of an abstracted segment
 * - `response`: Parsing of model responses
 * - `translator`: Whole-segment translation with chunk fallback
 * - `repair`: Bounded token repair loop
 * - `batch`: Concurrent processing with progress and cancellation
 * - `core`: Service wiring from configuration
 * - `prompts`: Style profiles and prompt builders
 */

// Re-export main types for easier usage
pub use self::batch::{BatchRunner, BatchSummary, RepairStage, UnitOutcome};
pub use self::chunking::{Chunk, ChunkPlan};
pub use self::core::TranslationService;
pub use self::repair::{DEFAULT_REPAIR_BUDGET, RepairEngine, RepairOutcome};
pub use self::store::{Commit, ExportPolicy, UnitSnapshot, UnitStore};
pub use self::translator::{TokenSafeTranslator, TranslationOutcome, TranslationStrategy};
pub use self::unit::{Unit, UnitStatus};

// Re-export prompt types
pub use self::prompts::{ProfileTemplate, PromptBuilder, StyleProfile};

// Submodules
pub mod batch;
pub mod chunking;
pub mod core;
pub mod prompts;
pub mod repair;
pub mod response;
pub mod store;
pub mod translator;
pub mod unit;
