/*!
 * Prompt engineering for token-safe translation.
 *
 * This module provides:
 * - Style profiles and their built-in templates
 * - System and user prompt construction for translation, chunk fallback and repair
 */

pub mod profile;
pub mod templates;

// Re-export main types
pub use profile::{ProfileTemplate, StyleProfile, TermStrictness, TerminologyPolicy};
pub use templates::{PromptBuilder, PromptTemplate};
