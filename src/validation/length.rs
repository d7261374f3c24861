/*!
 * Length validation for translated segments.
 *
 * This module flags targets whose visible length is far from the source:
 * - Length ratio between source and target text, tokens excluded
 * - Very short sources are exempt from the ratio check
 */

use log::debug;

use crate::markup::tokens;

/// Default minimum length ratio (target / source)
pub const DEFAULT_MIN_LENGTH_RATIO: f64 = 0.3;

/// Default maximum length ratio (target / source)
pub const DEFAULT_MAX_LENGTH_RATIO: f64 = 3.0;

/// Default minimum visible source length for the ratio check
pub const DEFAULT_MIN_SOURCE_CHARS: usize = 10;

/// Types of length issues
#[derive(Debug, Clone, PartialEq)]
pub enum LengthIssue {
    /// Target is too short relative to source
    TranslationTooShort {
        ratio: f64,
        min_ratio: f64,
        source_len: usize,
        translated_len: usize,
    },
    /// Target is too long relative to source
    TranslationTooLong {
        ratio: f64,
        max_ratio: f64,
        source_len: usize,
        translated_len: usize,
    },
}

impl std::fmt::Display for LengthIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthIssue::TranslationTooShort {
                ratio,
                min_ratio,
                source_len,
                translated_len,
            } => {
                write!(
                    f,
                    "Translation too short: ratio {:.2} < {:.2} ({} -> {} chars)",
                    ratio, min_ratio, source_len, translated_len
                )
            }
            LengthIssue::TranslationTooLong {
                ratio,
                max_ratio,
                source_len,
                translated_len,
            } => {
                write!(
                    f,
                    "Translation too long: ratio {:.2} > {:.2} ({} -> {} chars)",
                    ratio, max_ratio, source_len, translated_len
                )
            }
        }
    }
}

/// Configuration for length validation
#[derive(Debug, Clone, PartialEq)]
pub struct LengthConfig {
    /// Minimum acceptable length ratio (target / source)
    pub min_ratio: f64,
    /// Maximum acceptable length ratio (target / source)
    pub max_ratio: f64,
    /// Minimum visible source length to apply ratio checks
    pub min_source_chars: usize,
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            min_ratio: DEFAULT_MIN_LENGTH_RATIO,
            max_ratio: DEFAULT_MAX_LENGTH_RATIO,
            min_source_chars: DEFAULT_MIN_SOURCE_CHARS,
        }
    }
}

/// Length validator for abstracted segments
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    config: LengthConfig,
}

impl LengthValidator {
    /// Create a new validator with custom configuration
    pub fn with_config(config: LengthConfig) -> Self {
        Self { config }
    }

    /// Count of non-whitespace characters once tokens are removed
    pub fn visible_len(text: &str) -> usize {
        tokens::strip_tokens(text)
            .chars()
            .filter(|c| !c.is_whitespace())
            .count()
    }

    /// Calculate length ratio between target and source text
    pub fn calculate_ratio(source_len: usize, translated_len: usize) -> f64 {
        if source_len == 0 {
            if translated_len == 0 {
                1.0
            } else {
                f64::INFINITY
            }
        } else {
            translated_len as f64 / source_len as f64
        }
    }

    /// Check an abstracted source/target pair
    pub fn check(&self, source: &str, target: &str) -> Option<LengthIssue> {
        let source_len = Self::visible_len(source);
        let translated_len = Self::visible_len(target);

        // Targets without visible text are flagged as empty_target by the validation service
        if source_len < self.config.min_source_chars || translated_len == 0 {
            return None;
        }

        let ratio = Self::calculate_ratio(source_len, translated_len);
        debug!("Length ratio {:.2} ({} -> {} chars)", ratio, source_len, translated_len);

        if ratio < self.config.min_ratio {
            Some(LengthIssue::TranslationTooShort {
                ratio,
                min_ratio: self.config.min_ratio,
                source_len,
                translated_len,
            })
        } else if ratio > self.config.max_ratio {
            Some(LengthIssue::TranslationTooLong {
                ratio,
                max_ratio: self.config.max_ratio,
                source_len,
                translated_len,
            })
        } else {
            None
        }
    }
}
