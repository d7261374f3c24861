/*!
 * Validation service that orchestrates all validators.
 *
 * This module provides a unified interface for classifying a candidate
 * target: hard token errors first, then soft length and ordering warnings.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::markup::abstraction::TokenMap;
use crate::markup::tokens;

use super::length::{
    DEFAULT_MAX_LENGTH_RATIO, DEFAULT_MIN_LENGTH_RATIO, DEFAULT_MIN_SOURCE_CHARS, LengthConfig,
    LengthValidator,
};
use super::pairing::PairingValidator;
use super::tokens_check::TokenValidator;
use super::{QaDetails, QaResult, QaStatus};

/// Configuration for the validation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to warn on extreme length ratios
    #[serde(default = "default_true")]
    pub length_validation: bool,

    /// Minimum acceptable length ratio
    #[serde(default = "default_min_ratio")]
    pub length_ratio_min: f64,

    /// Maximum acceptable length ratio
    #[serde(default = "default_max_ratio")]
    pub length_ratio_max: f64,

    /// Sources shorter than this many visible characters skip the ratio check
    #[serde(default = "default_min_source_chars")]
    pub min_source_chars_for_length_check: usize,

    /// Whether to warn when a paired marker is closed before it is opened
    #[serde(default = "default_true")]
    pub pairing_validation: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_ratio() -> f64 {
    DEFAULT_MIN_LENGTH_RATIO
}

fn default_max_ratio() -> f64 {
    DEFAULT_MAX_LENGTH_RATIO
}

fn default_min_source_chars() -> usize {
    DEFAULT_MIN_SOURCE_CHARS
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            length_validation: true,
            length_ratio_min: default_min_ratio(),
            length_ratio_max: default_max_ratio(),
            min_source_chars_for_length_check: default_min_source_chars(),
            pairing_validation: true,
        }
    }
}

impl ValidationConfig {
    /// Check threshold sanity
    pub fn validate(&self) -> Result<(), String> {
        if self.length_ratio_min <= 0.0 || self.length_ratio_min >= self.length_ratio_max {
            return Err(format!(
                "Invalid length ratio bounds: min {} must be positive and below max {}",
                self.length_ratio_min, self.length_ratio_max
            ));
        }
        Ok(())
    }
}

/// Validation service that runs every check on a candidate target
#[derive(Debug, Clone, Default)]
pub struct ValidationService {
    config: ValidationConfig,
    length: LengthValidator,
}

/// A target is empty when it has no visible text left but its source has some
fn is_empty_target(source: &str, target: &str) -> bool {
    if target.trim().is_empty() {
        return !source.trim().is_empty();
    }
    tokens::has_translatable_text(source) && !tokens::has_translatable_text(target)
}

impl ValidationService {
    /// Create a new validation service
    pub fn new(config: ValidationConfig) -> Self {
        let length = LengthValidator::with_config(LengthConfig {
            min_ratio: config.length_ratio_min,
            max_ratio: config.length_ratio_max,
            min_source_chars: config.min_source_chars_for_length_check,
        });
        Self { config, length }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a candidate target against its abstracted source
    pub fn validate(&self, source: &str, target: &str) -> QaResult {
        self.validate_with_map(source, target, None)
    }

    /// Validate, also checking paired marker order when the token map is known
    pub fn validate_with_map(&self, source: &str, target: &str, token_map: Option<&TokenMap>) -> QaResult {
        let check = TokenValidator::check(source, target);
        let mut details = QaDetails {
            missing: check.missing.clone(),
            extra: check.extra.clone(),
            malformed: check.malformed.clone(),
            empty_target: is_empty_target(source, target),
            ..QaDetails::default()
        };

        if !details.has_errors() {
            if self.config.length_validation {
                if let Some(issue) = self.length.check(source, target) {
                    details.warnings.push(issue.to_string());
                }
            }
            if self.config.pairing_validation {
                if let Some(map) = token_map {
                    details
                        .warnings
                        .extend(PairingValidator::check(target, map).iter().map(|i| i.to_string()));
                }
            }
        }

        let status = if details.has_errors() {
            QaStatus::Error
        } else if !details.warnings.is_empty() {
            QaStatus::Warning
        } else {
            QaStatus::Ok
        };

        debug!("Validation result: {:?} ({})", status, details);

        QaResult {
            status,
            details,
            tag_stats: format!("TAG: {}/{}", check.present, check.required),
        }
    }
}

/// Validate a candidate target with default thresholds
pub fn validate(source: &str, target: &str) -> QaResult {
    ValidationService::default().validate(source, target)
}
