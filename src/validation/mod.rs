/*!
 * Validation module for candidate translations.
 *
 * This module compares a candidate target against its abstracted source:
 * - Token multiset comparison (missing, extra, malformed)
 * - Length ratio heuristics
 * - Paired marker ordering
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markup::tokens::{self, TokenId};

pub mod length;
pub mod pairing;
pub mod service;
pub mod tokens_check;

pub use length::{LengthConfig, LengthIssue, LengthValidator};
pub use pairing::{PairingIssue, PairingValidator};
pub use service::{ValidationConfig, ValidationService, validate};
pub use tokens_check::{TokenCheck, TokenValidator};

/// Classification of a candidate target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    /// Structurally valid, no warnings
    Ok,
    /// Structurally valid with soft issues
    Warning,
    /// Structurally invalid
    Error,
}

impl QaStatus {
    /// Whether a target with this status may be committed as valid
    pub fn is_valid(&self) -> bool {
        !matches!(self, QaStatus::Error)
    }
}

/// Details behind a QA classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaDetails {
    /// Required token ids absent from the target, sorted, one entry per missing occurrence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<TokenId>,
    /// Token ids present beyond the required count, sorted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TokenId>,
    /// Token-like text that is not a canonical token
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<String>,
    /// Target is blank while the source is not
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty_target: bool,
    /// Non-structural failure recorded for the unit (service error, bad markup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Soft warnings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl QaDetails {
    /// Details for a non-structural failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether any hard error is recorded
    pub fn has_errors(&self) -> bool {
        !self.missing.is_empty()
            || !self.extra.is_empty()
            || !self.malformed.is_empty()
            || self.empty_target
            || self.failure.is_some()
    }

    /// Whether the details carry a token-level diff repair can act on
    pub fn has_token_diff(&self) -> bool {
        !self.missing.is_empty() || !self.extra.is_empty() || !self.malformed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors() && self.warnings.is_empty()
    }

    /// Size of the token diff, used to compare candidates
    pub fn diff_size(&self) -> usize {
        self.missing.len() + self.extra.len() + self.malformed.len()
    }
}

fn join_tokens(ids: &[TokenId]) -> String {
    ids.iter().map(|id| tokens::token(*id)).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for QaDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", join_tokens(&self.missing)));
        }
        if !self.extra.is_empty() {
            parts.push(format!("extra {}", join_tokens(&self.extra)));
        }
        if !self.malformed.is_empty() {
            parts.push(format!("malformed {}", self.malformed.join(" ")));
        }
        if self.empty_target {
            parts.push("empty target".to_string());
        }
        if let Some(failure) = &self.failure {
            parts.push(failure.clone());
        }
        for warning in &self.warnings {
            parts.push(format!("warning: {}", warning));
        }
        if parts.is_empty() {
            f.write_str("no issues")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

/// Outcome of validating a candidate target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaResult {
    /// Classification
    pub status: QaStatus,
    /// What was found
    pub details: QaDetails,
    /// Token presence summary, `TAG: present/required`
    pub tag_stats: String,
}

impl QaResult {
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }
}
