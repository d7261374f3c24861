/*!
 * Translatable unit model.
 *
 * A unit is one source/target pair of the host document. Its source side is
 * abstracted once on creation and never changes; the target side, status and
 * QA details change only through commits on the unit store.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markup::{TokenMap, abstract_segment};
use crate::validation::{QaDetails, QaResult, QaStatus, ValidationService};

/// Lifecycle status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// No target yet
    #[default]
    Untranslated,
    /// Target present but not checked yet
    Translated,
    /// Target passed QA
    QaOk,
    /// Target passed QA with warnings
    QaWarning,
    /// Target failed QA, or the unit could not be processed
    QaError,
}

impl UnitStatus {
    /// Status corresponding to a QA classification
    pub fn from_qa(status: QaStatus) -> Self {
        match status {
            QaStatus::Ok => Self::QaOk,
            QaStatus::Warning => Self::QaWarning,
            QaStatus::Error => Self::QaError,
        }
    }

    /// Whether the unit holds a target that passed QA
    pub fn is_done(&self) -> bool {
        matches!(self, Self::QaOk | Self::QaWarning)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untranslated => "untranslated",
            Self::Translated => "translated",
            Self::QaOk => "qa_ok",
            Self::QaWarning => "qa_warning",
            Self::QaError => "qa_error",
        };
        f.write_str(name)
    }
}

/// One translatable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Host identifier
    pub id: String,
    /// Original mixed content
    pub source_raw: String,
    /// Source with markers replaced by tokens
    pub source_abstracted: String,
    /// Markers by token id
    pub token_map: TokenMap,
    #[serde(default)]
    pub target_abstracted: Option<String>,
    #[serde(default)]
    pub target_raw: Option<String>,
    #[serde(default)]
    pub status: UnitStatus,
    #[serde(default)]
    pub qa_details: QaDetails,
    /// Source markup could not be abstracted
    #[serde(default)]
    pub untranslatable: bool,
}

impl Unit {
    /// Create a unit, abstracting its source
    ///
    /// A source that fails abstraction yields an untranslatable unit in
    /// `QaError` rather than an error, so the rest of the document can still
    /// be processed.
    pub fn new(id: impl Into<String>, source_raw: impl Into<String>) -> Self {
        let id = id.into();
        let source_raw = source_raw.into();

        match abstract_segment(&source_raw) {
            Ok(abstraction) => Self {
                id,
                source_raw,
                source_abstracted: abstraction.abstracted,
                token_map: abstraction.tokens,
                target_abstracted: None,
                target_raw: None,
                status: UnitStatus::Untranslated,
                qa_details: QaDetails::default(),
                untranslatable: false,
            },
            Err(e) => {
                log::warn!("Unit {} is untranslatable: {}", id, e);
                Self {
                    id,
                    source_raw,
                    source_abstracted: String::new(),
                    token_map: TokenMap::default(),
                    target_abstracted: None,
                    target_raw: None,
                    status: UnitStatus::QaError,
                    qa_details: QaDetails::failure(e.to_string()),
                    untranslatable: true,
                }
            }
        }
    }

    /// Attach an existing abstracted target, e.g. from a previous session
    pub fn with_target(mut self, target_abstracted: impl Into<String>) -> Self {
        if !self.untranslatable {
            self.target_abstracted = Some(target_abstracted.into());
            self.status = UnitStatus::Translated;
        }
        self
    }

    /// Whether the unit has text worth sending to a translation service
    pub fn is_translatable(&self) -> bool {
        !self.untranslatable
    }

    /// Number of tokens in the source
    pub fn token_count(&self) -> usize {
        self.token_map.len()
    }

    /// Validate the current target with default thresholds
    pub fn validate(&self) -> QaResult {
        self.validate_with(&ValidationService::default())
    }

    /// Validate the current target
    ///
    /// A missing target is checked as an empty one.
    pub fn validate_with(&self, service: &ValidationService) -> QaResult {
        if self.untranslatable {
            return QaResult {
                status: QaStatus::Error,
                details: self.qa_details.clone(),
                tag_stats: "TAG: 0/0".to_string(),
            };
        }
        let target = self.target_abstracted.as_deref().unwrap_or_default();
        service.validate_with_map(&self.source_abstracted, target, Some(&self.token_map))
    }
}
