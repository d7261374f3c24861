/*!
 * Arena of units with checkout/commit semantics.
 *
 * Every unit lives in its own slot guarded by its own lock, so operations on
 * different units never contend. A task checks a unit out (a copy plus the
 * slot revision), works on the copy without holding any lock, and commits
 * the result. The commit recomputes QA, status and the restored target in one
 * critical section and is rejected if the slot changed in between.
 */

use std::collections::HashMap;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::errors::StoreError;
use crate::markup::restore;
use crate::translation::unit::{Unit, UnitStatus};
use crate::validation::{QaDetails, QaResult, QaStatus, ValidationService};

/// A change to apply to a unit
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Target produced by the translator
    Translation(String),
    /// Target produced by the repair engine
    Repair(String),
    /// Target typed by a user; stored even when it fails QA
    ManualEdit(String),
    /// Processing failed; the stored target is kept
    Failed(QaDetails),
}

/// What to do with units in `QaError` on export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPolicy {
    /// Refuse to export
    #[default]
    Strict,
    /// Warn and export the source for flagged units
    Warn,
}

/// Copy of a unit taken at a given revision
#[derive(Debug, Clone)]
pub struct UnitSnapshot {
    pub unit: Unit,
    pub revision: u64,
}

#[derive(Debug)]
struct Slot {
    unit: Unit,
    revision: u64,
}

/// Store of independently addressable units
#[derive(Debug, Default)]
pub struct UnitStore {
    slots: Vec<Mutex<Slot>>,
    index: HashMap<String, usize>,
    validation: ValidationService,
}

impl UnitStore {
    pub fn new(validation: ValidationService) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            validation,
        }
    }

    /// Build a store from `(id, source_raw)` pairs, abstracting each source once
    pub fn from_sources<I, K, V>(sources: I, validation: ValidationService) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new(validation);
        for (id, raw) in sources {
            store.insert(Unit::new(id, raw))?;
        }
        Ok(store)
    }

    /// Add a unit; units carrying an unchecked target are validated on insert
    pub fn insert(&mut self, mut unit: Unit) -> Result<(), StoreError> {
        if self.index.contains_key(&unit.id) {
            return Err(StoreError::DuplicateUnit(unit.id));
        }
        if unit.status == UnitStatus::Translated {
            let qa = unit.validate_with(&self.validation);
            apply_qa(&mut unit, qa);
        }
        self.index.insert(unit.id.clone(), self.slots.len());
        self.slots.push(Mutex::new(Slot { unit, revision: 0 }));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// Unit ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.lock().unit.id.clone()).collect()
    }

    fn slot(&self, id: &str) -> Result<&Mutex<Slot>, StoreError> {
        self.index
            .get(id)
            .map(|&idx| &self.slots[idx])
            .ok_or_else(|| StoreError::UnknownUnit(id.to_string()))
    }

    /// Current copy of a unit
    pub fn get(&self, id: &str) -> Result<Unit, StoreError> {
        Ok(self.slot(id)?.lock().unit.clone())
    }

    /// Take a copy of a unit for processing
    pub fn checkout(&self, id: &str) -> Result<UnitSnapshot, StoreError> {
        let slot = self.slot(id)?.lock();
        Ok(UnitSnapshot {
            unit: slot.unit.clone(),
            revision: slot.revision,
        })
    }

    /// Apply a change to a unit checked out at `revision`
    ///
    /// A translation or repair whose target fails QA is not stored: the unit
    /// keeps its previous target and is flagged `QaError` with the new details.
    pub fn commit(&self, id: &str, revision: u64, commit: Commit) -> Result<QaResult, StoreError> {
        let mut slot = self.slot(id)?.lock();
        if slot.revision != revision {
            return Err(StoreError::StaleRevision {
                id: id.to_string(),
                expected: revision,
                found: slot.revision,
            });
        }
        if slot.unit.untranslatable {
            return Err(StoreError::Untranslatable(id.to_string()));
        }

        let unit = &mut slot.unit;
        let qa = match commit {
            Commit::Translation(target) | Commit::Repair(target) => {
                let qa = self.candidate_qa(unit, &target);
                if qa.is_valid() {
                    unit.target_abstracted = Some(target);
                } else {
                    debug!("Rejected candidate for unit {}: {}", id, qa.details);
                }
                qa
            }
            Commit::ManualEdit(target) => {
                unit.target_abstracted = Some(target);
                unit.validate_with(&self.validation)
            }
            Commit::Failed(details) => QaResult {
                status: QaStatus::Error,
                tag_stats: unit.validate_with(&self.validation).tag_stats,
                details,
            },
        };

        apply_qa(unit, qa.clone());
        slot.revision += 1;
        Ok(qa)
    }

    fn candidate_qa(&self, unit: &Unit, target: &str) -> QaResult {
        self.validation
            .validate_with_map(&unit.source_abstracted, target, Some(&unit.token_map))
    }

    /// Copies of every unit in insertion order
    pub fn units(&self) -> Vec<Unit> {
        self.slots.iter().map(|slot| slot.lock().unit.clone()).collect()
    }

    /// Ids of units currently in `QaError`
    pub fn flagged(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let slot = slot.lock();
                (slot.unit.status == UnitStatus::QaError).then(|| slot.unit.id.clone())
            })
            .collect()
    }

    /// Restored targets as `(id, target_raw)` pairs
    ///
    /// Untranslated units export their source. Under [`ExportPolicy::Strict`]
    /// any unit in `QaError` blocks the export; under [`ExportPolicy::Warn`]
    /// each one is logged and exports its source.
    pub fn export(&self, policy: ExportPolicy) -> Result<Vec<(String, String)>, StoreError> {
        let flagged = self.flagged();
        if !flagged.is_empty() && policy == ExportPolicy::Strict {
            warn!("Export blocked by {} unit(s) with QA errors", flagged.len());
            return Err(StoreError::ExportBlocked(flagged));
        }

        Ok(self
            .units()
            .into_iter()
            .map(|unit| {
                let output = match (&unit.status, unit.target_raw) {
                    (UnitStatus::QaError, _) => {
                        warn!("Exporting source for unit {} with QA errors: {}", unit.id, unit.qa_details);
                        unit.source_raw
                    }
                    (_, Some(target_raw)) => target_raw,
                    (_, None) => unit.source_raw,
                };
                (unit.id, output)
            })
            .collect())
    }
}

/// Store a QA result on a unit and refresh its restored target
fn apply_qa(unit: &mut Unit, mut qa: QaResult) {
    unit.target_raw = None;
    if qa.is_valid() {
        if let Some(target) = &unit.target_abstracted {
            match restore(target, &unit.token_map) {
                Ok(raw) => unit.target_raw = Some(raw),
                Err(e) => {
                    qa.status = QaStatus::Error;
                    qa.details.failure = Some(e.to_string());
                }
            }
        }
    }
    unit.status = UnitStatus::from_qa(qa.status);
    unit.qa_details = qa.details;
}
