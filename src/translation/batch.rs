/*!
 * Batch processing of units.
 *
 * Units are processed concurrently with a cap on in-flight requests, a
 * progress callback and cooperative cancellation. Each unit is checked out,
 * processed without holding any lock, and committed on completion; a unit
 * whose task is cancelled before its commit keeps its previous state.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::{RepairError, StoreError, TranslationError};
use crate::translation::repair::{RepairEngine, RepairOutcome};
use crate::translation::store::{Commit, UnitStore};
use crate::translation::translator::TokenSafeTranslator;
use crate::translation::unit::{Unit, UnitStatus};
use crate::validation::QaDetails;

/// What happened to one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Translated,
    Repaired,
    Failed,
    Skipped,
    Cancelled,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub translated: usize,
    pub repaired: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Translated => self.translated += 1,
            UnitOutcome::Repaired => self.repaired += 1,
            UnitOutcome::Failed => self.failed += 1,
            UnitOutcome::Skipped => self.skipped += 1,
            UnitOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.translated + self.repaired + self.failed + self.skipped + self.cancelled
    }
}

/// Repair engine and per-unit budget used inside a translation pass
#[derive(Debug, Clone, Copy)]
pub struct RepairStage<'a> {
    pub engine: &'a RepairEngine,
    pub budget: u32,
}

/// Concurrent driver for translation and repair over a unit store
pub struct BatchRunner {
    /// Maximum number of units in flight
    max_concurrent_requests: usize,
    /// Re-translate units that already passed QA
    force: bool,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            max_concurrent_requests: max_concurrent_requests.max(1),
            force: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Also process units whose target already passed QA
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels the running batch
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Translate every pending unit and commit the results
    ///
    /// With a repair stage, a unit whose translation is rejected goes through
    /// the repair engine before anything is committed for it.
    pub async fn translate_all(
        &self,
        store: Arc<UnitStore>,
        translator: &TokenSafeTranslator,
        repair: Option<RepairStage<'_>>,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> BatchSummary {
        let ids = store.ids();
        let total = ids.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let processed = AtomicUsize::new(0);
        let processed = &processed;
        let progress_callback = &progress_callback;
        let force = self.force;

        let outcomes = stream::iter(ids)
            .map(|id| {
                let store = store.clone();
                let semaphore = semaphore.clone();
                let cancel = self.cancel.clone();

                async move {
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => UnitOutcome::Cancelled,
                        outcome = async {
                            let Ok(_permit) = semaphore.acquire().await else {
                                return UnitOutcome::Cancelled;
                            };
                            translate_one(&store, translator, repair, &id, force).await
                        } => outcome,
                    };
                    let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    outcome
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        let summary = summarize(outcomes);
        info!(
            "Translation pass: {} translated, {} repaired, {} failed, {} skipped, {} cancelled",
            summary.translated, summary.repaired, summary.failed, summary.skipped, summary.cancelled
        );
        summary
    }

    /// Repair every unit in `QaError` that holds a target
    pub async fn repair_all(
        &self,
        store: Arc<UnitStore>,
        engine: &RepairEngine,
        budget: u32,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> BatchSummary {
        let ids = store.ids();
        let total = ids.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let processed = AtomicUsize::new(0);
        let processed = &processed;
        let progress_callback = &progress_callback;

        let outcomes = stream::iter(ids)
            .map(|id| {
                let store = store.clone();
                let semaphore = semaphore.clone();
                let cancel = self.cancel.clone();

                async move {
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => UnitOutcome::Cancelled,
                        outcome = async {
                            let Ok(_permit) = semaphore.acquire().await else {
                                return UnitOutcome::Cancelled;
                            };
                            repair_one(&store, engine, &id, budget).await
                        } => outcome,
                    };
                    let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    outcome
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        let summary = summarize(outcomes);
        info!(
            "Repair pass: {} repaired, {} failed, {} skipped, {} cancelled",
            summary.repaired, summary.failed, summary.skipped, summary.cancelled
        );
        summary
    }
}

fn summarize(outcomes: Vec<UnitOutcome>) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        summary.record(outcome);
    }
    summary
}

async fn translate_one(
    store: &UnitStore,
    translator: &TokenSafeTranslator,
    repair: Option<RepairStage<'_>>,
    id: &str,
    force: bool,
) -> UnitOutcome {
    let snapshot = match store.checkout(id) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Cannot check out unit {}: {}", id, e);
            return UnitOutcome::Failed;
        }
    };
    let unit = &snapshot.unit;
    if unit.untranslatable || (unit.status.is_done() && !force) {
        debug!("Skipping unit {} ({})", id, unit.status);
        return UnitOutcome::Skipped;
    }

    let (commit, repaired) = match translator.translate(unit).await {
        Ok(outcome) => {
            debug!("Unit {} translated by {}", id, outcome.strategy);
            (Commit::Translation(outcome.target_abstracted), false)
        }
        Err(e) => {
            let (candidate, details) = match e {
                TranslationError::Rejected { candidate, details } => (Some(candidate), details),
                TranslationError::TokenMismatch(details) => (None, details),
                other => (None, QaDetails::failure(other.to_string())),
            };
            match repair {
                Some(stage) => repair_candidate(unit, stage, candidate, details).await,
                None => (Commit::Failed(details), false),
            }
        }
    };

    match store.commit(id, snapshot.revision, commit) {
        Ok(qa) if qa.is_valid() && repaired => UnitOutcome::Repaired,
        Ok(qa) if qa.is_valid() => UnitOutcome::Translated,
        Ok(qa) => {
            warn!("Unit {} failed translation: {}", id, qa.details);
            UnitOutcome::Failed
        }
        Err(e) => commit_failed(id, e),
    }
}

/// Run the repair engine on a rejected translation, or on the stored broken target
/// when the service produced nothing usable
async fn repair_candidate(
    unit: &Unit,
    stage: RepairStage<'_>,
    candidate: Option<String>,
    details: QaDetails,
) -> (Commit, bool) {
    let base = match candidate {
        Some(candidate) => candidate,
        None if unit.status == UnitStatus::QaError => match &unit.target_abstracted {
            Some(stored) => stored.clone(),
            None => return (Commit::Failed(details), false),
        },
        None => return (Commit::Failed(details), false),
    };

    let mut draft = unit.clone();
    draft.target_abstracted = Some(base);
    let result = stage.engine.repair(&draft, stage.budget).await;
    match result {
        Ok(RepairOutcome::Repaired { target_abstracted, .. }) => (Commit::Repair(target_abstracted), true),
        Ok(RepairOutcome::AlreadyValid(_)) => {
            (Commit::Repair(draft.target_abstracted.unwrap_or_default()), false)
        }
        Err(RepairError::BudgetExhausted { last_details, .. }) => {
            warn!("Unit {}: repair after translation failed: {}", unit.id, last_details);
            (Commit::Failed(last_details), false)
        }
        Err(RepairError::NotRepairable(reason)) => {
            debug!("Unit {} not repairable: {}", unit.id, reason);
            (Commit::Failed(details), false)
        }
    }
}

async fn repair_one(store: &UnitStore, engine: &RepairEngine, id: &str, budget: u32) -> UnitOutcome {
    let snapshot = match store.checkout(id) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Cannot check out unit {}: {}", id, e);
            return UnitOutcome::Failed;
        }
    };
    let unit = &snapshot.unit;
    if unit.status != UnitStatus::QaError || unit.untranslatable || unit.target_abstracted.is_none() {
        return UnitOutcome::Skipped;
    }

    match engine.repair(unit, budget).await {
        Ok(RepairOutcome::Repaired { target_abstracted, .. }) => {
            match store.commit(id, snapshot.revision, Commit::Repair(target_abstracted)) {
                Ok(qa) if qa.is_valid() => UnitOutcome::Repaired,
                Ok(_) => UnitOutcome::Failed,
                Err(e) => commit_failed(id, e),
            }
        }
        Ok(RepairOutcome::AlreadyValid(_)) => {
            // Stored status was stale; recompute it through a manual commit of the same target
            let target = unit.target_abstracted.clone().unwrap_or_default();
            match store.commit(id, snapshot.revision, Commit::ManualEdit(target)) {
                Ok(_) => UnitOutcome::Skipped,
                Err(e) => commit_failed(id, e),
            }
        }
        Err(RepairError::NotRepairable(reason)) => {
            debug!("Unit {} not repairable: {}", id, reason);
            UnitOutcome::Failed
        }
        // The stored target is left untouched
        Err(e @ RepairError::BudgetExhausted { .. }) => {
            warn!("Unit {}: {}", id, e);
            UnitOutcome::Failed
        }
    }
}

fn commit_failed(id: &str, e: StoreError) -> UnitOutcome {
    warn!("Commit for unit {} rejected: {}", id, e);
    UnitOutcome::Failed
}
