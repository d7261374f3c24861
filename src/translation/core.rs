/*!
 * Core translation service.
 *
 * This module wires configuration to the pipeline: it builds the generator
 * for each task, the prompt builder from the style profile, and the
 * translator and repair engine that share the validation settings.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::app_config::{Config, RepairConfig, Task};
use crate::errors::{AppError, TranslationError};
use crate::providers::{TextGenerator, build_generator};
use crate::translation::batch::{BatchRunner, BatchSummary, RepairStage};
use crate::translation::prompts::PromptBuilder;
use crate::translation::repair::{RepairEngine, RepairOutcome};
use crate::translation::store::{Commit, UnitStore};
use crate::translation::translator::TokenSafeTranslator;
use crate::validation::{QaResult, ValidationService};

/// Translation service combining the translator and the repair engine
#[derive(Debug, Clone)]
pub struct TranslationService {
    translator: TokenSafeTranslator,
    repair: RepairEngine,
    repair_config: RepairConfig,
    validation: ValidationService,
    max_concurrent_requests: usize,
}

impl TranslationService {
    /// Build the service described by a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let timeout = Duration::from_secs(translation.common.generation_timeout_secs);

        let translation_provider = config.provider_for(Task::Translation);
        let translation_generator = build_generator(&translation_provider, translation)
            .with_context(|| format!("Failed to create {} client", translation_provider))?;

        // Repair uses its own, lower temperature
        let repair_provider = config.provider_for(Task::Repair);
        let mut repair_settings = translation.clone();
        repair_settings.common.temperature = config.repair.temperature;
        let repair_generator = build_generator(&repair_provider, &repair_settings)
            .with_context(|| format!("Failed to create {} repair client", repair_provider))?;

        info!(
            "Translating {} -> {} with {}, repairing with {}",
            config.source_language, config.target_language, translation_provider, repair_provider
        );

        Ok(Self::new(
            translation_generator,
            repair_generator,
            config,
            timeout,
            translation.optimal_concurrent_requests(),
        ))
    }

    /// Build the service around explicit generators
    pub fn new(
        translation_generator: Arc<dyn TextGenerator>,
        repair_generator: Arc<dyn TextGenerator>,
        config: &Config,
        timeout: Duration,
        max_concurrent_requests: usize,
    ) -> Self {
        let prompts = PromptBuilder::new(&config.source_language, &config.target_language, config.profile.clone());
        let validation = ValidationService::new(config.validation.clone());

        Self {
            translator: TokenSafeTranslator::new(translation_generator, prompts.clone(), validation.clone(), timeout),
            repair: RepairEngine::new(repair_generator, prompts, validation.clone(), timeout),
            repair_config: config.repair.clone(),
            validation,
            max_concurrent_requests,
        }
    }

    pub fn translator(&self) -> &TokenSafeTranslator {
        &self.translator
    }

    pub fn repair_engine(&self) -> &RepairEngine {
        &self.repair
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// A batch runner sized for the configured provider
    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(self.max_concurrent_requests)
    }

    /// Translate all pending units, repairing rejected ones when auto repair is on
    pub async fn translate_store(
        &self,
        store: Arc<UnitStore>,
        runner: &BatchRunner,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> BatchSummary {
        let repair = self.repair_config.auto_repair.then_some(RepairStage {
            engine: &self.repair,
            budget: self.repair_config.budget,
        });
        runner
            .translate_all(store, &self.translator, repair, progress_callback)
            .await
    }

    /// Refine one unit's target with a free-form instruction and commit the result
    ///
    /// A refined target that fails QA is repaired when auto repair is on.
    /// Nothing is committed on failure: the unit keeps its current target.
    pub async fn refine_unit(&self, store: &UnitStore, id: &str, instruction: &str) -> Result<QaResult, AppError> {
        let snapshot = store.checkout(id)?;
        let unit = &snapshot.unit;

        let commit = match self.translator.refine(unit, instruction).await {
            Ok(outcome) => Commit::Translation(outcome.target_abstracted),
            Err(TranslationError::Rejected { candidate, details }) if self.repair_config.auto_repair => {
                info!("Unit {}: refined target rejected ({}), repairing", id, details);
                let mut draft = unit.clone();
                draft.target_abstracted = Some(candidate);
                let outcome = self.repair.repair(&draft, self.repair_config.budget).await?;
                match outcome {
                    RepairOutcome::Repaired { target_abstracted, .. } => Commit::Repair(target_abstracted),
                    RepairOutcome::AlreadyValid(_) => Commit::Repair(draft.target_abstracted.unwrap_or_default()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let qa = store.commit(id, snapshot.revision, commit)?;
        info!("Unit {} refined: {}", id, qa.tag_stats);
        Ok(qa)
    }

    /// Repair every flagged unit with the configured budget
    pub async fn repair_store(
        &self,
        store: Arc<UnitStore>,
        runner: &BatchRunner,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> BatchSummary {
        runner
            .repair_all(store, &self.repair, self.repair_config.budget, progress_callback)
            .await
    }
}
