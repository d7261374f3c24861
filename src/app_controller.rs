use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::file_utils::{OutputFile, UnitFile};
use crate::translation::{BatchRunner, BatchSummary, ExportPolicy, TranslationService, UnitStore};
use crate::validation::QaResult;

// @module: Application controller driving the pipeline over unit batches

/// Pipeline run to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Translate pending units, with auto repair when configured
    Translate,
    /// Repair flagged units only
    Repair,
}

/// Options of a single run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Re-translate units that already passed QA
    pub retranslate: bool,
    /// Export policy for units still in error
    pub export_policy: ExportPolicy,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    service: TranslationService,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let service = TranslationService::from_config(&config)?;
        Ok(Self { config, service })
    }

    /// Create a controller around an existing service
    pub fn with_service(config: Config, service: TranslationService) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process an input batch file and write the output file
    pub async fn run(&self, input: &Path, output: &Path, options: RunOptions) -> Result<BatchSummary> {
        let store = UnitFile::load(input)?
            .into_store(self.service.validation().clone())
            .context("Failed to load units")?;
        let store = Arc::new(store);
        info!("Loaded {} unit(s) from {:?}", store.len(), input);

        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing without uncommitted units");
                ctrl_c.cancel();
            }
        });

        let summary = self.process(store.clone(), options, cancel).await;
        watcher.abort();

        log_summary(&summary);
        self.write_output(&store, output, options.export_policy)?;
        Ok(summary)
    }

    /// Refine a single unit of an input batch file and write the output file
    pub async fn refine(
        &self,
        input: &Path,
        output: &Path,
        id: &str,
        instruction: &str,
        export_policy: ExportPolicy,
    ) -> Result<QaResult> {
        let store = UnitFile::load(input)?
            .into_store(self.service.validation().clone())
            .context("Failed to load units")?;
        info!("Loaded {} unit(s) from {:?}", store.len(), input);

        let qa = self
            .service
            .refine_unit(&store, id, instruction)
            .await
            .with_context(|| format!("Failed to refine unit {}", id))?;

        self.write_output(&store, output, export_policy)?;
        Ok(qa)
    }

    /// Run the pipeline over a store with a progress bar
    pub async fn process(&self, store: Arc<UnitStore>, options: RunOptions, cancel: CancellationToken) -> BatchSummary {
        let progress_bar = ProgressBar::new(store.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let runner: BatchRunner = self
            .service
            .batch_runner()
            .with_force(options.retranslate)
            .with_cancellation(cancel);

        let pb = progress_bar.clone();
        let on_progress = move |done: usize, total: usize| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        };

        let summary = match options.mode {
            RunMode::Translate => {
                progress_bar.set_message("Translating");
                self.service.translate_store(store, &runner, on_progress).await
            }
            RunMode::Repair => {
                progress_bar.set_message("Repairing");
                self.service.repair_store(store, &runner, on_progress).await
            }
        };

        progress_bar.finish_and_clear();
        summary
    }

    fn write_output(&self, store: &UnitStore, output: &Path, policy: ExportPolicy) -> Result<()> {
        let exported = match store.export(policy) {
            Ok(exported) => exported,
            Err(e) => {
                error!("{}. Use --force to export anyway.", e);
                return Err(e.into());
            }
        };
        OutputFile::from_export(store, exported).save(output)?;
        info!("Output written to {:?}", output);
        Ok(())
    }
}

fn log_summary(summary: &BatchSummary) {
    info!(
        "Done: {} translated, {} repaired, {} failed, {} skipped, {} cancelled",
        summary.translated, summary.repaired, summary.failed, summary.skipped, summary.cancelled
    );
}
