/*!
 * Token-safe translation of a single unit.
 *
 * The translator first asks for the whole abstracted segment. If the answer
 * fails (service error, timeout, unparsable or structurally invalid text),
 * it makes exactly one chunk-isolated request: the text between tokens is
 * translated without tokens and reassembled around the original ones.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::{ProviderError, TranslationError};
use crate::markup::tokens;
use crate::providers::{TextGenerator, generate_with_timeout};
use crate::translation::chunking::ChunkPlan;
use crate::translation::prompts::PromptBuilder;
use crate::translation::response::{parse_chunk_response, parse_segment_response};
use crate::translation::unit::Unit;
use crate::validation::{QaResult, ValidationService};

/// How a target was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStrategy {
    /// Nothing to translate; the source was copied
    Passthrough,
    /// Whole-segment request
    WholeSegment,
    /// Chunk-isolated fallback
    ChunkFallback,
    /// Instruction-driven revision of an existing target
    Refine,
}

impl fmt::Display for TranslationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Passthrough => "passthrough",
            Self::WholeSegment => "whole segment",
            Self::ChunkFallback => "chunk fallback",
            Self::Refine => "refine",
        };
        f.write_str(name)
    }
}

/// A validated translation, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub target_abstracted: String,
    pub qa: QaResult,
    pub strategy: TranslationStrategy,
    /// Requests sent to the service
    pub requests: u32,
}

/// Drives a text generator to a structurally valid target
#[derive(Clone)]
pub struct TokenSafeTranslator {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    validation: ValidationService,
    timeout: Duration,
}

impl fmt::Debug for TokenSafeTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSafeTranslator")
            .field("prompts", &self.prompts)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TokenSafeTranslator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: PromptBuilder,
        validation: ValidationService,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            prompts,
            validation,
            timeout,
        }
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Translate a unit without modifying it
    pub async fn translate(&self, unit: &Unit) -> Result<TranslationOutcome, TranslationError> {
        if unit.untranslatable {
            let reason = unit
                .qa_details
                .failure
                .clone()
                .unwrap_or_else(|| format!("unit {} cannot be abstracted", unit.id));
            return Err(TranslationError::MalformedMarkup(reason));
        }

        let source = &unit.source_abstracted;
        if !tokens::has_translatable_text(source) {
            debug!("Unit {} has no translatable text, copying source", unit.id);
            return Ok(TranslationOutcome {
                target_abstracted: source.clone(),
                qa: self.check(unit, source),
                strategy: TranslationStrategy::Passthrough,
                requests: 0,
            });
        }

        let mut rejected: Option<(String, QaResult)> = None;
        match self.whole_segment(unit).await {
            Ok(target) => {
                let qa = self.check(unit, &target);
                if qa.is_valid() {
                    return Ok(TranslationOutcome {
                        target_abstracted: target,
                        qa,
                        strategy: TranslationStrategy::WholeSegment,
                        requests: 1,
                    });
                }
                warn!(
                    "Unit {}: whole-segment translation failed QA ({}), using chunk fallback",
                    unit.id, qa.details
                );
                rejected = Some((target, qa));
            }
            Err(e) => warn!(
                "Unit {}: whole-segment translation failed ({}), using chunk fallback",
                unit.id, e
            ),
        }

        let target = match self.chunk_fallback(unit).await {
            Ok(target) => target,
            Err(e) => {
                return Err(match rejected {
                    Some((candidate, qa)) => TranslationError::Rejected {
                        candidate,
                        details: qa.details,
                    },
                    None => e,
                });
            }
        };
        let qa = self.check(unit, &target);
        if qa.is_valid() {
            return Ok(TranslationOutcome {
                target_abstracted: target,
                qa,
                strategy: TranslationStrategy::ChunkFallback,
                requests: 2,
            });
        }

        let (candidate, qa) = match rejected {
            Some((whole, whole_qa)) if closeness(&whole_qa) <= closeness(&qa) => (whole, whole_qa),
            _ => (target, qa),
        };
        Err(TranslationError::Rejected {
            candidate,
            details: qa.details,
        })
    }

    /// Rewrite the unit's current target following a free-form instruction
    ///
    /// One request; the answer goes through the same token validation as a
    /// translation and is returned as `Rejected` when it fails.
    pub async fn refine(&self, unit: &Unit, instruction: &str) -> Result<TranslationOutcome, TranslationError> {
        if unit.untranslatable {
            return Err(TranslationError::MalformedMarkup(format!(
                "unit {} cannot be abstracted",
                unit.id
            )));
        }
        let current = unit
            .target_abstracted
            .as_deref()
            .ok_or_else(|| TranslationError::NoTarget(unit.id.clone()))?;

        debug!("Unit {}: refining with instruction {:?}", unit.id, instruction);
        let system = self.prompts.refine_system();
        let user = self.prompts.refine_user(&unit.source_abstracted, current, instruction);
        let response = generate_with_timeout(self.generator.as_ref(), &system, &user, self.timeout).await?;
        let candidate = parse_segment_response(&response)?;

        let qa = self.check(unit, &candidate);
        if !qa.is_valid() {
            warn!("Unit {}: refined target failed QA ({})", unit.id, qa.details);
            return Err(TranslationError::Rejected {
                candidate,
                details: qa.details,
            });
        }
        Ok(TranslationOutcome {
            target_abstracted: candidate,
            qa,
            strategy: TranslationStrategy::Refine,
            requests: 1,
        })
    }

    async fn whole_segment(&self, unit: &Unit) -> Result<String, TranslationError> {
        let system = self.prompts.segment_system();
        let user = self.prompts.segment_user(&unit.source_abstracted);
        let response = generate_with_timeout(self.generator.as_ref(), &system, &user, self.timeout).await?;
        Ok(parse_segment_response(&response)?)
    }

    async fn chunk_fallback(&self, unit: &Unit) -> Result<String, TranslationError> {
        let plan = ChunkPlan::split(&unit.source_abstracted);
        let chunks = plan.translatable();
        debug!(
            "Unit {}: translating {} chunk(s) around {} token(s)",
            unit.id,
            chunks.len(),
            plan.tokens().len()
        );

        let system = self.prompts.chunk_system();
        let user = self.prompts.chunk_user(&chunks);
        let response = generate_with_timeout(self.generator.as_ref(), &system, &user, self.timeout).await?;
        let translations = parse_chunk_response(&response, chunks.len())?;

        plan.reassemble(&translations).ok_or_else(|| {
            TranslationError::Service(ProviderError::ParseError(
                "Chunk count mismatch on reassembly".to_string(),
            ))
        })
    }

    fn check(&self, unit: &Unit, target: &str) -> QaResult {
        self.validation
            .validate_with_map(&unit.source_abstracted, target, Some(&unit.token_map))
    }
}

/// Ordering key for failed candidates: targets with visible text first, then the smallest token diff
fn closeness(qa: &QaResult) -> (bool, usize) {
    (qa.details.empty_target, qa.details.diff_size())
}
