/*!
 * Bounded token repair.
 *
 * The repair engine asks a generator to fix token placement in a broken
 * target without retranslating it. Each failed attempt (bad tokens, service
 * error or timeout) consumes one unit of budget and refines the next request
 * with the offending tokens of the latest attempt. The engine never touches
 * the unit; it returns a value the caller may commit.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::errors::RepairError;
use crate::markup::tokens;
use crate::providers::{TextGenerator, generate_with_timeout};
use crate::translation::prompts::PromptBuilder;
use crate::translation::response::parse_segment_response;
use crate::translation::unit::Unit;
use crate::validation::{QaDetails, QaResult, ValidationService};

/// Default number of repair requests per unit
pub const DEFAULT_REPAIR_BUDGET: u32 = 2;

/// Result of a repair run
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// A structurally valid target was found
    Repaired {
        target_abstracted: String,
        qa: QaResult,
        /// Requests issued, including the successful one
        attempts: u32,
    },
    /// The stored target already passes QA
    AlreadyValid(QaResult),
}

/// Corrective loop for targets with token errors
#[derive(Clone)]
pub struct RepairEngine {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    validation: ValidationService,
    timeout: Duration,
}

impl fmt::Debug for RepairEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepairEngine")
            .field("prompts", &self.prompts)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RepairEngine {
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

    /// Try to fix the unit's target within `budget` requests
    pub async fn repair(&self, unit: &Unit, budget: u32) -> Result<RepairOutcome, RepairError> {
        if unit.untranslatable {
            return Err(RepairError::NotRepairable(format!(
                "unit {} has malformed source markup",
                unit.id
            )));
        }
        let Some(broken) = unit.target_abstracted.as_deref() else {
            return Err(RepairError::NotRepairable(format!("unit {} has no target", unit.id)));
        };
        if unit.token_map.is_empty() {
            return Err(RepairError::NotRepairable(format!(
                "unit {} has no tokens to repair",
                unit.id
            )));
        }

        let current = self.check(unit, broken);
        if current.is_valid() {
            return Ok(RepairOutcome::AlreadyValid(current));
        }

        let required = tokens::token_counts(&unit.source_abstracted);
        let system = self.prompts.repair_system();
        let mut last_details = current.details;
        let mut latest: Option<QaDetails> = None;

        for attempt in 1..=budget {
            debug!("Unit {}: repair attempt {}/{}", unit.id, attempt, budget);
            let user = self
                .prompts
                .repair_user(&unit.source_abstracted, broken, &required, latest.as_ref());

            let candidate = match generate_with_timeout(self.generator.as_ref(), &system, &user, self.timeout).await {
                Ok(response) => parse_segment_response(&response),
                Err(e) => Err(e),
            };

            match candidate {
                Ok(candidate) => {
                    let qa = self.check(unit, &candidate);
                    if qa.is_valid() {
                        info!("Unit {} repaired after {} attempt(s)", unit.id, attempt);
                        return Ok(RepairOutcome::Repaired {
                            target_abstracted: candidate,
                            qa,
                            attempts: attempt,
                        });
                    }
                    debug!("Unit {}: repair attempt {} still invalid: {}", unit.id, attempt, qa.details);
                    last_details = qa.details.clone();
                    latest = Some(qa.details);
                }
                Err(e) => warn!("Unit {}: repair attempt {} failed: {}", unit.id, attempt, e),
            }
        }

        warn!("Unit {}: repair budget of {} exhausted", unit.id, budget);
        Err(RepairError::BudgetExhausted {
            attempts: budget,
            last_details,
        })
    }

    fn check(&self, unit: &Unit, target: &str) -> QaResult {
        self.validation
            .validate_with_map(&unit.source_abstracted, target, Some(&unit.token_map))
    }
}
