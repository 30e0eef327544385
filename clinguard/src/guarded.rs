//! Guarded single-shot generation
//!
//! Wraps one LLM-facing feature call in an input scan and an output scan. The
//! output scan carries the input as `original_prompt` so pair-aware tools can
//! judge the answer in context.

use clinguard_agent::{LanguageModel, LlmError, INLINE_GUARDRAIL};
use clinguard_core::{AggregateScanOutcome, Orchestrator, ScanRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Where a guarded call was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Generation,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GuardedResponse {
    Blocked {
        stage: Stage,
        blocked_by: Vec<String>,
        reason: String,
    },
    Completed {
        answer: String,
        input_scan: AggregateScanOutcome,
        output_scan: AggregateScanOutcome,
    },
}

impl GuardedResponse {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GuardedResponse::Blocked { .. })
    }

    fn blocked(stage: Stage, outcome: &AggregateScanOutcome) -> Self {
        GuardedResponse::Blocked {
            stage,
            blocked_by: outcome.blocked_by.clone(),
            reason: outcome.block_reason(),
        }
    }
}

/// One feature's guarded model call
pub struct GuardedGeneration {
    orchestrator: Arc<Orchestrator>,
    llm: Arc<dyn LanguageModel>,
    feature: String,
    system_prompt: String,
    temperature: f32,
    llm_timeout: Duration,
}

impl GuardedGeneration {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        llm: Arc<dyn LanguageModel>,
        feature: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            llm,
            feature: feature.into(),
            system_prompt: String::new(),
            temperature: 0.3,
            llm_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Scan, generate, scan
    ///
    /// Only model failures other than a provider-side refusal are errors; every
    /// security decision is a [`GuardedResponse`].
    pub async fn generate(&self, input: &str) -> Result<GuardedResponse, LlmError> {
        let input_scan = self
            .orchestrator
            .scan(ScanRequest::input(input, self.feature.as_str()))
            .await;

        if input_scan.blocked {
            info!(feature = %self.feature, blocked_by = ?input_scan.blocked_by, "input blocked");
            return Ok(GuardedResponse::blocked(Stage::Input, &input_scan));
        }

        let call = self.llm.generate(input, &self.system_prompt, self.temperature);
        let generated = tokio::time::timeout(self.llm_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(LlmError::Unavailable(format!(
                    "no response within {:?}",
                    self.llm_timeout
                )))
            });

        let answer = match generated {
            Ok(answer) => answer,
            Err(LlmError::GuardrailBlocked { reason }) => {
                info!(feature = %self.feature, "generation refused by inline guardrail");
                return Ok(GuardedResponse::Blocked {
                    stage: Stage::Generation,
                    blocked_by: vec![INLINE_GUARDRAIL.to_string()],
                    reason,
                });
            }
            Err(e) => return Err(e),
        };

        let output_scan = self
            .orchestrator
            .scan(ScanRequest::output(answer.as_str(), self.feature.as_str()).with_original_prompt(input))
            .await;

        if output_scan.blocked {
            info!(feature = %self.feature, blocked_by = ?output_scan.blocked_by, "output blocked");
            return Ok(GuardedResponse::blocked(Stage::Output, &output_scan));
        }

        debug!(feature = %self.feature, "guarded generation completed");
        Ok(GuardedResponse::Completed {
            answer,
            input_scan,
            output_scan,
        })
    }
}
