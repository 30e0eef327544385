//! Agent run driver
//!
//! Each run is one spawned task that walks the reason, scan, decide, execute
//! cycle until a terminal state and reports progress as [`AgentEvent`]s. Every
//! model output and every tool argument and result passes through the scan
//! orchestrator before it can influence the next step.

use crate::config::AgentConfig;
use crate::decision::{parse_decision, Decision};
use crate::error::{AgentError, LlmError, ToolExecError};
use crate::events::{AgentEvent, AgentRunStream};
use crate::executor::ToolExecutor;
use crate::llm::{LanguageModel, INLINE_GUARDRAIL};
use crate::loop_detector::{CallSignature, LoopDetector};
use crate::memory::{truncate, Memory};
use crate::profile::{builtin_profiles, AgentProfile};
use crate::prompt::{reasoning_prompt, synthesis_prompt};
use crate::store::RunStore;
use crate::types::{AgentRun, AgentStep, RunStatus, ScanStage, StepKind};
use clinguard_core::{AggregateScanOutcome, Orchestrator, ScanRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

const EVENT_BUFFER: usize = 64;

/// Characters of a final answer kept as the run summary
const SUMMARY_CHARS: usize = 500;

/// Collaborators shared by every run
#[derive(Clone)]
pub struct AgentDeps {
    pub orchestrator: Arc<Orchestrator>,
    pub llm: Arc<dyn LanguageModel>,
    pub tools: Arc<dyn ToolExecutor>,
    pub store: Arc<dyn RunStore>,
}

/// Starts agent runs by type
pub struct AgentRunner {
    deps: AgentDeps,
    profiles: Vec<Arc<AgentProfile>>,
    config: AgentConfig,
}

impl AgentRunner {
    /// Runner with the built-in clinical profiles and default bounds
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            deps,
            profiles: builtin_profiles().into_iter().map(Arc::new).collect(),
            config: AgentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a profile, replacing a built-in of the same type
    pub fn with_profile(mut self, profile: AgentProfile) -> Self {
        self.profiles.retain(|p| p.agent_type != profile.agent_type);
        self.profiles.push(Arc::new(profile));
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn profiles(&self) -> impl Iterator<Item = &AgentProfile> {
        self.profiles.iter().map(Arc::as_ref)
    }

    pub fn profile(&self, agent_type: &str) -> Option<&AgentProfile> {
        self.profiles().find(|p| p.agent_type == agent_type)
    }

    /// Start a run and return its event stream
    ///
    /// A missing or blank task falls back to the profile's default task. The
    /// run continues to completion even if the stream is dropped.
    pub fn run_agent(&self, agent_type: &str, task: Option<&str>) -> Result<AgentRunStream, AgentError> {
        self.config.validate()?;

        let profile = self
            .profiles
            .iter()
            .find(|p| p.agent_type == agent_type)
            .cloned()
            .ok_or_else(|| AgentError::UnknownAgent(agent_type.to_string()))?;

        let task = match task.map(str::trim).filter(|t| !t.is_empty()) {
            Some(task) => task.to_string(),
            None => profile
                .default_task
                .clone()
                .ok_or_else(|| AgentError::MissingTask(agent_type.to_string()))?,
        };

        let run_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let driver = RunDriver {
            deps: self.deps.clone(),
            config: self.config.clone(),
            loops: LoopDetector::new(self.config.loop_window, self.config.loop_max_repeats),
            run: AgentRun::new(run_id, profile.agent_type.clone(), task),
            memory: Memory::new(),
            profile,
            events: tx,
        };

        let span = info_span!("agent_run", agent_type = %agent_type, run_id = %run_id);
        tokio::spawn(driver.drive().instrument(span));

        Ok(AgentRunStream::new(run_id, rx))
    }
}

/// How a run ended, before it is recorded
enum Ending {
    Answer {
        answer: String,
        reasoning: Option<String>,
    },
    Blocked {
        stage: ScanStage,
        blocked_by: Vec<String>,
        reason: String,
    },
    Budget {
        summary: String,
    },
    Failed {
        message: String,
    },
    Escalated {
        reason: String,
    },
}

impl Ending {
    fn blocked(stage: ScanStage, outcome: &AggregateScanOutcome) -> Self {
        Ending::Blocked {
            stage,
            blocked_by: outcome.blocked_by.clone(),
            reason: outcome.block_reason(),
        }
    }

    fn inline_guardrail(stage: ScanStage, reason: String) -> Self {
        Ending::Blocked {
            stage,
            blocked_by: vec![INLINE_GUARDRAIL.to_string()],
            reason,
        }
    }
}

struct RunDriver {
    deps: AgentDeps,
    profile: Arc<AgentProfile>,
    config: AgentConfig,
    events: mpsc::Sender<AgentEvent>,
    run: AgentRun,
    memory: Memory,
    loops: LoopDetector,
}

impl RunDriver {
    async fn drive(mut self) {
        if let Err(e) = self.deps.store.create_run(&self.run).await {
            warn!(error = %e, "Failed to persist agent run");
        }

        info!(task = %self.run.task, "agent run started");
        self.emit(AgentEvent::Start {
            run_id: self.run.id,
            agent_type: self.run.agent_type.clone(),
            task: self.run.task.clone(),
        })
        .await;

        let ending = self.iterate().await;
        self.finish(ending).await;
    }

    async fn iterate(&mut self) -> Ending {
        for iteration in 1..=self.config.max_iterations {
            self.run.iterations = iteration;

            let prompt = reasoning_prompt(
                &self.run.task,
                &self.profile,
                self.deps.tools.as_ref(),
                &self.memory,
                iteration,
                &self.config,
            );

            let raw = match self.generate(&prompt).await {
                Ok(raw) => raw,
                Err(LlmError::GuardrailBlocked { reason }) => {
                    return Ending::inline_guardrail(ScanStage::Reasoning, reason)
                }
                Err(e) => {
                    return Ending::Failed {
                        message: format!("LLM error: {}", e),
                    }
                }
            };

            self.emit(AgentEvent::Reasoning {
                iteration,
                reasoning: raw.clone(),
            })
            .await;

            let feature = format!("{}_agent", self.profile.agent_type);
            let scan = self
                .scan(iteration, raw.clone(), feature, ScanStage::Reasoning, None)
                .await;

            self.record_step(
                AgentStep::new(self.run.id, iteration, 0, StepKind::Reasoning)
                    .with_content(raw.clone())
                    .with_scan(scan.clone()),
            )
            .await;

            if scan.blocked {
                return Ending::blocked(ScanStage::Reasoning, &scan);
            }

            let decision = parse_decision(&raw).map(|parsed| {
                debug!(strategy = parsed.strategy, kind = parsed.decision.kind(), "decision parsed");
                parsed.decision
            });

            self.emit(AgentEvent::Decision {
                iteration,
                decision: decision.clone(),
            })
            .await;

            match decision {
                None => {
                    warn!(iteration, "Reasoning could not be parsed as a decision");
                    self.memory
                        .record(iteration, "Reasoning could not be parsed as a decision");
                }
                Some(Decision::FinalAnswer { answer, reasoning }) => {
                    self.record_step(
                        AgentStep::new(self.run.id, iteration, 1, StepKind::FinalAnswer)
                            .with_content(answer.clone()),
                    )
                    .await;
                    return Ending::Answer { answer, reasoning };
                }
                Some(Decision::NeedHuman { reason }) => {
                    self.record_step(
                        AgentStep::new(self.run.id, iteration, 1, StepKind::Escalation)
                            .with_content(reason.clone()),
                    )
                    .await;
                    return Ending::Escalated { reason };
                }
                Some(Decision::UseTool { tool, input, .. }) => {
                    if self.loops.record(CallSignature::new(&tool, &input)) {
                        warn!(iteration, tool = %tool, "Repeated tool call, ending with a synthesized answer");
                        self.run.loop_detected = true;
                        return self
                            .synthesize_answer(iteration, "the same tool call keeps repeating")
                            .await;
                    }

                    if let Some(ending) = self.call_tool(iteration, tool, input).await {
                        return ending;
                    }
                }
            }
        }

        info!(iterations = self.config.max_iterations, "iteration budget exhausted");
        let prompt = synthesis_prompt(
            &self.run.task,
            &self.memory,
            "the iteration budget is exhausted",
            &self.config,
        );
        let summary = match self.generate(&prompt).await {
            Ok(summary) => summary,
            Err(LlmError::GuardrailBlocked { reason }) => {
                return Ending::inline_guardrail(ScanStage::Synthesis, reason)
            }
            Err(e) => {
                warn!(error = %e, "Failed to synthesize timeout summary");
                "Reached maximum iterations without completing task".to_string()
            }
        };

        Ending::Budget { summary }
    }

    /// Scan, execute and rescan one tool call
    ///
    /// Returns an ending only when a scan blocks; execution failures become
    /// observations.
    async fn call_tool(&mut self, iteration: u32, tool: String, input: Value) -> Option<Ending> {
        if !self.profile.allows(&tool) {
            let message = ToolExecError::UnknownTool(tool.clone()).to_string();
            warn!(iteration, tool = %tool, "Agent requested a tool outside its profile");

            self.emit(AgentEvent::ToolResult {
                iteration,
                tool: tool.clone(),
                result: json!({ "error": message }),
                is_error: true,
            })
            .await;
            self.memory
                .record(iteration, format!("Tried unknown tool: {}", tool));
            return None;
        }

        let feature = format!("agent_tool_{}", tool);

        let input_scan = self
            .scan(
                iteration,
                input.to_string(),
                feature.clone(),
                ScanStage::ToolInput,
                Some(tool.clone()),
            )
            .await;

        if input_scan.blocked {
            self.record_step(
                AgentStep::new(self.run.id, iteration, 1, StepKind::ToolCall)
                    .with_tool(tool.clone(), input, None)
                    .with_scan(input_scan.clone()),
            )
            .await;
            return Some(Ending::blocked(ScanStage::ToolInput, &input_scan));
        }

        self.emit(AgentEvent::ToolExecuting {
            iteration,
            tool: tool.clone(),
            input: input.clone(),
        })
        .await;

        let executed = tokio::time::timeout(
            self.config.tool_timeout,
            self.deps.tools.execute(&tool, &input),
        )
        .await
        .unwrap_or_else(|_| Err(ToolExecError::Timeout(tool.clone())));

        let (result, is_error) = match executed {
            Ok(result) => (result, false),
            Err(e) => {
                warn!(iteration, tool = %tool, error = %e, "Tool execution failed");
                (json!({ "error": e.to_string() }), true)
            }
        };

        self.emit(AgentEvent::ToolResult {
            iteration,
            tool: tool.clone(),
            result: result.clone(),
            is_error,
        })
        .await;

        let rendered = result.to_string();
        let output_scan = self
            .scan(
                iteration,
                rendered.clone(),
                feature,
                ScanStage::ToolOutput,
                Some(tool.clone()),
            )
            .await;

        self.record_step(
            AgentStep::new(self.run.id, iteration, 1, StepKind::ToolCall)
                .with_tool(tool.clone(), input, Some(result))
                .with_scan(input_scan)
                .with_scan(output_scan.clone()),
        )
        .await;

        if output_scan.blocked {
            return Some(Ending::blocked(ScanStage::ToolOutput, &output_scan));
        }

        self.memory.record(
            iteration,
            format!(
                "Used {} -> {}",
                tool,
                truncate(&rendered, self.config.observation_chars)
            ),
        );
        None
    }

    /// Close a cycling run with an answer built from memory
    ///
    /// The synthesized answer is scanned like any other model output.
    async fn synthesize_answer(&mut self, iteration: u32, reason: &str) -> Ending {
        let prompt = synthesis_prompt(&self.run.task, &self.memory, reason, &self.config);

        let answer = match self.generate(&prompt).await {
            Ok(answer) => answer,
            Err(LlmError::GuardrailBlocked { reason }) => {
                return Ending::inline_guardrail(ScanStage::Synthesis, reason)
            }
            Err(e) => {
                return Ending::Failed {
                    message: format!("LLM error during synthesis: {}", e),
                }
            }
        };

        let feature = format!("{}_agent", self.profile.agent_type);
        let scan = self
            .scan(iteration, answer.clone(), feature, ScanStage::Synthesis, None)
            .await;

        self.record_step(
            AgentStep::new(self.run.id, iteration, 1, StepKind::FinalAnswer)
                .with_content(answer.clone())
                .with_scan(scan.clone()),
        )
        .await;

        if scan.blocked {
            return Ending::blocked(ScanStage::Synthesis, &scan);
        }

        Ending::Answer {
            answer,
            reasoning: Some(format!("Stopped early: {}", reason)),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let call = self
            .deps
            .llm
            .generate(prompt, &self.profile.system_prompt, self.config.temperature);

        match tokio::time::timeout(self.config.llm_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Unavailable(format!(
                "no response within {:?}",
                self.config.llm_timeout
            ))),
        }
    }

    async fn scan(
        &self,
        iteration: u32,
        content: String,
        feature: String,
        stage: ScanStage,
        tool: Option<String>,
    ) -> AggregateScanOutcome {
        let request = ScanRequest::input(content, feature).with_agent_run(self.run.id);
        let outcome = self.deps.orchestrator.scan(request).await;

        self.emit(AgentEvent::SecurityScan {
            iteration,
            stage,
            tool,
            outcome: outcome.clone(),
        })
        .await;

        outcome
    }

    async fn finish(mut self, ending: Ending) {
        let run_id = self.run.id;
        let iterations = self.run.iterations;

        let event = match ending {
            Ending::Answer { answer, reasoning } => {
                self.run.result = Some(json!({ "answer": answer, "reasoning": reasoning }));
                self.run
                    .finish(RunStatus::Completed, truncate(&answer, SUMMARY_CHARS));
                AgentEvent::Complete {
                    run_id,
                    iterations,
                    answer,
                    reasoning,
                    loop_detected: self.run.loop_detected,
                }
            }
            Ending::Blocked {
                stage,
                blocked_by,
                reason,
            } => {
                self.run.finish(
                    RunStatus::Blocked,
                    format!("Blocked at iteration {}: {} flagged by security", iterations, stage),
                );
                AgentEvent::Blocked {
                    iteration: iterations,
                    stage,
                    blocked_by,
                    reason,
                }
            }
            Ending::Budget { summary } => {
                self.run.result = Some(json!({ "summary": summary }));
                self.run.finish(RunStatus::Timeout, summary.clone());
                AgentEvent::Timeout {
                    run_id,
                    iterations,
                    summary,
                }
            }
            Ending::Failed { message } => {
                warn!(iteration = iterations, "{}", message);
                self.run.finish(
                    RunStatus::Error,
                    format!("Failed at iteration {}: {}", iterations, message),
                );
                AgentEvent::Error {
                    iteration: iterations,
                    message,
                }
            }
            Ending::Escalated { reason } => {
                self.run.result = Some(json!({ "escalation_reason": reason }));
                self.run
                    .finish(RunStatus::Escalated, format!("Escalated: {}", reason));
                AgentEvent::Escalated {
                    run_id,
                    iterations,
                    reason,
                }
            }
        };

        if let Err(e) = self.deps.store.update_run(&self.run).await {
            warn!(error = %e, "Failed to persist agent run result");
        }

        info!(
            status = %self.run.status,
            iterations,
            loop_detected = self.run.loop_detected,
            "agent run finished"
        );
        self.emit(event).await;
    }

    async fn record_step(&self, step: AgentStep) {
        if let Err(e) = self.deps.store.append_step(&step).await {
            warn!(error = %e, iteration = step.iteration, "Failed to persist agent step");
        }
    }

    async fn emit(&self, event: AgentEvent) {
        if self.events.send(event).await.is_err() {
            debug!("event stream dropped, run continues");
        }
    }
}
