//! Run progress events
//!
//! Every run emits an ordered stream of [`AgentEvent`]s over a tokio mpsc
//! channel. The stream always begins with `Start` and ends with exactly one
//! terminal event: `Complete`, `Blocked`, `Timeout`, `Error` or `Escalated`.

use crate::decision::Decision;
use crate::types::ScanStage;
use clinguard_core::AggregateScanOutcome;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    Start {
        run_id: Uuid,
        agent_type: String,
        task: String,
    },
    Reasoning {
        iteration: u32,
        reasoning: String,
    },
    /// `None` when no strategy could read a decision from the reasoning
    Decision {
        iteration: u32,
        decision: Option<Decision>,
    },
    ToolExecuting {
        iteration: u32,
        tool: String,
        input: Value,
    },
    ToolResult {
        iteration: u32,
        tool: String,
        result: Value,
        is_error: bool,
    },
    SecurityScan {
        iteration: u32,
        stage: ScanStage,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
        outcome: AggregateScanOutcome,
    },
    Blocked {
        iteration: u32,
        stage: ScanStage,
        blocked_by: Vec<String>,
        reason: String,
    },
    Complete {
        run_id: Uuid,
        iterations: u32,
        answer: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
        loop_detected: bool,
    },
    Timeout {
        run_id: Uuid,
        iterations: u32,
        summary: String,
    },
    Error {
        iteration: u32,
        message: String,
    },
    Escalated {
        run_id: Uuid,
        iterations: u32,
        reason: String,
    },
}

impl AgentEvent {
    /// Serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Start { .. } => "start",
            AgentEvent::Reasoning { .. } => "reasoning",
            AgentEvent::Decision { .. } => "decision",
            AgentEvent::ToolExecuting { .. } => "tool_executing",
            AgentEvent::ToolResult { .. } => "tool_result",
            AgentEvent::SecurityScan { .. } => "security_scan",
            AgentEvent::Blocked { .. } => "blocked",
            AgentEvent::Complete { .. } => "complete",
            AgentEvent::Timeout { .. } => "timeout",
            AgentEvent::Error { .. } => "error",
            AgentEvent::Escalated { .. } => "escalated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentEvent::Blocked { .. }
                | AgentEvent::Complete { .. }
                | AgentEvent::Timeout { .. }
                | AgentEvent::Error { .. }
                | AgentEvent::Escalated { .. }
        )
    }
}

/// Receiving side of one run
#[derive(Debug)]
pub struct AgentRunStream {
    run_id: Uuid,
    rx: mpsc::Receiver<AgentEvent>,
}

impl AgentRunStream {
    pub(crate) fn new(run_id: Uuid, rx: mpsc::Receiver<AgentEvent>) -> Self {
        Self { run_id, rx }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next event, or `None` once the run has finished and the channel drained
    pub async fn next(&mut self) -> Option<AgentEvent> {
        self.rx.recv().await
    }

    /// Drain the stream to completion
    pub async fn collect(mut self) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}
