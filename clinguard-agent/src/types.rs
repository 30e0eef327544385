//! Run and step records
//!
//! An [`AgentRun`] is created `running` and finished exactly once. Its
//! [`AgentStep`]s are append-only and ordered by `(iteration, seq)`.

use chrono::{DateTime, Utc};
use clinguard_core::AggregateScanOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Blocked,
    Timeout,
    Error,
    Escalated,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Blocked => "blocked",
            RunStatus::Timeout => "timeout",
            RunStatus::Error => "error",
            RunStatus::Escalated => "escalated",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in an iteration a scan or block happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Reasoning,
    ToolInput,
    ToolOutput,
    /// The final summarization call
    Synthesis,
}

impl ScanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStage::Reasoning => "reasoning",
            ScanStage::ToolInput => "tool_input",
            ScanStage::ToolOutput => "tool_output",
            ScanStage::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub id: Uuid,
    pub agent_type: String,
    pub task: String,
    pub status: RunStatus,
    pub iterations: u32,
    pub summary: Option<String>,
    pub result: Option<Value>,
    pub loop_detected: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AgentRun {
    pub fn new(id: Uuid, agent_type: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            id,
            agent_type: agent_type.into(),
            task: task.into(),
            status: RunStatus::Running,
            iterations: 0,
            summary: None,
            result: None,
            loop_detected: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to a terminal status
    ///
    /// Returns false, leaving the run untouched, if it already finished.
    pub fn finish(&mut self, status: RunStatus, summary: impl Into<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.summary = Some(summary.into());
        self.completed_at = Some(Utc::now());
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Reasoning,
    ToolCall,
    FinalAnswer,
    Escalation,
}

/// Append-only record of one stage of one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub run_id: Uuid,
    pub iteration: u32,
    /// Position within the iteration
    pub seq: u32,
    pub kind: StepKind,
    pub content: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_output: Option<Value>,
    pub scans: Vec<AggregateScanOutcome>,
    pub created_at: DateTime<Utc>,
}

impl AgentStep {
    pub fn new(run_id: Uuid, iteration: u32, seq: u32, kind: StepKind) -> Self {
        Self {
            run_id,
            iteration,
            seq,
            kind,
            content: None,
            tool_name: None,
            tool_input: None,
            tool_output: None,
            scans: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, input: Value, output: Option<Value>) -> Self {
        self.tool_name = Some(name.into());
        self.tool_input = Some(input);
        self.tool_output = output;
        self
    }

    pub fn with_scan(mut self, scan: AggregateScanOutcome) -> Self {
        self.scans.push(scan);
        self
    }

    /// Sort key
    pub fn position(&self) -> (u32, u32) {
        (self.iteration, self.seq)
    }
}
