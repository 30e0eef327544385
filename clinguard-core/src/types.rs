//! Core type definitions for clinguard
//!
//! This module defines the value types shared by every tool adapter and caller:
//! - Scan requests and their direction
//! - Per-tool verdicts and scan results
//! - The aggregate outcome the orchestrator hands back to a feature

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Direction of a scan
///
/// Tool output fed back into a model is scanned as `Input`: it is untrusted data
/// entering the next prompt, not the model's own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Input,
    Output,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Input => "input",
            ScanType::Output => "output",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tool classification of scanned content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No threat found
    Pass,
    /// Threat found, but the tool's policy does not require blocking
    Detected,
    /// Tool policy requires blocking
    Block,
    /// Tool does not handle this scan direction
    Skip,
    /// Tool unreachable, timed out, or missing prerequisites
    Error,
}

impl Verdict {
    /// Only `Block` may stop a feature pipeline.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Block)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Detected => "detected",
            Verdict::Block => "block",
            Verdict::Skip => "skip",
            Verdict::Error => "error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the aggregate outcome was logged before `scan` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Await the audit write before returning to the caller
    Sync,
    /// Hand the audit write to a background task
    #[default]
    Async,
}

/// A piece of content submitted to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub content: String,
    pub scan_type: ScanType,
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_run_id: Option<Uuid>,
    /// `None` defers to the orchestrator's configured default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_mode: Option<LogMode>,
}

impl ScanRequest {
    /// Create an input scan request
    pub fn input(content: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::new(content, ScanType::Input, feature)
    }

    /// Create an output scan request
    pub fn output(content: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::new(content, ScanType::Output, feature)
    }

    pub fn new(content: impl Into<String>, scan_type: ScanType, feature: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            scan_type,
            feature: feature.into(),
            original_prompt: None,
            agent_run_id: None,
            log_mode: None,
        }
    }

    /// Attach the prompt that produced this output
    pub fn with_original_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.original_prompt = Some(prompt.into());
        self
    }

    /// Associate the scan with an agent run in the audit trail
    pub fn with_agent_run(mut self, run_id: Uuid) -> Self {
        self.agent_run_id = Some(run_id);
        self
    }

    /// Require the audit record to be written before `scan` returns
    pub fn audited(mut self) -> Self {
        self.log_mode = Some(LogMode::Sync);
        self
    }

    pub fn with_log_mode(mut self, mode: LogMode) -> Self {
        self.log_mode = Some(mode);
        self
    }
}

/// Result of one tool's scan
///
/// Adapters build these with the verdict constructors; the orchestrator stamps
/// `tool_name`, `display_name` and `scan_time_ms` once the call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub tool_name: String,
    pub display_name: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub scan_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ScanResult {
    fn with_verdict(verdict: Verdict, reason: Option<String>) -> Self {
        Self {
            tool_name: String::new(),
            display_name: String::new(),
            verdict,
            reason,
            scan_time_ms: 0,
            details: None,
        }
    }

    /// Create a "pass" result
    pub fn pass() -> Self {
        Self::with_verdict(Verdict::Pass, None)
    }

    /// Create a non-blocking "detected" result
    pub fn detected(reason: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Detected, Some(reason.into()))
    }

    /// Create a "block" result
    pub fn block(reason: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Block, Some(reason.into()))
    }

    /// Create a "skip" result for an unsupported scan direction
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Skip, Some(reason.into()))
    }

    /// Create an "error" result (fail open)
    pub fn error(reason: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Error, Some(reason.into()))
    }

    /// Attach the tool's raw response for audit
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Stamp tool identity and measured wall time
    pub fn stamped(
        mut self,
        tool_name: impl Into<String>,
        display_name: impl Into<String>,
        scan_time_ms: u64,
    ) -> Self {
        self.tool_name = tool_name.into();
        self.display_name = display_name.into();
        self.scan_time_ms = scan_time_ms;
        if self.verdict == Verdict::Pass {
            self.reason = None;
        }
        self
    }
}

/// Aggregated outcome of one orchestrator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScanOutcome {
    pub tool_results: HashMap<String, ScanResult>,
    pub blocked: bool,
    /// Display names of blocking tools, in registration order
    pub blocked_by: Vec<String>,
    pub scan_type: ScanType,
    pub feature: String,
}

impl AggregateScanOutcome {
    /// Outcome when no tools are active
    pub fn empty(scan_type: ScanType, feature: impl Into<String>) -> Self {
        Self {
            tool_results: HashMap::new(),
            blocked: false,
            blocked_by: Vec::new(),
            scan_type,
            feature: feature.into(),
        }
    }

    /// Aggregate results given in registration order
    pub fn from_ordered(
        results: Vec<ScanResult>,
        scan_type: ScanType,
        feature: impl Into<String>,
    ) -> Self {
        let blocked_by: Vec<String> = results
            .iter()
            .filter(|r| r.verdict.is_blocking())
            .map(|r| r.display_name.clone())
            .collect();

        let tool_results = results
            .into_iter()
            .map(|r| (r.tool_name.clone(), r))
            .collect();

        Self {
            tool_results,
            blocked: !blocked_by.is_empty(),
            blocked_by,
            scan_type,
            feature: feature.into(),
        }
    }

    /// `Block` if any tool blocked, else `Pass`
    pub fn final_verdict(&self) -> Verdict {
        if self.blocked {
            Verdict::Block
        } else {
            Verdict::Pass
        }
    }

    /// Results carrying the given verdict
    pub fn with_verdict(&self, verdict: Verdict) -> impl Iterator<Item = &ScanResult> {
        self.tool_results.values().filter(move |r| r.verdict == verdict)
    }

    /// User-facing explanation for a blocked outcome
    ///
    /// First blocking tool's reason, then any tool's reason, then a generic message.
    pub fn block_reason(&self) -> String {
        let blocking_reason = self.blocked_by.iter().find_map(|name| {
            self.tool_results
                .values()
                .find(|r| &r.display_name == name && r.verdict.is_blocking())
                .and_then(|r| r.reason.clone())
        });

        if let Some(reason) = blocking_reason {
            return reason;
        }

        let mut with_reason: Vec<&ScanResult> =
            self.tool_results.values().filter(|r| r.reason.is_some()).collect();
        with_reason.sort_by(|a, b| a.tool_name.cmp(&b.tool_name));

        with_reason
            .first()
            .and_then(|r| r.reason.clone())
            .unwrap_or_else(|| "Security violation".to_string())
    }
}
