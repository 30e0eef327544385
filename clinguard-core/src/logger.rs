//! Scan audit logging
//!
//! Every orchestrator outcome becomes an immutable [`ScanLogEntry`] handed to an
//! injected [`ScanLogSink`]. Sink failures are reported through `tracing` and
//! never reach the caller.

use crate::error::LogError;
use crate::types::{AggregateScanOutcome, LogMode, ScanRequest, ScanResult, ScanType, Verdict};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Immutable audit record of one orchestrator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub feature: String,
    pub scan_type: ScanType,
    /// Bounded prefix of the scanned content
    pub content_preview: String,
    pub tool_results: HashMap<String, ScanResult>,
    pub final_verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_run_id: Option<Uuid>,
}

impl ScanLogEntry {
    pub fn new(request: &ScanRequest, outcome: &AggregateScanOutcome, preview_chars: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            feature: request.feature.clone(),
            scan_type: request.scan_type,
            content_preview: preview(&request.content, preview_chars),
            tool_results: outcome.tool_results.clone(),
            final_verdict: outcome.final_verdict(),
            agent_run_id: request.agent_run_id,
        }
    }
}

/// First `max_chars` characters of `content`, on a char boundary
pub fn preview(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

/// Destination for audit records
#[async_trait]
pub trait ScanLogSink: Send + Sync {
    async fn append(&self, entry: ScanLogEntry) -> Result<(), LogError>;
}

/// Sink that emits each record as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl ScanLogSink for TracingLogSink {
    async fn append(&self, entry: ScanLogEntry) -> Result<(), LogError> {
        let tool_results = serde_json::to_string(&entry.tool_results)?;
        info!(
            target: "clinguard::audit",
            id = %entry.id,
            feature = %entry.feature,
            scan_type = %entry.scan_type,
            final_verdict = %entry.final_verdict,
            agent_run_id = ?entry.agent_run_id,
            preview = %entry.content_preview,
            tool_results = %tool_results,
            "security scan"
        );
        Ok(())
    }
}

/// In-memory sink for tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<ScanLogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in append order
    pub fn entries(&self) -> Vec<ScanLogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records matching an optional feature and final verdict
    pub fn filter(&self, feature: Option<&str>, verdict: Option<Verdict>) -> Vec<ScanLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| feature.map_or(true, |f| e.feature == f))
            .filter(|e| verdict.map_or(true, |v| e.final_verdict == v))
            .collect()
    }

    /// Records belonging to one agent run
    pub fn for_run(&self, run_id: Uuid) -> Vec<ScanLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.agent_run_id == Some(run_id))
            .collect()
    }
}

#[async_trait]
impl ScanLogSink for MemoryLogSink {
    async fn append(&self, entry: ScanLogEntry) -> Result<(), LogError> {
        self.entries.lock().push(entry);
        Ok(())
    }
}

/// Writes audit records for the orchestrator
#[derive(Clone)]
pub struct ScanLogger {
    sink: Arc<dyn ScanLogSink>,
    preview_chars: usize,
}

impl ScanLogger {
    pub fn new(sink: Arc<dyn ScanLogSink>) -> Self {
        Self {
            sink,
            preview_chars: crate::config::DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Logger backed by [`TracingLogSink`]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingLogSink))
    }

    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Record one outcome
    ///
    /// `Sync` awaits the write; `Async` hands it to a background task. Either way
    /// a sink failure is only reported.
    pub async fn record(&self, request: &ScanRequest, outcome: &AggregateScanOutcome, mode: LogMode) {
        let entry = ScanLogEntry::new(request, outcome, self.preview_chars);

        match mode {
            LogMode::Sync => write_entry(self.sink.as_ref(), entry).await,
            LogMode::Async => {
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    write_entry(sink.as_ref(), entry).await;
                });
            }
        }
    }
}

async fn write_entry(sink: &dyn ScanLogSink, entry: ScanLogEntry) {
    let id = entry.id;
    let feature = entry.feature.clone();
    match sink.append(entry).await {
        Ok(()) => debug!(%id, %feature, "scan log written"),
        Err(e) => warn!(%id, %feature, "Failed to write scan log: {}", e),
    }
}

impl Default for ScanLogger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for ScanLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLogger")
            .field("preview_chars", &self.preview_chars)
            .finish()
    }
}
