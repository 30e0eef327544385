//! Scan orchestrator - fans content out to every active tool and aggregates verdicts

use crate::config::Configuration;
use crate::error::GuardError;
use crate::logger::ScanLogger;
use crate::tool::{SecurityTool, ToolRegistry};
use crate::types::{AggregateScanOutcome, LogMode, ScanRequest, ScanResult, ScanType};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Main scan orchestrator
///
/// The Orchestrator runs every registered tool concurrently for each request,
/// isolates per-tool failures, and reduces the results to one pass/block outcome.
pub struct Orchestrator {
    tools: ToolRegistry,
    tool_timeout: Duration,
    default_log_mode: LogMode,
    logger: ScanLogger,
}

impl Orchestrator {
    /// Create a new Orchestrator from configuration and an audit logger
    pub fn new(config: Configuration, logger: ScanLogger) -> Result<Self, GuardError> {
        if config.tool_timeout.is_zero() {
            return Err(GuardError::Config(
                "Tool timeout must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for tool in config.tools.tools() {
            if !seen.insert(tool.tool_name()) {
                return Err(GuardError::ToolInit(format!(
                    "duplicate tool name '{}'",
                    tool.tool_name()
                )));
            }
            tool.validate_config()?;
        }

        debug!(tools = ?config.tools.names(), "orchestrator configured");

        Ok(Self {
            tools: config.tools,
            tool_timeout: config.tool_timeout,
            default_log_mode: config.default_log_mode,
            logger: logger.with_preview_chars(config.preview_chars),
        })
    }

    /// Active tools in fan-out order
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    /// Scan content with every active tool
    ///
    /// Tools run in parallel; each is bounded by the tool timeout. The outcome is
    /// recorded through the logger before or after returning according to the
    /// request's log mode.
    #[instrument(skip(self, request), fields(feature = %request.feature, scan_type = %request.scan_type))]
    pub async fn scan(&self, request: ScanRequest) -> AggregateScanOutcome {
        let outcome = self.fan_out(&request).await;

        if outcome.blocked {
            info!(blocked_by = ?outcome.blocked_by, "content blocked");
        }

        let mode = request.log_mode.unwrap_or(self.default_log_mode);
        self.logger.record(&request, &outcome, mode).await;

        outcome
    }

    async fn fan_out(&self, request: &ScanRequest) -> AggregateScanOutcome {
        let tools = self.tools.tools();

        if tools.is_empty() {
            return AggregateScanOutcome::empty(request.scan_type, request.feature.clone());
        }

        let started = Instant::now();
        let content: Arc<str> = Arc::from(request.content.as_str());
        let prompt: Option<Arc<str>> = request.original_prompt.as_deref().map(Arc::from);

        let mut join_set = JoinSet::new();

        for (idx, tool) in tools.iter().enumerate() {
            let tool = Arc::clone(tool);
            let content = Arc::clone(&content);
            let prompt = prompt.clone();
            let scan_type = request.scan_type;
            let timeout = self.tool_timeout;

            join_set.spawn(async move {
                let result = run_tool(tool.as_ref(), &content, scan_type, prompt.as_deref(), timeout).await;
                (idx, result)
            });
        }

        // Slots keep registration order regardless of completion order
        let mut slots: Vec<Option<ScanResult>> = vec![None; tools.len()];
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => error!("Tool task join error: {}", e),
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let results = slots
            .into_iter()
            .zip(tools)
            .map(|(slot, tool)| {
                slot.unwrap_or_else(|| {
                    ScanResult::error("Tool task aborted").stamped(
                        tool.tool_name(),
                        tool.display_name(),
                        elapsed_ms,
                    )
                })
            })
            .collect();

        AggregateScanOutcome::from_ordered(results, request.scan_type, request.feature.clone())
    }
}

/// Run one tool under the timeout, converting every failure into an `error` verdict
async fn run_tool(
    tool: &dyn SecurityTool,
    content: &str,
    scan_type: ScanType,
    original_prompt: Option<&str>,
    timeout: Duration,
) -> ScanResult {
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, tool.scan(content, scan_type, original_prompt)).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(tool = tool.tool_name(), "Tool scan failed: {}", e);
            ScanResult::error(e.to_string())
        }
        Err(_) => {
            warn!(tool = tool.tool_name(), ?timeout, "Tool scan timed out");
            ScanResult::error("timeout")
        }
    };

    debug!(
        tool = tool.tool_name(),
        verdict = %result.verdict,
        elapsed_ms,
        "tool scan finished"
    );

    result.stamped(tool.tool_name(), tool.display_name(), elapsed_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogSink;
    use crate::tool::ToolError;
    use crate::types::Verdict;
    use async_trait::async_trait;

    // Mock tool for testing
    struct MockTool {
        name: String,
        display: String,
        result: ScanResult,
        delay: Duration,
    }

    impl MockTool {
        fn new(name: &str, result: ScanResult) -> Arc<dyn SecurityTool> {
            Arc::new(Self {
                name: name.to_string(),
                display: name.to_uppercase(),
                result,
                delay: Duration::ZERO,
            })
        }

        fn slow(name: &str, result: ScanResult, delay: Duration) -> Arc<dyn SecurityTool> {
            Arc::new(Self {
                name: name.to_string(),
                display: name.to_uppercase(),
                result,
                delay,
            })
        }
    }

    #[async_trait]
    impl SecurityTool for MockTool {
        fn tool_name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            &self.display
        }

        async fn scan(
            &self,
            _content: &str,
            _scan_type: ScanType,
            _original_prompt: Option<&str>,
        ) -> Result<ScanResult, ToolError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.result.clone())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl SecurityTool for FailingTool {
        fn tool_name(&self) -> &str {
            "failing"
        }

        fn display_name(&self) -> &str {
            "Failing"
        }

        async fn scan(
            &self,
            _content: &str,
            _scan_type: ScanType,
            _original_prompt: Option<&str>,
        ) -> Result<ScanResult, ToolError> {
            Err(ToolError::Api("503 Service Unavailable".to_string()))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl SecurityTool for PanickingTool {
        fn tool_name(&self) -> &str {
            "panicking"
        }

        fn display_name(&self) -> &str {
            "Panicking"
        }

        async fn scan(
            &self,
            _content: &str,
            _scan_type: ScanType,
            _original_prompt: Option<&str>,
        ) -> Result<ScanResult, ToolError> {
            panic!("adapter bug")
        }
    }

    struct InvalidTool;

    #[async_trait]
    impl SecurityTool for InvalidTool {
        fn tool_name(&self) -> &str {
            "invalid"
        }

        fn display_name(&self) -> &str {
            "Invalid"
        }

        async fn scan(
            &self,
            _content: &str,
            _scan_type: ScanType,
            _original_prompt: Option<&str>,
        ) -> Result<ScanResult, ToolError> {
            Ok(ScanResult::pass())
        }

        fn validate_config(&self) -> Result<(), ToolError> {
            Err(ToolError::Config("threshold out of range".to_string()))
        }
    }

    fn orchestrator(tools: Vec<Arc<dyn SecurityTool>>) -> Orchestrator {
        let config = Configuration::new().add_tools(tools);
        Orchestrator::new(config, ScanLogger::new(Arc::new(MemoryLogSink::new()))).unwrap()
    }

    #[tokio::test]
    async fn test_no_tools_fails_open() {
        let orch = orchestrator(vec![]);
        let outcome = orch.scan(ScanRequest::input("anything", "test")).await;

        assert!(!outcome.blocked);
        assert!(outcome.tool_results.is_empty());
        assert!(outcome.blocked_by.is_empty());
    }

    #[tokio::test]
    async fn test_single_tool_block() {
        let orch = orchestrator(vec![MockTool::new("guard", ScanResult::block("injection"))]);
        let outcome = orch.scan(ScanRequest::input("test", "test")).await;

        assert!(outcome.blocked);
        assert_eq!(outcome.blocked_by, vec!["GUARD"]);
        assert_eq!(outcome.tool_results["guard"].verdict, Verdict::Block);
    }

    #[tokio::test]
    async fn test_parallel_tools_block_priority() {
        let orch = orchestrator(vec![
            MockTool::new("allow", ScanResult::pass()),
            MockTool::new("block", ScanResult::block("blocked")),
        ]);

        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        assert!(outcome.blocked);
        assert_eq!(outcome.blocked_by, vec!["BLOCK"]);
        assert_eq!(outcome.tool_results.len(), 2);
    }

    #[tokio::test]
    async fn test_detected_is_not_blocking() {
        let orch = orchestrator(vec![
            MockTool::new("allow", ScanResult::pass()),
            MockTool::new("flag", ScanResult::detected("pii present")),
        ]);

        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        assert!(!outcome.blocked);
        assert_eq!(outcome.tool_results["flag"].verdict, Verdict::Detected);
    }

    #[tokio::test]
    async fn test_blocked_by_follows_registration_not_completion() {
        // The first-registered tool finishes last
        let orch = orchestrator(vec![
            MockTool::slow("slow", ScanResult::block("a"), Duration::from_millis(50)),
            MockTool::new("fast", ScanResult::block("b")),
        ]);

        for _ in 0..5 {
            let outcome = orch.scan(ScanRequest::input("test", "test")).await;
            assert_eq!(outcome.blocked_by, vec!["SLOW", "FAST"]);
        }
    }

    #[tokio::test]
    async fn test_tool_error_is_isolated() {
        let orch = orchestrator(vec![
            Arc::new(FailingTool),
            MockTool::new("guard", ScanResult::block("injection")),
        ]);

        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        assert!(outcome.blocked);
        let failing = &outcome.tool_results["failing"];
        assert_eq!(failing.verdict, Verdict::Error);
        assert!(failing.reason.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_panicking_tool_degrades_to_error() {
        let orch = orchestrator(vec![
            Arc::new(PanickingTool),
            MockTool::new("ok", ScanResult::pass()),
        ]);

        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        assert!(!outcome.blocked);
        assert_eq!(outcome.tool_results["panicking"].verdict, Verdict::Error);
        assert_eq!(outcome.tool_results["ok"].verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn test_timeout_bounds_scan() {
        let config = Configuration::new()
            .add_tool(MockTool::slow("hung", ScanResult::pass(), Duration::from_secs(30)))
            .add_tool(MockTool::new("quick", ScanResult::block("found")))
            .with_tool_timeout(Duration::from_millis(100));
        let orch = Orchestrator::new(config, ScanLogger::new(Arc::new(MemoryLogSink::new()))).unwrap();

        let start = Instant::now();
        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        assert!(start.elapsed() < Duration::from_secs(2));

        let hung = &outcome.tool_results["hung"];
        assert_eq!(hung.verdict, Verdict::Error);
        assert_eq!(hung.reason.as_deref(), Some("timeout"));
        assert_eq!(outcome.tool_results["quick"].verdict, Verdict::Block);
        assert!(outcome.blocked);
    }

    #[tokio::test]
    async fn test_scan_time_is_stamped() {
        let orch = orchestrator(vec![MockTool::slow(
            "slowish",
            ScanResult::pass(),
            Duration::from_millis(20),
        )]);

        let outcome = orch.scan(ScanRequest::input("test", "test")).await;
        let result = &outcome.tool_results["slowish"];
        assert!(result.scan_time_ms >= 20);
        assert_eq!(result.display_name, "SLOWISH");
    }

    #[tokio::test]
    async fn test_invalid_tool_config_rejected() {
        let config = Configuration::new().add_tool(Arc::new(InvalidTool));
        let result = Orchestrator::new(config, ScanLogger::tracing());
        assert!(matches!(result, Err(GuardError::Tool(_))));
    }

    #[tokio::test]
    async fn test_duplicate_tool_names_rejected() {
        let config = Configuration::new()
            .add_tool(MockTool::new("dup", ScanResult::block("a")))
            .add_tool(MockTool::new("dup", ScanResult::pass()));
        let result = Orchestrator::new(config, ScanLogger::tracing());
        assert!(matches!(result, Err(GuardError::ToolInit(ref msg)) if msg.contains("dup")));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let config = Configuration::new().with_tool_timeout(Duration::ZERO);
        assert!(Orchestrator::new(config, ScanLogger::tracing()).is_err());
    }

    #[tokio::test]
    async fn test_audited_scan_is_logged_before_return() {
        let sink = Arc::new(MemoryLogSink::new());
        let config = Configuration::new().add_tool(MockTool::new("guard", ScanResult::block("x")));
        let orch = Orchestrator::new(config, ScanLogger::new(sink.clone())).unwrap();

        let long = "p".repeat(1000);
        orch.scan(ScanRequest::input(long, "clinical_assistant").audited()).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].final_verdict, Verdict::Block);
        assert_eq!(entries[0].content_preview.chars().count(), 200);
    }
}
