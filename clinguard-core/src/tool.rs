//! Security tool trait and registry
//!
//! This module defines the capability every scanning tool adapter implements,
//! the adapter-level error type, and the ordered registry the orchestrator fans
//! out over.

use crate::types::{ScanResult, ScanType};
use async_trait::async_trait;
use std::sync::Arc;

/// Core security tool trait
///
/// Tools inspect content and return a verdict. A tool that detects a problem
/// consults its own block policy to choose between `block` and `detected`; the
/// orchestrator never second-guesses that choice.
#[async_trait]
pub trait SecurityTool: Send + Sync {
    /// Short identifier used as the key in results and logs, e.g. `pattern_guard`
    fn tool_name(&self) -> &str;

    /// Human-readable name surfaced to users when the tool blocks
    fn display_name(&self) -> &str;

    /// Scan content
    ///
    /// # Arguments
    /// * `content` - The text to scan
    /// * `scan_type` - Direction of the scan
    /// * `original_prompt` - Prompt that produced `content`, for output scans
    ///
    /// # Returns
    /// A `ScanResult` carrying the tool's verdict. Errors are converted by the
    /// orchestrator into an `error` verdict for this tool only.
    async fn scan(
        &self,
        content: &str,
        scan_type: ScanType,
        original_prompt: Option<&str>,
    ) -> Result<ScanResult, ToolError>;

    /// Tool-specific configuration validation
    fn validate_config(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Tool adapter errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("External API call failed: {0}")]
    Api(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered set of live tools
///
/// Registration order is preserved and determines `blocked_by` ordering.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn SecurityTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool at the end of the fan-out order
    pub fn register(mut self, tool: Arc<dyn SecurityTool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Register a tool in place
    pub fn push(&mut self, tool: Arc<dyn SecurityTool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Arc<dyn SecurityTool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool_name()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl FromIterator<Arc<dyn SecurityTool>> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn SecurityTool>>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;

    struct MockTool {
        name: String,
        result: ScanResult,
    }

    #[async_trait]
    impl SecurityTool for MockTool {
        fn tool_name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            "Mock Tool"
        }

        async fn scan(
            &self,
            _content: &str,
            _scan_type: ScanType,
            _original_prompt: Option<&str>,
        ) -> Result<ScanResult, ToolError> {
            Ok(self.result.clone())
        }
    }

    fn mock(name: &str) -> Arc<dyn SecurityTool> {
        Arc::new(MockTool {
            name: name.to_string(),
            result: ScanResult::pass(),
        })
    }

    #[tokio::test]
    async fn test_mock_tool() {
        let tool = MockTool {
            name: "test".to_string(),
            result: ScanResult::detected("flag"),
        };

        let result = tool.scan("content", ScanType::Input, None).await.unwrap();
        assert_eq!(result.verdict, Verdict::Detected);
        assert!(tool.validate_config().is_ok());
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = ToolRegistry::new()
            .register(mock("b"))
            .register(mock("a"))
            .register(mock("c"));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_registry_from_iter() {
        let registry: ToolRegistry = vec![mock("x"), mock("y")].into_iter().collect();
        assert_eq!(registry.names(), vec!["x", "y"]);
        assert!(!registry.is_empty());
        assert!(ToolRegistry::default().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = ToolError::Api("503".to_string());
        assert_eq!(err.to_string(), "External API call failed: 503");
    }
}
