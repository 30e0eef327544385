//! Configuration types for the Orchestrator

use crate::tool::{SecurityTool, ToolRegistry};
use crate::types::LogMode;
use std::sync::Arc;
use std::time::Duration;

/// Default per-tool scan timeout
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default length of the content preview kept in audit records
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Orchestrator configuration
///
/// Configuration defines which tools are live and how each fan-out is bounded.
/// All registered tools run in parallel for every scan request.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub tools: ToolRegistry,
    pub tool_timeout: Duration,
    pub preview_chars: usize,
    pub default_log_mode: LogMode,
}

impl Configuration {
    /// Create new empty configuration
    pub fn new() -> Self {
        Self {
            tools: ToolRegistry::new(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            default_log_mode: LogMode::Async,
        }
    }

    /// Start from an already discovered registry
    pub fn from_registry(tools: ToolRegistry) -> Self {
        Self {
            tools,
            ..Self::new()
        }
    }

    /// Add a tool at the end of the fan-out order
    ///
    /// # Example
    /// ```rust,ignore
    /// let config = Configuration::new()
    ///     .add_tool(Arc::new(PatternGuard::new()?));
    /// ```
    pub fn add_tool(mut self, tool: Arc<dyn SecurityTool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add multiple tools, preserving their order
    pub fn add_tools(mut self, tools: Vec<Arc<dyn SecurityTool>>) -> Self {
        for tool in tools {
            self.tools.push(tool);
        }
        self
    }

    /// Set per-tool timeout (default: 30s)
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set audit preview length in characters (default: 200)
    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Set the log mode used when a request does not pick one (default: async)
    pub fn with_default_log_mode(mut self, mode: LogMode) -> Self {
        self.default_log_mode = mode;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
