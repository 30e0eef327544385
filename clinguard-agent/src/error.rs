//! Error types for clinguard-agent

use thiserror::Error;
use uuid::Uuid;

/// Language model collaborator failures
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    /// The model provider's own inline guardrail refused the prompt or answer
    #[error("Blocked by inline guardrail: {reason}")]
    GuardrailBlocked { reason: String },
}

/// Agent tool execution failures
///
/// These never end a run: they are fed back to the model as an observation.
#[derive(Debug, Clone, Error)]
pub enum ToolExecError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool {tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("Tool {0} timed out")]
    Timeout(String),
}

/// Run store failures
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Run store unavailable: {0}")]
    Unavailable(String),

    #[error("Run not found: {0}")]
    NotFound(Uuid),
}

/// Errors returned before a run starts
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unknown agent type: {0}")]
    UnknownAgent(String),

    #[error("No task given and agent {0} has no default task")]
    MissingTask(String),

    #[error("Invalid agent configuration: {0}")]
    Config(String),
}
