//! Error types for clinguard-core

use thiserror::Error;

/// Top-level pipeline errors
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool initialization failed: {0}")]
    ToolInit(String),

    #[error(transparent)]
    Tool(#[from] crate::tool::ToolError),
}

/// Audit sink errors
///
/// Never escalated to callers: the logger reports these and carries on.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log write failed: {0}")]
    Write(String),

    #[error("Log serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
