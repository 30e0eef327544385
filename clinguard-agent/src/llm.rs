//! Language model collaborator

use crate::error::LlmError;
use async_trait::async_trait;

/// `blocked_by` entry reported when the model provider refuses a call
pub const INLINE_GUARDRAIL: &str = "Inline Guardrail";

/// Text generation backend the agent reasons with
///
/// Implementations own transport, model selection and retries. A provider-side
/// refusal is reported as [`LlmError::GuardrailBlocked`] so the run can treat it
/// like a blocking scan.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, system: &str, temperature: f32) -> Result<String, LlmError>;

    /// Model identifier for logs
    fn model_name(&self) -> &str {
        "unknown"
    }
}
