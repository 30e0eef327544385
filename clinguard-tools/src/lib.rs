//! # clinguard-tools
//!
//! Security tool adapters for clinguard.
//!
//! This crate provides the concrete tools and the discovery that decides which
//! of them are live:
//! - **PatternGuard**: Categorized regex detection with a per-category block policy
//! - **HiddenTextGuard**: Detection of invisible Unicode tag characters
//! - **PromptAnalyzerTool**: Hosted threat-category analyzer (input and output)
//! - **InputGuardrailTool**: Hosted allow/deny guardrail (input only)
//! - **active_tools**: Ordered registry of every fully configured tool

pub mod hidden_text_guard;
pub mod input_guardrail;
pub mod pattern_guard;
pub mod policy;
pub mod prompt_analyzer;
pub mod registry;
pub mod settings;

pub use hidden_text_guard::HiddenTextGuard;
pub use input_guardrail::InputGuardrailTool;
pub use pattern_guard::{PatternGuard, PatternRule};
pub use policy::BlockPolicy;
pub use prompt_analyzer::PromptAnalyzerTool;
pub use registry::{active_tools, configuration, ToolProvider, PROVIDERS};
pub use settings::Settings;
