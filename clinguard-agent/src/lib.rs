//! # clinguard-agent
//!
//! Security-scanned autonomous agent loop.
//!
//! An agent run repeatedly asks a language model what to do next, scans the
//! reasoning, and either calls a tool (scanning its arguments and result), ends
//! with an answer, or escalates to a human. Runs are bounded by an iteration
//! budget and a repeated-call detector, and stream their progress as typed
//! [`AgentEvent`]s.
//!
//! ## Example
//!
//! ```rust,ignore
//! use clinguard_agent::{AgentDeps, AgentRunner, MemoryRunStore, ToolCatalog};
//!
//! let runner = AgentRunner::new(AgentDeps {
//!     orchestrator,
//!     llm,
//!     tools: Arc::new(ToolCatalog::new()),
//!     store: Arc::new(MemoryRunStore::new()),
//! });
//!
//! let mut stream = runner.run_agent("patient_monitor", None)?;
//! while let Some(event) = stream.next().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod config;
pub mod decision;
pub mod error;
pub mod events;
pub mod executor;
pub mod llm;
pub mod loop_detector;
pub mod memory;
pub mod profile;
pub mod prompt;
pub mod runner;
pub mod store;
pub mod types;

pub use config::AgentConfig;
pub use decision::{parse_decision, Decision, ParsedDecision};
pub use error::{AgentError, LlmError, StoreError, ToolExecError};
pub use events::{AgentEvent, AgentRunStream};
pub use executor::{FnHandler, ToolCatalog, ToolExecutor, ToolHandler, ToolSpec};
pub use llm::{LanguageModel, INLINE_GUARDRAIL};
pub use loop_detector::{CallSignature, LoopDetector};
pub use memory::{Memory, Observation};
pub use profile::{builtin_profiles, AgentProfile};
pub use runner::{AgentDeps, AgentRunner};
pub use store::{MemoryRunStore, RunStore};
pub use types::{AgentRun, AgentStep, RunStatus, ScanStage, StepKind};
