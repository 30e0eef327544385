//! # clinguard-core
//!
//! Core types and traits for the clinguard content-security pipeline.
//!
//! This crate provides the building blocks every LLM-facing feature scans through:
//! - **Type System**: ScanRequest, Verdict, ScanResult and the aggregate outcome
//! - **SecurityTool Trait**: Async interface for implementing tool adapters
//! - **Orchestrator**: Runs all active tools concurrently and aggregates verdicts
//! - **Scan Logger**: Audit records through an injected sink
//! - **Configuration**: Builder pattern for the fan-out set and its bounds
//!
//! ## Example
//!
//! ```rust,ignore
//! use clinguard_core::{Configuration, Orchestrator, ScanLogger, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Configuration::new();
//!     let orchestrator = Orchestrator::new(config, ScanLogger::tracing()).unwrap();
//!
//!     let outcome = orchestrator
//!         .scan(ScanRequest::input("What is the A1C target?", "clinical_assistant"))
//!         .await;
//!
//!     println!("Blocked: {}", outcome.blocked);
//! }
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod stats;
pub mod tool;
pub mod types;

// Re-export commonly used types
pub use config::Configuration;
pub use error::{GuardError, LogError};
pub use logger::{MemoryLogSink, ScanLogEntry, ScanLogSink, ScanLogger, TracingLogSink};
pub use orchestrator::Orchestrator;
pub use stats::{ScanStats, ToolStats};
pub use tool::{SecurityTool, ToolError, ToolRegistry};
pub use types::{AggregateScanOutcome, LogMode, ScanRequest, ScanResult, ScanType, Verdict};
