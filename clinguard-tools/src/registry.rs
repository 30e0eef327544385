//! Active-tool discovery
//!
//! Builds the ordered fan-out set from [`Settings`]. Each provider is a presence
//! check: it returns a tool only when that tool's configuration is complete.
//! Adding a tool kind means adding one provider to [`PROVIDERS`].

use crate::hidden_text_guard::HiddenTextGuard;
use crate::input_guardrail::InputGuardrailTool;
use crate::pattern_guard::PatternGuard;
use crate::prompt_analyzer::PromptAnalyzerTool;
use crate::settings::Settings;
use clinguard_core::{Configuration, SecurityTool, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Presence-checking constructor for one tool kind
pub type ToolProvider = fn(&Settings) -> Option<Arc<dyn SecurityTool>>;

/// Providers in registration order
pub const PROVIDERS: &[(&str, ToolProvider)] = &[
    ("pattern_guard", pattern_guard),
    ("hidden_text", hidden_text),
    ("prompt_analyzer", prompt_analyzer),
    ("input_guardrail", input_guardrail),
];

fn pattern_guard(settings: &Settings) -> Option<Arc<dyn SecurityTool>> {
    PatternGuard::from_settings(settings).map(|t| Arc::new(t) as Arc<dyn SecurityTool>)
}

fn hidden_text(settings: &Settings) -> Option<Arc<dyn SecurityTool>> {
    HiddenTextGuard::from_settings(settings).map(|t| Arc::new(t) as Arc<dyn SecurityTool>)
}

fn prompt_analyzer(settings: &Settings) -> Option<Arc<dyn SecurityTool>> {
    PromptAnalyzerTool::from_settings(settings).map(|t| Arc::new(t) as Arc<dyn SecurityTool>)
}

fn input_guardrail(settings: &Settings) -> Option<Arc<dyn SecurityTool>> {
    InputGuardrailTool::from_settings(settings).map(|t| Arc::new(t) as Arc<dyn SecurityTool>)
}

/// Every fully configured tool, in registration order
pub fn active_tools(settings: &Settings) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for (name, provider) in PROVIDERS {
        match provider(settings) {
            Some(tool) => registry.push(tool),
            None => debug!(tool = *name, "tool not configured, excluded"),
        }
    }

    info!(tools = ?registry.names(), "active security tools");
    registry
}

/// Orchestrator configuration for the active tools and any timeout override
pub fn configuration(settings: &Settings) -> Configuration {
    let config = Configuration::from_registry(active_tools(settings));
    match settings.tool_timeout() {
        Some(timeout) => config.with_tool_timeout(timeout),
        None => config,
    }
}
