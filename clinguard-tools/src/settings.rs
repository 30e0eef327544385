//! Tool settings
//!
//! Flat, immutable view of everything the tool adapters need. Loaded once at
//! startup, usually from `CLINGUARD_*` environment variables, then shared.

use clinguard_core::GuardError;
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PATTERN_GUARD: &str = "CLINGUARD_PATTERN_GUARD";
pub const ENV_PATTERN_BLOCK: &str = "CLINGUARD_PATTERN_BLOCK";
pub const ENV_HIDDEN_TEXT: &str = "CLINGUARD_HIDDEN_TEXT";
pub const ENV_ANALYZER_URL: &str = "CLINGUARD_ANALYZER_URL";
pub const ENV_ANALYZER_KEY: &str = "CLINGUARD_ANALYZER_KEY";
pub const ENV_ANALYZER_BLOCK: &str = "CLINGUARD_ANALYZER_BLOCK";
pub const ENV_INPUT_GUARD_URL: &str = "CLINGUARD_INPUT_GUARD_URL";
pub const ENV_INPUT_GUARD_KEY: &str = "CLINGUARD_INPUT_GUARD_KEY";
pub const ENV_INPUT_GUARD_TARGET: &str = "CLINGUARD_INPUT_GUARD_TARGET";
pub const ENV_TOOL_TIMEOUT_MS: &str = "CLINGUARD_TOOL_TIMEOUT_MS";

/// Settings for every known tool adapter
///
/// A remote tool is only considered configured when all of its connection
/// fields are present. Block lists hold category names, or `all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pattern_guard: bool,
    /// `None` keeps the pattern guard's default policy
    pub pattern_block: Option<Vec<String>>,
    pub hidden_text: bool,
    pub analyzer_url: Option<String>,
    pub analyzer_key: Option<String>,
    pub analyzer_block: Vec<String>,
    pub input_guard_url: Option<String>,
    pub input_guard_key: Option<String>,
    pub input_guard_target: Option<String>,
    pub tool_timeout_ms: Option<u64>,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, GuardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GuardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tool_timeout_ms = match get(ENV_TOOL_TIMEOUT_MS) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                GuardError::Config(format!("{} must be an integer, got '{}'", ENV_TOOL_TIMEOUT_MS, raw))
            })?),
            None => None,
        };

        Ok(Self {
            pattern_guard: get(ENV_PATTERN_GUARD).map_or(false, |v| parse_flag(&v)),
            pattern_block: get(ENV_PATTERN_BLOCK).map(|v| split_list(&v)),
            hidden_text: get(ENV_HIDDEN_TEXT).map_or(false, |v| parse_flag(&v)),
            analyzer_url: get(ENV_ANALYZER_URL),
            analyzer_key: get(ENV_ANALYZER_KEY),
            analyzer_block: get(ENV_ANALYZER_BLOCK)
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            input_guard_url: get(ENV_INPUT_GUARD_URL),
            input_guard_key: get(ENV_INPUT_GUARD_KEY),
            input_guard_target: get(ENV_INPUT_GUARD_TARGET),
            tool_timeout_ms,
        })
    }

    /// Per-tool timeout override
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
