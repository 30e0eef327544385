//! Local pattern-based guard
//!
//! Matches content against categorized regular expressions: prompt-injection
//! phrasing, patient PII, and leaked credentials. Each category can be set to
//! block or only flag.

use crate::policy::BlockPolicy;
use crate::settings::Settings;
use async_trait::async_trait;
use clinguard_core::{ScanResult, ScanType, SecurityTool, ToolError};
use regex::RegexSet;
use serde_json::json;
use tracing::debug;

pub const PROMPT_INJECTION: &str = "prompt_injection";
pub const PII: &str = "pii";
pub const CREDENTIALS: &str = "credentials";

/// Default patterns as (category, name, pattern)
const DEFAULT_PATTERNS: &[(&str, &str, &str)] = &[
    (
        PROMPT_INJECTION,
        "instruction_override",
        r"(?i)(ignore|disregard|forget)\s+(all\s+|any\s+)?(previous|prior|above|former)\s+(instructions|directives|rules)",
    ),
    (
        PROMPT_INJECTION,
        "system_prompt_probe",
        r"(?i)(reveal|print|show|repeat)\s+(me\s+)?(your|the)\s+(system\s+prompt|hidden\s+instructions)",
    ),
    (
        PROMPT_INJECTION,
        "role_hijack",
        r"(?i)you\s+are\s+now\s+(in\s+)?(developer|dan|jailbreak|unrestricted)\s*(mode)?",
    ),
    (
        PII,
        "email_address",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    ),
    (
        PII,
        "phone_number",
        r"\b(\+\d{1,2}\s?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b",
    ),
    (PII, "social_security_number", r"\b\d{3}-\d{2}-\d{4}\b"),
    (PII, "medical_record_number", r"(?i)\bMRN[:#\s]*\d{6,10}\b"),
    (PII, "credit_card", r"\b(?:\d{4}[- ]?){3}\d{4}\b"),
    (
        CREDENTIALS,
        "api_key",
        r#"(?i)(api[_\-]?key|apikey)\s*[:=]\s*['"]?([a-zA-Z0-9_\-]{16,})"#,
    ),
    (
        CREDENTIALS,
        "password",
        r#"(?i)(secret|password)\s*[:=]\s*['"]?([^\s'"]{8,})"#,
    ),
    (CREDENTIALS, "aws_access_key", r"AKIA[0-9A-Z]{16}"),
    (CREDENTIALS, "private_key", r"-----BEGIN (RSA |EC )?PRIVATE KEY-----"),
    (
        CREDENTIALS,
        "jwt",
        r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
    ),
];

/// One named pattern and the category it reports under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub category: String,
    pub name: String,
    pub pattern: String,
}

impl PatternRule {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Regex guard with a per-category block policy
#[derive(Debug)]
pub struct PatternGuard {
    patterns: RegexSet,
    rules: Vec<PatternRule>,
    policy: BlockPolicy,
}

impl PatternGuard {
    /// Guard with the default rules and default policy
    pub fn new() -> Result<Self, ToolError> {
        let rules = DEFAULT_PATTERNS
            .iter()
            .map(|&(category, name, pattern)| PatternRule::new(category, name, pattern))
            .collect();
        Self::with_rules(rules)
    }

    /// Guard with custom rules
    pub fn with_rules(rules: Vec<PatternRule>) -> Result<Self, ToolError> {
        if rules.is_empty() {
            return Err(ToolError::Config(
                "At least one pattern is required".to_string(),
            ));
        }

        let patterns = RegexSet::new(rules.iter().map(|r| r.pattern.as_str()))
            .map_err(|e| ToolError::Config(format!("Invalid regex pattern: {}", e)))?;

        Ok(Self {
            patterns,
            rules,
            policy: Self::default_policy(),
        })
    }

    /// Injection attempts and leaked credentials block; PII is flagged
    pub fn default_policy() -> BlockPolicy {
        BlockPolicy::from_names([PROMPT_INJECTION, CREDENTIALS])
    }

    pub fn with_policy(mut self, policy: BlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &BlockPolicy {
        &self.policy
    }

    /// Active when enabled in settings
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        if !settings.pattern_guard {
            return None;
        }

        let guard = match Self::new() {
            Ok(guard) => guard,
            Err(e) => {
                debug!("Pattern guard excluded: {}", e);
                return None;
            }
        };

        Some(match &settings.pattern_block {
            Some(names) => guard.with_policy(BlockPolicy::from_names(names)),
            None => guard,
        })
    }

    /// Rules matching `text`, in rule order
    fn matching_rules(&self, text: &str) -> Vec<&PatternRule> {
        self.patterns
            .matches(text)
            .into_iter()
            .map(|idx| &self.rules[idx])
            .collect()
    }
}

#[async_trait]
impl SecurityTool for PatternGuard {
    fn tool_name(&self) -> &str {
        "pattern_guard"
    }

    fn display_name(&self) -> &str {
        "Pattern Guard"
    }

    async fn scan(
        &self,
        content: &str,
        _scan_type: ScanType,
        _original_prompt: Option<&str>,
    ) -> Result<ScanResult, ToolError> {
        let matched = self.matching_rules(content);

        if matched.is_empty() {
            return Ok(ScanResult::pass());
        }

        let mut categories: Vec<&str> = Vec::new();
        for rule in &matched {
            if !categories.contains(&rule.category.as_str()) {
                categories.push(&rule.category);
            }
        }

        let names: Vec<&str> = matched.iter().map(|r| r.name.as_str()).collect();
        let details = json!({
            "categories": categories,
            "matches": matched
                .iter()
                .map(|r| json!({ "category": r.category, "pattern": r.name }))
                .collect::<Vec<_>>(),
        });

        let reason = format!(
            "Pattern match: {} ({})",
            names.join(", "),
            categories.join(", ")
        );

        let result = if self.policy.blocks_any(categories.iter().copied()) {
            ScanResult::block(reason)
        } else {
            ScanResult::detected(reason)
        };

        Ok(result.with_details(details))
    }
}
