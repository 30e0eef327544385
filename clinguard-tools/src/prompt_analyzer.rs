//! Remote prompt analyzer adapter
//!
//! Sends prompts (and, for output scans, the prompt/answer pair) to a hosted
//! analyzer that reports which threat categories it detected. Whether a
//! detection blocks is decided locally by the configured category policy.

use crate::policy::BlockPolicy;
use crate::settings::Settings;
use async_trait::async_trait;
use clinguard_core::{ScanResult, ScanType, SecurityTool, ToolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerRequest<'a> {
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<&'a str>,
}

impl<'a> AnalyzerRequest<'a> {
    /// Build the body for one scan direction
    ///
    /// Output scans analyze the answer together with the prompt that produced
    /// it, so the prompt is mandatory there.
    pub fn for_scan(
        content: &'a str,
        scan_type: ScanType,
        original_prompt: Option<&'a str>,
    ) -> Option<Self> {
        match scan_type {
            ScanType::Input => Some(Self {
                prompt: content,
                output: None,
            }),
            ScanType::Output => original_prompt.map(|prompt| Self {
                prompt,
                output: Some(content),
            }),
        }
    }
}

/// Response body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalyzerResponse {
    #[serde(default, alias = "verdict")]
    pub detected: bool,
    #[serde(default)]
    pub categories: BTreeMap<String, bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalyzerResponse {
    /// Categories the analyzer flagged
    pub fn flagged(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(|(_, hit)| **hit)
            .map(|(name, _)| name.as_str())
    }

    /// Map the response onto a verdict under `policy`
    pub fn evaluate(&self, policy: &BlockPolicy) -> ScanResult {
        if !self.detected {
            return ScanResult::pass();
        }

        let flagged: Vec<&str> = self.flagged().collect();
        let reason = match (&self.message, flagged.is_empty()) {
            (Some(message), _) => message.clone(),
            (None, false) => format!("Prompt analyzer detected: {}", flagged.join(", ")),
            (None, true) => "Prompt analyzer detected a threat".to_string(),
        };

        if policy.is_block_all() || policy.blocks_any(flagged.iter().copied()) {
            ScanResult::block(reason)
        } else {
            ScanResult::detected(reason)
        }
    }
}

/// Hosted prompt analyzer client
#[derive(Debug, Clone)]
pub struct PromptAnalyzerTool {
    client: reqwest::Client,
    url: String,
    api_key: String,
    policy: BlockPolicy,
}

impl PromptAnalyzerTool {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        policy: BlockPolicy,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            policy,
        })
    }

    /// Active when both the endpoint and the key are configured
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let (url, key) = match (&settings.analyzer_url, &settings.analyzer_key) {
            (Some(url), Some(key)) => (url, key),
            (None, None) => return None,
            _ => {
                debug!("Prompt analyzer excluded: endpoint and key must both be set");
                return None;
            }
        };

        let policy = BlockPolicy::from_names(&settings.analyzer_block);
        match Self::new(url.as_str(), key.as_str(), policy) {
            Ok(tool) => Some(tool),
            Err(e) => {
                debug!("Prompt analyzer excluded: {}", e);
                None
            }
        }
    }

    pub fn policy(&self) -> &BlockPolicy {
        &self.policy
    }

    async fn analyze(&self, body: &AnalyzerRequest<'_>) -> Result<serde_json::Value, ToolError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ToolError::Api(format!("Prompt analyzer request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Api(format!(
                "Prompt analyzer API error: {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl SecurityTool for PromptAnalyzerTool {
    fn tool_name(&self) -> &str {
        "prompt_analyzer"
    }

    fn display_name(&self) -> &str {
        "Prompt Analyzer"
    }

    async fn scan(
        &self,
        content: &str,
        scan_type: ScanType,
        original_prompt: Option<&str>,
    ) -> Result<ScanResult, ToolError> {
        let Some(body) = AnalyzerRequest::for_scan(content, scan_type, original_prompt) else {
            return Ok(ScanResult::error("Output scan requires the original prompt"));
        };

        let raw = self.analyze(&body).await?;
        let parsed: AnalyzerResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ToolError::MalformedResponse(e.to_string()))?;

        Ok(parsed.evaluate(&self.policy).with_details(raw))
    }

    fn validate_config(&self) -> Result<(), ToolError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ToolError::Config(format!(
                "Prompt analyzer URL must be http(s): {}",
                self.url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ToolError::Config("Prompt analyzer key is empty".to_string()));
        }
        Ok(())
    }
}
