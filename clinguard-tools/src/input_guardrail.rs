//! Remote input guardrail adapter
//!
//! Binary allow/deny service bound to a configured target application. It only
//! understands user input; output scans are skipped.

use crate::settings::Settings;
use async_trait::async_trait;
use clinguard_core::{ScanResult, ScanType, SecurityTool, ToolError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct GuardrailRequest<'a> {
    prompt: &'a str,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GuardrailResponse {
    #[serde(default = "default_allowed")]
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_allowed() -> bool {
    true
}

impl GuardrailResponse {
    pub fn evaluate(&self) -> ScanResult {
        if self.allowed {
            return ScanResult::pass();
        }

        let reason = self
            .reason
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Rejected by input guardrail".to_string());
        ScanResult::block(reason)
    }
}

/// Hosted input guardrail client
#[derive(Debug, Clone)]
pub struct InputGuardrailTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    target: String,
}

impl InputGuardrailTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            target: target.into(),
        })
    }

    /// Active when endpoint, key and target are all configured
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let fields = (
            &settings.input_guard_url,
            &settings.input_guard_key,
            &settings.input_guard_target,
        );

        let (url, key, target) = match fields {
            (Some(url), Some(key), Some(target)) => (url, key, target),
            (None, None, None) => return None,
            _ => {
                debug!("Input guardrail excluded: endpoint, key and target must all be set");
                return None;
            }
        };

        match Self::new(url.as_str(), key.as_str(), target.as_str()) {
            Ok(tool) => Some(tool),
            Err(e) => {
                debug!("Input guardrail excluded: {}", e);
                None
            }
        }
    }

    /// Analyze endpoint for the configured target
    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/v1/guardrails/{}/analyze",
            self.base_url.trim_end_matches('/'),
            self.target
        )
    }
}

#[async_trait]
impl SecurityTool for InputGuardrailTool {
    fn tool_name(&self) -> &str {
        "input_guardrail"
    }

    fn display_name(&self) -> &str {
        "Input Guardrail"
    }

    async fn scan(
        &self,
        content: &str,
        scan_type: ScanType,
        _original_prompt: Option<&str>,
    ) -> Result<ScanResult, ToolError> {
        if scan_type != ScanType::Input {
            return Ok(ScanResult::skip("Input guardrail only scans input"));
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&GuardrailRequest { prompt: content })
            .send()
            .await
            .map_err(|e| ToolError::Api(format!("Input guardrail request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Api(format!(
                "Input guardrail API error: {}",
                status.as_u16()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::MalformedResponse(e.to_string()))?;
        let parsed: GuardrailResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ToolError::MalformedResponse(e.to_string()))?;

        Ok(parsed.evaluate().with_details(raw))
    }

    fn validate_config(&self) -> Result<(), ToolError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ToolError::Config(format!(
                "Input guardrail URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.target.contains('/') {
            return Err(ToolError::Config(format!(
                "Input guardrail target must be a single path segment: {}",
                self.target
            )));
        }
        Ok(())
    }
}
