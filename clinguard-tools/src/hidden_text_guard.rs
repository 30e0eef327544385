//! Hidden text guard
//!
//! Detects Unicode tag characters (U+E0000 to U+E007F). They render as nothing
//! but map one-to-one onto ASCII, so they can smuggle instructions into a
//! prompt or a retrieved document.

use crate::settings::Settings;
use async_trait::async_trait;
use clinguard_core::{ScanResult, ScanType, SecurityTool, ToolError};
use serde_json::json;

const TAG_START: u32 = 0xE0000;
const TAG_END: u32 = 0xE007F;

/// Longest decoded payload quoted in a block reason
const PREVIEW_CHARS: usize = 100;

/// Binary guard: any tag character blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct HiddenTextGuard;

impl HiddenTextGuard {
    pub fn new() -> Self {
        Self
    }

    /// Active when enabled in settings
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings.hidden_text.then(Self::new)
    }

    #[inline]
    fn is_tag(c: char) -> bool {
        (TAG_START..=TAG_END).contains(&(c as u32))
    }

    /// Stops at the first tag character
    #[inline]
    fn contains_hidden(text: &str) -> bool {
        text.chars().any(Self::is_tag)
    }

    /// Decode only the hidden characters to the ASCII they encode
    fn decode_hidden(text: &str) -> String {
        text.chars()
            .filter(|&c| Self::is_tag(c))
            .filter_map(|c| char::from_u32(c as u32 - TAG_START))
            .collect()
    }
}

#[async_trait]
impl SecurityTool for HiddenTextGuard {
    fn tool_name(&self) -> &str {
        "hidden_text"
    }

    fn display_name(&self) -> &str {
        "Hidden Text Guard"
    }

    async fn scan(
        &self,
        content: &str,
        _scan_type: ScanType,
        _original_prompt: Option<&str>,
    ) -> Result<ScanResult, ToolError> {
        if !Self::contains_hidden(content) {
            return Ok(ScanResult::pass());
        }

        let decoded = Self::decode_hidden(content);
        let hidden_count = decoded.chars().count();

        let preview = if hidden_count > PREVIEW_CHARS {
            let head: String = decoded.chars().take(PREVIEW_CHARS - 3).collect();
            format!("{}...", head)
        } else {
            decoded.clone()
        };

        Ok(ScanResult::block(format!(
            "Hidden text detected ({} hidden characters). Decoded: {}",
            hidden_count, preview
        ))
        .with_details(json!({ "hidden_count": hidden_count, "decoded": decoded })))
    }
}
