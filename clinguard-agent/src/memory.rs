//! Per-run observation log

use serde::{Deserialize, Serialize};

/// One thing the agent learned or did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub iteration: u32,
    pub summary: String,
}

/// Append-only memory for a single run
#[derive(Debug, Clone, Default)]
pub struct Memory {
    observations: Vec<Observation>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, iteration: u32, summary: impl Into<String>) {
        self.observations.push(Observation {
            iteration,
            summary: summary.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The last `n` observations, oldest first
    pub fn recent(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    /// "Step i: summary" lines for the last `n` observations
    pub fn render(&self, n: usize) -> String {
        self.recent(n)
            .iter()
            .map(|o| format!("Step {}: {}", o.iteration, o.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}
