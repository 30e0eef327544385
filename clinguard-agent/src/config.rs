//! Agent loop bounds

use crate::error::AgentError;
use std::time::Duration;

/// Loop bounds and prompt shaping for every run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Iteration budget; exhausting it ends the run `timeout`
    pub max_iterations: u32,
    pub nudge_after_iterations: u32,
    pub nudge_after_observations: usize,
    /// Number of recent tool-call signatures kept for cycle detection
    pub loop_window: usize,
    pub loop_max_repeats: usize,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
    /// Memory entries rendered into the reasoning prompt
    pub history_len: usize,
    /// Tool output characters kept in an observation
    pub observation_chars: usize,
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            nudge_after_iterations: 2,
            nudge_after_observations: 2,
            loop_window: 6,
            loop_max_repeats: 2,
            llm_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            history_len: 10,
            observation_chars: 200,
            temperature: 0.3,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_loop_detection(mut self, window: usize, max_repeats: usize) -> Self {
        self.loop_window = window;
        self.loop_max_repeats = max_repeats;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether the reasoning prompt should push for a final answer
    pub fn nudge(&self, iteration: u32, observations: usize) -> bool {
        iteration >= self.nudge_after_iterations && observations >= self.nudge_after_observations
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.max_iterations == 0 {
            return Err(AgentError::Config(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.loop_window == 0 {
            return Err(AgentError::Config(
                "loop_window must be greater than zero".to_string(),
            ));
        }
        if self.llm_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(AgentError::Config("Timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.loop_window, 6);
        assert_eq!(config.loop_max_repeats, 2);
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert_eq!(config.history_len, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nudge_threshold() {
        let config = AgentConfig::default();
        assert!(!config.nudge(1, 5));
        assert!(!config.nudge(2, 1));
        assert!(config.nudge(2, 2));
        assert!(config.nudge(7, 3));
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        assert!(AgentConfig::new().with_max_iterations(0).validate().is_err());
        assert!(AgentConfig::new().with_loop_detection(0, 2).validate().is_err());
        assert!(AgentConfig::new()
            .with_tool_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
