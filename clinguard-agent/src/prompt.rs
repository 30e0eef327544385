//! Reasoning and synthesis prompts

use crate::config::AgentConfig;
use crate::executor::ToolExecutor;
use crate::memory::Memory;
use crate::profile::AgentProfile;

const RESPONSE_CONTRACT: &str = r#"Based on the task and what has been done so far, decide what to do next.
You MUST respond with EXACTLY one JSON object in one of these formats:

To use a tool:
{"type": "use_tool", "tool": "tool_name", "input": {"param": "value"}, "reasoning": "why I chose this"}

To provide the final answer (when the task is complete):
{"type": "final_answer", "answer": "your complete answer", "reasoning": "why the task is complete"}

To escalate to a human:
{"type": "need_human", "reason": "why human intervention is needed"}

Respond with ONLY the JSON object, nothing else."#;

const NUDGE: &str = "You have already gathered information. If it is enough to answer the task, respond with a final_answer now instead of calling more tools.";

/// Tool section lines for the tools a profile may call
///
/// Tools the executor does not describe are left out.
pub fn tool_descriptions(profile: &AgentProfile, tools: &dyn ToolExecutor) -> String {
    profile
        .tools
        .iter()
        .filter_map(|name| tools.spec(name))
        .map(|spec| spec.prompt_line())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn reasoning_prompt(
    task: &str,
    profile: &AgentProfile,
    tools: &dyn ToolExecutor,
    memory: &Memory,
    iteration: u32,
    config: &AgentConfig,
) -> String {
    let history = if memory.is_empty() {
        " (none yet, this is the first step)".to_string()
    } else {
        format!("\n{}", memory.render(config.history_len))
    };

    let mut prompt = format!(
        "Task: {task}\n\nAvailable tools:\n{tools}\n\nPrevious steps:{history}\n\nCurrent iteration: {iteration} of {max}\n\n{contract}",
        tools = tool_descriptions(profile, tools),
        max = config.max_iterations,
        contract = RESPONSE_CONTRACT,
    );

    if config.nudge(iteration, memory.len()) {
        prompt.push_str("\n\n");
        prompt.push_str(NUDGE);
    }

    prompt
}

/// Prompt for the closing call that turns memory into an answer
pub fn synthesis_prompt(task: &str, memory: &Memory, reason: &str, config: &AgentConfig) -> String {
    let findings = if memory.is_empty() {
        "(no steps were completed)".to_string()
    } else {
        memory.render(config.history_len)
    };

    format!(
        "Task: {task}\n\nThe task must end now: {reason}.\n\nSteps taken:\n{findings}\n\nWrite a concise summary of what was found and what remains open. Respond in plain text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ToolCatalog, ToolSpec};
    use serde_json::json;

    fn profile() -> AgentProfile {
        AgentProfile::new("patient_monitor", "Monitor").with_tools(["get_all_patients", "not_in_catalog"])
    }

    fn catalog() -> ToolCatalog {
        ToolCatalog::new().register_fn(
            ToolSpec::new("get_all_patients", "Get all patients with basic info"),
            |_| Ok(json!([])),
        )
    }

    #[test]
    fn test_first_iteration_prompt() {
        let prompt = reasoning_prompt(
            "Check vitals",
            &profile(),
            &catalog(),
            &Memory::new(),
            1,
            &AgentConfig::default(),
        );

        assert!(prompt.starts_with("Task: Check vitals"));
        assert!(prompt.contains("- get_all_patients(): Get all patients with basic info"));
        assert!(!prompt.contains("not_in_catalog"));
        assert!(prompt.contains("(none yet, this is the first step)"));
        assert!(prompt.contains("Current iteration: 1 of 15"));
        assert!(prompt.contains(r#""type": "need_human""#));
        assert!(!prompt.contains(NUDGE));
    }

    #[test]
    fn test_history_window_and_nudge() {
        let mut memory = Memory::new();
        for i in 1..=12 {
            memory.record(i, format!("obs-{}", i));
        }
        let prompt = reasoning_prompt("t", &profile(), &catalog(), &memory, 13, &AgentConfig::default());

        assert!(!prompt.contains("Step 2: obs-2\n"));
        assert!(prompt.contains("Step 3: obs-3"));
        assert!(prompt.contains("Step 12: obs-12"));
        assert!(prompt.ends_with(NUDGE));
    }

    #[test]
    fn test_synthesis_prompt() {
        let mut memory = Memory::new();
        memory.record(1, "Used get_all_patients -> []");
        let prompt = synthesis_prompt("t", &memory, "iteration budget exhausted", &AgentConfig::default());
        assert!(prompt.contains("The task must end now: iteration budget exhausted."));
        assert!(prompt.contains("Step 1: Used get_all_patients -> []"));
    }
}
