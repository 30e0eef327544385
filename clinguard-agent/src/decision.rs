//! Agent decisions and the parser chain that extracts them
//!
//! Models rarely return exactly the JSON they were asked for. The chain tries
//! progressively looser readings of the reasoning text; every strategy is total
//! and returns `None` rather than failing. Exhausting the chain means the
//! decision is unparseable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// What the agent chose to do this iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    UseTool {
        tool: String,
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    FinalAnswer {
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    NeedHuman {
        reason: String,
    },
}

impl Decision {
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::UseTool { .. } => "use_tool",
            Decision::FinalAnswer { .. } => "final_answer",
            Decision::NeedHuman { .. } => "need_human",
        }
    }

    /// Interpret a JSON object as a decision
    ///
    /// Accepts the documented shape plus common variations: `action` for
    /// `type`, `name` for `tool`, `args`/`arguments` for `input`, and a missing
    /// `type` when the remaining fields make the intent unambiguous.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        let kind = text("type")
            .or_else(|| text("action"))
            .map(|k| k.to_ascii_lowercase());

        let tool = text("tool").or_else(|| text("name"));
        let answer = text("answer").or_else(|| text("final_answer"));
        let reasoning = text("reasoning").or_else(|| text("thought"));

        match kind.as_deref() {
            Some("use_tool") | Some("tool_call") | Some("tool") => Some(Decision::UseTool {
                tool: tool?,
                input: tool_input(obj),
                reasoning,
            }),
            Some("final_answer") | Some("answer") | Some("finish") => Some(Decision::FinalAnswer {
                answer: answer?,
                reasoning,
            }),
            Some("need_human") | Some("escalate") => Some(Decision::NeedHuman {
                reason: text("reason").unwrap_or_else(|| "No reason given".to_string()),
            }),
            Some(_) => None,
            None => match (tool, answer) {
                (Some(tool), None) => Some(Decision::UseTool {
                    tool,
                    input: tool_input(obj),
                    reasoning,
                }),
                (None, Some(answer)) => Some(Decision::FinalAnswer { answer, reasoning }),
                _ => None,
            },
        }
    }
}

fn tool_input(obj: &Map<String, Value>) -> Value {
    ["input", "args", "arguments", "parameters"]
        .iter()
        .find_map(|key| obj.get(*key))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// One parse strategy
pub type Strategy = fn(&str) -> Option<Decision>;

/// Strategies in the order they are tried
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("whole_json", whole_json),
    ("fenced_json", fenced_json),
    ("brace_span", brace_span),
    ("react", react),
    ("final_answer_marker", final_answer_marker),
];

/// A decision and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDecision {
    pub decision: Decision,
    pub strategy: &'static str,
}

/// First successful strategy wins; `None` means unparseable
pub fn parse_decision(raw: &str) -> Option<ParsedDecision> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        strategy(raw).map(|decision| ParsedDecision {
            decision,
            strategy: *name,
        })
    })
}

fn parse_object(text: &str) -> Option<Decision> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .as_ref()
        .and_then(Decision::from_value)
}

fn whole_json(raw: &str) -> Option<Decision> {
    parse_object(raw)
}

fn fenced_json(raw: &str) -> Option<Decision> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok())
        .as_ref()?;

    fence
        .captures_iter(raw)
        .find_map(|caps| caps.get(1).and_then(|m| parse_object(m.as_str())))
}

fn brace_span(raw: &str) -> Option<Decision> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&raw[start..=end])
}

/// `Action: tool` / `Action Input: {...}` blocks
fn react(raw: &str) -> Option<Decision> {
    static ACTION: OnceLock<Option<Regex>> = OnceLock::new();
    static ACTION_INPUT: OnceLock<Option<Regex>> = OnceLock::new();

    let action = ACTION
        .get_or_init(|| Regex::new(r"(?m)^\s*Action:\s*([A-Za-z0-9_\-]+)\s*$").ok())
        .as_ref()?;
    let action_input = ACTION_INPUT
        .get_or_init(|| Regex::new(r"(?s)Action Input:\s*(.+?)\s*(?:\nObservation:|\z)").ok())
        .as_ref()?;

    let tool = action.captures(raw)?.get(1)?.as_str().to_string();
    let input = match action_input.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => serde_json::from_str::<Value>(m.as_str())
            .unwrap_or_else(|_| serde_json::json!({ "input": m.as_str() })),
        None => Value::Object(Map::new()),
    };

    let reasoning = raw
        .lines()
        .find_map(|l| l.trim().strip_prefix("Thought:"))
        .map(|t| t.trim().to_string());

    Some(Decision::UseTool {
        tool,
        input,
        reasoning,
    })
}

fn final_answer_marker(raw: &str) -> Option<Decision> {
    let idx = raw.find("Final Answer:")?;
    let answer = raw[idx + "Final Answer:".len()..].trim();
    if answer.is_empty() {
        return None;
    }
    Some(Decision::FinalAnswer {
        answer: answer.to_string(),
        reasoning: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(raw: &str) -> ParsedDecision {
        parse_decision(raw).unwrap_or_else(|| panic!("unparseable: {}", raw))
    }

    #[test]
    fn test_whole_json_tool_call() {
        let p = parsed(r#"{"type": "use_tool", "tool": "get_patient_details", "input": {"patient_id": "PT-001"}, "reasoning": "need vitals"}"#);
        assert_eq!(p.strategy, "whole_json");
        assert_eq!(
            p.decision,
            Decision::UseTool {
                tool: "get_patient_details".to_string(),
                input: json!({"patient_id": "PT-001"}),
                reasoning: Some("need vitals".to_string()),
            }
        );
    }

    #[test]
    fn test_whole_json_final_and_escalation() {
        let p = parsed(r#"{"type": "final_answer", "answer": "All patients stable"}"#);
        assert!(matches!(p.decision, Decision::FinalAnswer { ref answer, .. } if answer == "All patients stable"));

        let p = parsed(r#"{"type": "need_human", "reason": "conflicting orders"}"#);
        assert_eq!(
            p.decision,
            Decision::NeedHuman {
                reason: "conflicting orders".to_string()
            }
        );
    }

    #[test]
    fn test_fenced_json() {
        let raw = "I'll look up the risk scores.\n```json\n{\"type\": \"use_tool\", \"tool\": \"get_patient_risk_scores\"}\n```";
        let p = parsed(raw);
        assert_eq!(p.strategy, "fenced_json");
        assert_eq!(p.decision.kind(), "use_tool");
        if let Decision::UseTool { input, .. } = p.decision {
            assert_eq!(input, json!({}));
        }
    }

    #[test]
    fn test_brace_span_with_prose() {
        let raw = r#"Sure! Here is my decision: {"action": "final_answer", "answer": "Done"} Hope that helps."#;
        let p = parsed(raw);
        assert_eq!(p.strategy, "brace_span");
        assert_eq!(p.decision.kind(), "final_answer");
    }

    #[test]
    fn test_react_format() {
        let raw = "Thought: I need the chart\nAction: get_patient_details\nAction Input: {\"patient_id\": \"PT-002\"}";
        let p = parsed(raw);
        assert_eq!(p.strategy, "react");
        assert_eq!(
            p.decision,
            Decision::UseTool {
                tool: "get_patient_details".to_string(),
                input: json!({"patient_id": "PT-002"}),
                reasoning: Some("I need the chart".to_string()),
            }
        );
    }

    #[test]
    fn test_react_with_plain_text_input() {
        let raw = "Action: search_medical_literature\nAction Input: metformin renal dosing";
        let p = parsed(raw);
        if let Decision::UseTool { input, .. } = p.decision {
            assert_eq!(input, json!({"input": "metformin renal dosing"}));
        } else {
            panic!("expected tool call");
        }
    }

    #[test]
    fn test_final_answer_marker() {
        let p = parsed("Thought: I have enough.\nFinal Answer: Two patients need follow-up.");
        assert_eq!(p.strategy, "final_answer_marker");
        assert_eq!(
            p.decision,
            Decision::FinalAnswer {
                answer: "Two patients need follow-up.".to_string(),
                reasoning: None,
            }
        );
    }

    #[test]
    fn test_variant_field_names() {
        let d = Decision::from_value(&json!({"name": "list_documents", "args": {"limit": 5}})).unwrap();
        assert_eq!(
            d,
            Decision::UseTool {
                tool: "list_documents".to_string(),
                input: json!({"limit": 5}),
                reasoning: None,
            }
        );
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_decision("I am not sure what to do next.").is_none());
        assert!(parse_decision("").is_none());
        assert!(parse_decision("{not json at all}").is_none());
        // Valid JSON with an unknown decision type
        assert!(parse_decision(r#"{"type": "dance"}"#).is_none());
        // Tool call without a tool name
        assert!(parse_decision(r#"{"type": "use_tool", "input": {}}"#).is_none());
        assert!(parse_decision("Final Answer:   ").is_none());
    }

    #[test]
    fn test_serialization_shape() {
        let d = Decision::FinalAnswer {
            answer: "ok".to_string(),
            reasoning: None,
        };
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"type": "final_answer", "answer": "ok"})
        );
    }
}
