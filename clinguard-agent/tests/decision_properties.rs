//! Property tests for decision parsing and loop detection

use clinguard_agent::{parse_decision, CallSignature, Decision, LoopDetector};
use proptest::prelude::*;
use serde_json::{json, Value};

fn tool_name() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{2,24}"
}

fn args() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", "[A-Za-z0-9 -]{0,16}", 0..4)
        .prop_map(|m| json!(m))
}

proptest! {
    #[test]
    fn parser_never_panics(raw in ".{0,400}") {
        let _ = parse_decision(&raw);
    }

    #[test]
    fn documented_tool_call_always_parses(tool in tool_name(), input in args(), prose in "[A-Za-z .,]{0,40}") {
        let body = json!({"type": "use_tool", "tool": tool, "input": input}).to_string();

        for raw in [body.clone(), format!("{}\n```json\n{}\n```", prose, body), format!("{} {} {}", prose, body, prose)] {
            let parsed = parse_decision(&raw);
            prop_assert!(parsed.is_some(), "failed on {}", raw);
            prop_assert_eq!(
                parsed.unwrap().decision,
                Decision::UseTool { tool: tool.clone(), input: input.clone(), reasoning: None }
            );
        }
    }

    #[test]
    fn identical_call_detected_by_third_repeat(tool in tool_name(), input in args(), noise in 0usize..3) {
        let mut detector = LoopDetector::new(6, 2);
        let mut detected_at = None;

        for i in 0..4 {
            // A few distinct calls before the repeats start
            if i == 0 {
                for n in 0..noise {
                    let noise_args = json!({"n": n});
                    prop_assert!(!detector.record(CallSignature::new("other", &noise_args)));
                }
            }
            if detector.record(CallSignature::new(&tool, &input)) {
                detected_at = Some(i + 1);
                break;
            }
        }

        prop_assert_eq!(detected_at, Some(3));
    }
}
