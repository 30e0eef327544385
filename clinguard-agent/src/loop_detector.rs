//! Tool-call cycle detection
//!
//! Keeps a rolling window of recent `(tool, canonical arguments)` signatures.
//! A signature seen more than `max_repeats` times inside the window is a cycle.

use serde_json::Value;
use std::collections::VecDeque;

/// Identity of one tool call; argument key order does not matter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSignature {
    pub tool: String,
    pub args: String,
}

impl CallSignature {
    pub fn new(tool: &str, args: &Value) -> Self {
        Self {
            tool: tool.to_string(),
            args: canonical_json(args),
        }
    }
}

/// Serialize with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// Rolling-window repeat detector
#[derive(Debug, Clone)]
pub struct LoopDetector {
    window: VecDeque<CallSignature>,
    capacity: usize,
    max_repeats: usize,
}

impl LoopDetector {
    pub fn new(capacity: usize, max_repeats: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            max_repeats,
        }
    }

    /// Record a call; true when it completes a cycle
    pub fn record(&mut self, signature: CallSignature) -> bool {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(signature);

        let latest = &self.window[self.window.len() - 1];
        self.occurrences(latest) > self.max_repeats
    }

    pub fn occurrences(&self, signature: &CallSignature) -> usize {
        self.window.iter().filter(|s| *s == signature).count()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
