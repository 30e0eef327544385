//! Agent tool execution
//!
//! The runner only sees [`ToolExecutor`]. [`ToolCatalog`] is the provided
//! implementation: a name-keyed set of handlers, each carrying the description
//! rendered into the reasoning prompt.

use crate::error::ToolExecError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Prompt-facing description of one agent tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// `(parameter, description)` pairs in prompt order
    pub parameters: Vec<(String, String)>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameters.push((name.into(), description.into()));
        self
    }

    /// `- name(p: desc, ...): description`
    pub fn prompt_line(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("- {}({}): {}", self.name, params, self.description)
    }
}

/// Executes the tools an agent decides to call
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool: &str, args: &Value) -> Result<Value, ToolExecError>;

    /// Description of `tool`, or `None` if this executor does not provide it
    fn spec(&self, tool: &str) -> Option<ToolSpec>;
}

/// A single tool implementation
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &Value) -> Result<Value, ToolExecError>;
}

/// Adapts a synchronous closure into a [`ToolHandler`]
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(&Value) -> Result<Value, ToolExecError> + Send + Sync,
{
    async fn call(&self, args: &Value) -> Result<Value, ToolExecError> {
        (self.0)(args)
    }
}

struct CatalogEntry {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// Name-keyed tool set
#[derive(Default)]
pub struct ToolCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous tool of the same name
    pub fn register(mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Self {
        self.entries
            .insert(spec.name.clone(), CatalogEntry { spec, handler });
        self
    }

    pub fn register_fn<F>(self, spec: ToolSpec, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ToolExecError> + Send + Sync + 'static,
    {
        self.register(spec, Arc::new(FnHandler(f)))
    }

    pub fn contains(&self, tool: &str) -> bool {
        self.entries.contains_key(tool)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolCatalog").field("tools", &names).finish()
    }
}

#[async_trait]
impl ToolExecutor for ToolCatalog {
    async fn execute(&self, tool: &str, args: &Value) -> Result<Value, ToolExecError> {
        let entry = self
            .entries
            .get(tool)
            .ok_or_else(|| ToolExecError::UnknownTool(tool.to_string()))?;
        entry.handler.call(args).await
    }

    fn spec(&self, tool: &str) -> Option<ToolSpec> {
        self.entries.get(tool).map(|e| e.spec.clone())
    }
}

/// Read a required string argument
pub fn required_str<'a>(tool: &str, args: &'a Value, key: &str) -> Result<&'a str, ToolExecError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolExecError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("missing string argument '{}'", key),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new().register_fn(
            ToolSpec::new("get_patient_details", "Get detailed information for a specific patient")
                .param("patient_id", "string - The patient ID (e.g. PT-001)"),
            |args| {
                let id = required_str("get_patient_details", args, "patient_id")?;
                Ok(json!({"patient_id": id, "risk": "low"}))
            },
        )
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let out = catalog()
            .execute("get_patient_details", &json!({"patient_id": "PT-001"}))
            .await
            .unwrap();
        assert_eq!(out["patient_id"], "PT-001");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_args() {
        let catalog = catalog();
        let err = catalog.execute("delete_records", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolExecError::UnknownTool(ref t) if t == "delete_records"));

        let err = catalog
            .execute("get_patient_details", &json!({"id": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolExecError::InvalidArguments { .. }));
    }

    #[test]
    fn test_prompt_line() {
        let spec = catalog().spec("get_patient_details").unwrap();
        assert_eq!(
            spec.prompt_line(),
            "- get_patient_details(patient_id: string - The patient ID (e.g. PT-001)): Get detailed information for a specific patient"
        );
        assert_eq!(ToolSpec::new("get_all_patients", "List").prompt_line(), "- get_all_patients(): List");
    }
}
