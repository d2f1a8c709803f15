//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Trait for all tools
///
/// Any concrete tool implements this capability interface; the registry
/// stores heterogeneous tools side by side as `Arc<dyn Tool>`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Describe the tool for schema construction
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Static description of a tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON schema of accepted arguments
    pub input_schema: Value,
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Result content, textual or structured
    pub content: Value,
}

impl ToolCall {
    /// Create a new tool call with a fresh id
    pub fn new<S: Into<String>>(name: S, parameters: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Create a tool call answering a model-issued request id
    pub fn with_id<I: Into<String>, S: Into<String>>(id: I, name: S, parameters: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// Get an optional parameter; absent or null is `None`, a wrong type is an error
    pub fn get_optional_parameter<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.parameters.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_parameter(key).map(Some),
        }
    }
}

impl ToolResult {
    /// Create a plain-text result
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: Value::String(content.into()),
        }
    }

    /// Create a structured result
    pub fn json(content: Value) -> Self {
        Self { content }
    }

    /// Render the content for transport back to the model
    ///
    /// Strings are passed through verbatim, anything else is compact JSON.
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_parameter() {
        let call = ToolCall::new("calculator", json!({"expr": "1+1", "precision": 3}));

        let expr: String = call.get_parameter("expr").unwrap();
        assert_eq!(expr, "1+1");

        let precision: u32 = call.get_parameter("precision").unwrap();
        assert_eq!(precision, 3);

        assert!(call.get_parameter::<String>("missing").is_err());
        assert!(call.get_parameter::<u32>("expr").is_err());
        assert_eq!(call.get_optional_parameter::<u32>("missing").unwrap(), None);
        assert_eq!(call.get_optional_parameter::<u32>("precision").unwrap(), Some(3));
        assert!(call.get_optional_parameter::<u32>("expr").is_err());

        let call = ToolCall::new("current_time", json!({"utc_offset_hours": null}));
        assert_eq!(call.get_optional_parameter::<f64>("utc_offset_hours").unwrap(), None);
    }

    #[test]
    fn test_tool_call_ids_are_unique() {
        let a = ToolCall::new("x", json!({}));
        let b = ToolCall::new("x", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_content_text() {
        assert_eq!(ToolResult::text("4").content_text(), "4");
        assert_eq!(
            ToolResult::json(json!({"value": 4})).content_text(),
            r#"{"value":4}"#
        );
        assert_eq!(ToolResult::json(json!(4)).content_text(), "4");
    }
}
