//! Tool registry holding the fixed set of available tools

use crate::error::{Result, ToolError};
use crate::llm::ToolDefinition;
use crate::tools::{Tool, ToolCall, ToolDescriptor, ToolResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Ordered registry of tools
///
/// Registration order is the order descriptors are advertised to the model.
/// Names are expected to be unique; callers validate that before
/// registering, and lookups return the first match.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

/// Short listing entry for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    /// Tool name
    pub name: String,
    /// First sentence or line of the description, truncated
    pub description: String,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry with the built-in tools
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(crate::tools::builtin::CalculatorTool::new());
        registry.register(crate::tools::builtin::CurrentTimeTool::new());
        registry.register(crate::tools::builtin::WebFetchTool::new());
        registry
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.push(Arc::new(tool));
    }

    /// Register an already shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a tool by exact, case-sensitive name
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| {
                ToolError::NotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// List all tool names in registry order
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Descriptors of the tools visible under `filter`
    ///
    /// `None` means every registered tool is visible.
    pub fn descriptors(&self, filter: Option<&HashSet<String>>) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .filter(|tool| filter.map_or(true, |names| names.contains(tool.name())))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Gateway-facing tool definitions for the tools visible under `filter`
    pub fn tool_definitions(&self, filter: Option<&HashSet<String>>) -> Vec<ToolDefinition> {
        self.descriptors(filter)
            .iter()
            .map(ToolDefinition::from)
            .collect()
    }

    /// Resolve and invoke a tool; every failure propagates to the caller
    pub async fn call_tool(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self.get(&call.name)?;

        let start_time = Instant::now();
        let name = call.name.clone();
        let result = tool.execute(call).await;
        tracing::debug!(
            tool = %name,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "tool finished"
        );

        result
    }

    /// Name and short description of every tool
    pub fn catalog(&self, max_len: usize) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|tool| ToolSummary {
                name: tool.name().to_string(),
                description: truncate_description(tool.description(), max_len),
            })
            .collect()
    }
}

/// Cut a description at its first sentence or line, capped at `max_len` chars
fn truncate_description(description: &str, max_len: usize) -> String {
    let first_line = description.lines().next().unwrap_or("").trim();

    if let Some(idx) = first_line.find(". ") {
        if first_line[..idx].chars().count() < max_len {
            return first_line[..=idx].to_string();
        }
    }

    if first_line.chars().count() <= max_len {
        return first_line.to_string();
    }

    let cut: String = first_line.chars().take(max_len).collect();
    format!("{}...", cut)
}
