//! Output assembly for a single query

use serde_json::Value;
use std::fmt;

/// One human-readable piece of the final answer
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Text produced by the model
    ModelText(String),

    /// Trace line for a tool invocation
    ToolAnnotation { name: String, arguments: Value },
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::ModelText(text) => f.write_str(text),
            Fragment::ToolAnnotation { name, arguments } => {
                write!(f, "[Calling tool {} with args {}]", name, arguments)
            }
        }
    }
}

/// Ordered fragments recorded while a query runs
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    fragments: Vec<Fragment>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the model's first reply; absent content is kept as an empty line
    pub fn record_reply(&mut self, content: Option<&str>) {
        self.fragments
            .push(Fragment::ModelText(content.unwrap_or_default().to_string()));
    }

    /// Record a follow-up reply, skipping empty content
    pub fn record_followup(&mut self, content: Option<&str>) {
        if let Some(text) = content.filter(|text| !text.is_empty()) {
            self.fragments.push(Fragment::ModelText(text.to_string()));
        }
    }

    /// Record a tool invocation annotation
    pub fn record_tool_call(&mut self, name: &str, arguments: &Value) {
        self.fragments.push(Fragment::ToolAnnotation {
            name: name.to_string(),
            arguments: arguments.clone(),
        });
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Join all fragments in recording order, one per line
    pub fn assemble(&self) -> String {
        assemble(&self.fragments)
    }
}

/// Join fragments with newlines
pub fn assemble(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
