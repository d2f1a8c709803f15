//! Query execution result structures

use crate::llm::{LlmMessage, Usage};
use serde::{Deserialize, Serialize};

/// Why the orchestration loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without requesting tools
    Completed,

    /// The tool-round budget ran out while the model still wanted tools
    BudgetExhausted,
}

/// Result of processing one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExecution {
    /// Assembled answer returned to the caller
    pub answer: String,

    /// Full conversation history of the query
    pub history: Vec<LlmMessage>,

    /// Number of tool-dispatch rounds performed
    pub tool_rounds: usize,

    /// Number of model gateway calls made
    pub model_calls: usize,

    /// Why the loop stopped
    pub stop_reason: StopReason,

    /// Token usage summed over all model calls, when reported
    pub usage: Option<Usage>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl QueryExecution {
    /// Whether the loop was cut off by the round budget
    pub fn budget_exhausted(&self) -> bool {
        self.stop_reason == StopReason::BudgetExhausted
    }
}
