//! LLM client abstractions and implementations

pub mod client;
pub mod message;
pub mod providers;

pub use client::{
    ChatOptions, FinishReason, FunctionDefinition, LlmClient, LlmResponse, ToolDefinition, Usage,
    tool_definition,
};
pub use message::{LlmMessage, MessageRole, ToolCallRequest};
pub use providers::*;
