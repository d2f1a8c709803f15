//! Query processor configuration structures

use crate::config::ResolvedLlmConfig;
use crate::error::Result;
use crate::llm::{LlmClient, OpenAiClient};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Instruction placed at the start of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a versatile assistant. Decide on your own \
whether to call tools to obtain data. Once a tool has returned its result, do not call the \
same tool again. Finally, give the user a short and direct answer.";

/// Default number of model/tool round trips per query
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

/// Configuration for a query processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Model identifier sent with every request
    pub model: String,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per model turn
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Top-p sampling parameter
    #[serde(default)]
    pub top_p: Option<f32>,

    /// Maximum number of tool-dispatch rounds before the loop is cut off
    pub max_tool_rounds: usize,

    /// Custom system prompt (optional)
    /// If not provided, [`DEFAULT_SYSTEM_PROMPT`] is used
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ProcessorConfig {
    /// The system prompt in effect
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
            top_p: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: None,
        }
    }
}

/// Builder for creating query processors
pub struct ProcessorBuilder {
    llm_client: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    config: ProcessorConfig,
}

impl ProcessorBuilder {
    /// Create a new builder around an LLM client and a tool registry
    pub fn new(llm_client: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        let config = ProcessorConfig {
            model: llm_client.model_name().to_string(),
            ..ProcessorConfig::default()
        };

        Self {
            llm_client,
            tools,
            config,
        }
    }

    /// Create a builder backed by an OpenAI-compatible client
    pub fn from_llm_config(llm_config: &ResolvedLlmConfig, tools: ToolRegistry) -> Result<Self> {
        let client = OpenAiClient::new(llm_config)?;
        let mut builder = Self::new(Arc::new(client), tools);

        let params = &llm_config.params;
        if params.temperature.is_some() {
            builder.config.temperature = params.temperature;
        }
        builder.config.max_tokens = params.max_tokens;
        builder.config.top_p = params.top_p;

        Ok(builder)
    }

    /// Replace the whole processor configuration
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model identifier
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the tool-round budget
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.config.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.config.system_prompt = system_prompt;
        self
    }

    /// Build the processor
    pub fn build(self) -> super::QueryProcessor {
        super::QueryProcessor::new(self.config, self.llm_client, self.tools)
    }
}
