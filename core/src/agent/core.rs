//! QueryProcessor implementation

use super::config::ProcessorConfig;
use super::execution::{QueryExecution, StopReason};
use super::transcript::Transcript;
use crate::error::Result;
use crate::llm::{
    ChatOptions, LlmClient, LlmMessage, LlmResponse, ToolCallRequest, ToolDefinition, Usage,
};
use crate::tools::{ToolCall, ToolRegistry};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Drives the alternation between model turns and tool execution
///
/// A processor only holds shared, read-only state; every call to
/// [`QueryProcessor::process_query`] owns its own history, so one processor
/// can serve many queries concurrently.
pub struct QueryProcessor {
    config: ProcessorConfig,
    llm_client: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

/// Per-query counters
#[derive(Default)]
struct LoopStats {
    model_calls: usize,
    usage: Option<Usage>,
}

impl QueryProcessor {
    /// Create a new processor
    pub fn new(config: ProcessorConfig, llm_client: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            config,
            llm_client,
            tools,
        }
    }

    /// Get processor configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `query`, letting the model call tools from `selected_tools`
    ///
    /// `None` makes every registered tool visible to the model.
    pub async fn process_query(
        &self,
        query: &str,
        selected_tools: Option<&HashSet<String>>,
    ) -> Result<String> {
        self.execute_query(query, selected_tools)
            .await
            .map(|execution| execution.answer)
    }

    /// Like [`QueryProcessor::process_query`], returning the full execution record
    pub async fn execute_query(
        &self,
        query: &str,
        selected_tools: Option<&HashSet<String>>,
    ) -> Result<QueryExecution> {
        let span = tracing::info_span!("query", id = %Uuid::new_v4());
        self.run(query, selected_tools).instrument(span).await
    }

    fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            model: Some(self.config.model.clone()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        }
    }

    async fn run(
        &self,
        query: &str,
        selected_tools: Option<&HashSet<String>>,
    ) -> Result<QueryExecution> {
        let start_time = Instant::now();

        let mut history = vec![
            LlmMessage::system(self.config.system_prompt()),
            LlmMessage::user(query),
        ];
        let tool_definitions = self.tools.tool_definitions(selected_tools);
        let options = self.chat_options();
        let mut transcript = Transcript::new();
        let mut stats = LoopStats::default();

        info!(
            "processing query with {} tools visible: {}",
            tool_definitions.len(),
            query
        );

        let mut response = self
            .ask_model(&history, &tool_definitions, &options, &mut stats)
            .await?;
        transcript.record_reply(response.message.get_text());

        let mut remaining_rounds = self.config.max_tool_rounds;
        let mut tool_rounds = 0;

        while response.message.has_tool_calls() && remaining_rounds > 0 {
            remaining_rounds -= 1;
            tool_rounds += 1;

            for request in response.message.get_tool_calls() {
                self.dispatch(request, &mut history, &mut transcript).await?;
            }

            response = self
                .ask_model(&history, &tool_definitions, &options, &mut stats)
                .await?;
            transcript.record_followup(response.message.get_text());
        }

        let stop_reason = if response.message.has_tool_calls() {
            warn!(
                "tool round budget of {} exhausted, dropping {} pending tool calls",
                self.config.max_tool_rounds,
                response.message.get_tool_calls().len()
            );
            StopReason::BudgetExhausted
        } else {
            StopReason::Completed
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            tool_rounds,
            model_calls = stats.model_calls,
            duration_ms,
            "query finished: {:?}",
            stop_reason
        );

        Ok(QueryExecution {
            answer: transcript.assemble(),
            history,
            tool_rounds,
            model_calls: stats.model_calls,
            stop_reason,
            usage: stats.usage,
            duration_ms,
        })
    }

    async fn ask_model(
        &self,
        history: &[LlmMessage],
        tool_definitions: &[ToolDefinition],
        options: &ChatOptions,
        stats: &mut LoopStats,
    ) -> Result<LlmResponse> {
        stats.model_calls += 1;
        info!(
            "sending {} messages to {} (call {})",
            history.len(),
            self.llm_client.provider_name(),
            stats.model_calls
        );
        debug!("history: {:?}", history);

        let response = match self
            .llm_client
            .chat_completion(history, tool_definitions, options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("LLM request failed on call {}: {}", stats.model_calls, e);
                return Err(e);
            }
        };

        if let Some(usage) = response.usage {
            *stats.usage.get_or_insert_with(Usage::default) += usage;
        }

        info!(
            "model replied with {} tool calls",
            response.message.get_tool_calls().len()
        );
        debug!("response: {:?}", response.message);

        Ok(response)
    }

    /// Execute one tool call and append its assistant/tool message pair
    async fn dispatch(
        &self,
        request: &ToolCallRequest,
        history: &mut Vec<LlmMessage>,
        transcript: &mut Transcript,
    ) -> Result<()> {
        let parameters = Value::Object(request.parse_arguments()?);
        transcript.record_tool_call(&request.name, &parameters);

        info!("calling tool {} with {}", request.name, parameters);
        let call = ToolCall::with_id(&request.id, &request.name, parameters.clone());
        let result = self.tools.call_tool(call).await?;
        let content = result.content_text();
        debug!("tool {} returned: {}", request.name, content);

        // Both messages are pushed together after the tool returned, so a
        // cancelled query never leaves half a pair behind.
        history.push(LlmMessage::assistant_tool_calls(
            None,
            vec![ToolCallRequest::new(
                &request.id,
                &request.name,
                parameters.to_string(),
            )],
        ));
        history.push(LlmMessage::tool(&request.id, content));

        Ok(())
    }
}
