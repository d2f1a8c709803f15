use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolrelay_core::error::{LlmError, ToolError};
use toolrelay_core::llm::{
    ChatOptions, LlmClient, LlmMessage, LlmResponse, MessageRole, ToolCallRequest,
    ToolDefinition, Usage,
};
use toolrelay_core::tools::builtin::CalculatorTool;
use toolrelay_core::tools::ToolCall;
use toolrelay_core::{
    Error, ProcessorBuilder, QueryProcessor, Result, StopReason, Tool, ToolRegistry, ToolResult,
};

/// Gateway stub replaying scripted assistant turns
#[derive(Default)]
struct ScriptedClient {
    turns: Mutex<VecDeque<LlmMessage>>,
    fallback: Option<LlmMessage>,
    calls: AtomicUsize,
    seen_tools: Mutex<Vec<Vec<String>>>,
    seen_options: Mutex<Vec<ChatOptions>>,
}

impl ScriptedClient {
    fn new(turns: Vec<LlmMessage>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            ..Default::default()
        }
    }

    /// Always answers with `turn` once the script is empty
    fn repeating(turn: LlmMessage) -> Self {
        Self {
            fallback: Some(turn),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        _messages: &[LlmMessage],
        tools: &[ToolDefinition],
        options: &ChatOptions,
    ) -> Result<LlmResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_tools
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.function.name.clone()).collect());
        self.seen_options.lock().unwrap().push(options.clone());

        let next = self.turns.lock().unwrap().pop_front();
        let message = match (next, &self.fallback) {
            (Some(message), _) => message,
            (None, Some(fallback)) => {
                let mut message = fallback.clone();
                // fresh ids per turn, like a real model
                if let Some(calls) = message.tool_calls.as_mut() {
                    for call in calls {
                        call.id = format!("{}_{}", call.id, n);
                    }
                }
                message
            }
            (None, None) => {
                return Err(LlmError::InvalidRequest {
                    message: "script exhausted".to_string(),
                }
                .into())
            }
        };

        let mut response = LlmResponse::from_message(message, "stub-model");
        response.usage = Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 2,
            total_tokens: 12,
        });
        Ok(response)
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

/// Tool returning a fixed content and counting invocations
struct FixedTool {
    name: &'static str,
    content: Value,
    invocations: Arc<AtomicUsize>,
}

impl FixedTool {
    fn new(name: &'static str, content: Value) -> Self {
        Self {
            name,
            content,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed value"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _call: ToolCall) -> Result<ToolResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::json(self.content.clone()))
    }
}

fn text(content: &str) -> LlmMessage {
    LlmMessage::assistant(content)
}

fn empty_turn() -> LlmMessage {
    LlmMessage {
        role: MessageRole::Assistant,
        content: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

fn tool_turn(calls: &[(&str, &str, &str)]) -> LlmMessage {
    LlmMessage::assistant_tool_calls(
        None,
        calls
            .iter()
            .map(|(id, name, args)| ToolCallRequest::new(*id, *name, *args))
            .collect(),
    )
}

fn processor(client: Arc<ScriptedClient>, registry: ToolRegistry) -> QueryProcessor {
    ProcessorBuilder::new(client, registry).build()
}

fn calculator_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool::new());
    registry
}

fn names(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Every tool message directly follows an assistant message carrying exactly
/// the one request it answers.
fn assert_history_pairs(history: &[LlmMessage]) {
    for (i, message) in history.iter().enumerate() {
        if message.role != MessageRole::Tool {
            continue;
        }
        assert!(i > 0, "tool message at the start of history");
        let previous = &history[i - 1];
        assert_eq!(previous.role, MessageRole::Assistant);
        let calls = previous.get_tool_calls();
        assert_eq!(calls.len(), 1, "assistant message must carry one tool call");
        assert_eq!(Some(&calls[0].id), message.tool_call_id.as_ref());
    }
}

#[tokio::test]
async fn test_direct_answer() {
    let client = Arc::new(ScriptedClient::new(vec![text("4")]));
    let processor = processor(client.clone(), calculator_registry());

    let answer = processor.process_query("What is 2+2?", None).await.unwrap();

    assert_eq!(answer, "4");
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_absent_content_yields_empty_answer() {
    let client = Arc::new(ScriptedClient::new(vec![empty_turn()]));
    let processor = processor(client, calculator_registry());

    let execution = processor.execute_query("hello", None).await.unwrap();

    assert_eq!(execution.answer, "");
    assert_eq!(execution.stop_reason, StopReason::Completed);
    assert_eq!(execution.tool_rounds, 0);
}

#[tokio::test]
async fn test_single_calculator_round() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[("call_1", "calculator", r#"{"expr": "2+2"}"#)]),
        text("The answer is 4"),
    ]));
    let processor = processor(client.clone(), calculator_registry());

    let execution = processor.execute_query("What is 2+2?", None).await.unwrap();

    let lines: Vec<&str> = execution.answer.lines().collect();
    let annotation = lines
        .iter()
        .position(|l| *l == r#"[Calling tool calculator with args {"expr":"2+2"}]"#)
        .expect("annotation line missing");
    let final_line = lines
        .iter()
        .position(|l| *l == "The answer is 4")
        .expect("final answer missing");
    assert!(annotation < final_line);
    assert_eq!(lines.last(), Some(&"The answer is 4"));

    assert_eq!(execution.tool_rounds, 1);
    assert_eq!(execution.model_calls, 2);
    assert_eq!(client.calls(), 2);
    assert_eq!(execution.usage.map(|u| u.total_tokens), Some(24));

    let history = &execution.history;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, MessageRole::System);
    assert_eq!(history[1].role, MessageRole::User);
    assert_eq!(history[1].get_text(), Some("What is 2+2?"));
    assert_eq!(history[2].get_tool_calls()[0].arguments, r#"{"expr":"2+2"}"#);
    assert_eq!(history[3].get_text(), Some("4"));
    assert_eq!(history[3].tool_call_id.as_deref(), Some("call_1"));
    assert_history_pairs(history);
}

#[tokio::test]
async fn test_multiple_calls_keep_request_order() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[
            ("a", "calculator", r#"{"expr": "1+1"}"#),
            ("b", "calculator", r#"{"expr": "2*3"}"#),
            ("c", "calculator", r#"{"expr": "10/4"}"#),
        ]),
        text("done"),
    ]));
    let processor = processor(client, calculator_registry());

    let execution = processor.execute_query("compute", None).await.unwrap();

    let tool_messages: Vec<(&str, &str)> = execution
        .history
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .map(|m| {
            (
                m.tool_call_id.as_deref().unwrap(),
                m.get_text().unwrap(),
            )
        })
        .collect();
    assert_eq!(tool_messages, vec![("a", "2"), ("b", "6"), ("c", "2.5")]);
    assert_history_pairs(&execution.history);
    assert_eq!(execution.answer.matches("[Calling tool calculator").count(), 3);
}

#[tokio::test]
async fn test_budget_exhaustion() {
    let budget = 3;
    let client = Arc::new(ScriptedClient::repeating(tool_turn(&[(
        "call",
        "ping",
        "{}",
    )])));
    let ping = FixedTool::new("ping", json!("pong"));
    let invocations = ping.invocations.clone();
    let mut registry = ToolRegistry::new();
    registry.register(ping);

    let processor = ProcessorBuilder::new(client.clone(), registry)
        .with_max_tool_rounds(budget)
        .build();

    let execution = processor.execute_query("loop forever", None).await.unwrap();

    assert_eq!(execution.stop_reason, StopReason::BudgetExhausted);
    assert!(execution.budget_exhausted());
    assert_eq!(execution.tool_rounds, budget);
    assert_eq!(invocations.load(Ordering::SeqCst), budget);
    assert!(client.calls() <= budget + 1);
    assert_eq!(client.calls(), budget + 1);
    assert_eq!(
        execution.answer.matches("[Calling tool ping with args {}]").count(),
        budget
    );
    assert_history_pairs(&execution.history);
}

#[tokio::test]
async fn test_zero_budget_never_dispatches() {
    let client = Arc::new(ScriptedClient::repeating(tool_turn(&[(
        "call",
        "ping",
        "{}",
    )])));
    let ping = FixedTool::new("ping", json!("pong"));
    let invocations = ping.invocations.clone();
    let mut registry = ToolRegistry::new();
    registry.register(ping);

    let processor = ProcessorBuilder::new(client.clone(), registry)
        .with_max_tool_rounds(0)
        .build();

    let execution = processor.execute_query("q", None).await.unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(execution.history.len(), 2);
    assert_eq!(execution.stop_reason, StopReason::BudgetExhausted);
}

#[tokio::test]
async fn test_unknown_tool_aborts_query() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[("call_1", "x", "{}")]),
        text("never reached"),
    ]));
    let processor = processor(client.clone(), calculator_registry());

    let err = processor.process_query("use x", None).await.unwrap_err();

    assert!(err.is_tool_not_found());
    assert!(matches!(err, Error::Tool(ToolError::NotFound { ref name }) if name == "x"));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_malformed_arguments_abort_query() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[("call_1", "calculator", "{\"expr\": ")]),
        text("never reached"),
    ]));
    let processor = processor(client.clone(), calculator_registry());

    let err = processor.process_query("2+2", None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Tool(ToolError::MalformedArguments { .. })
    ));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_tool_failure_aborts_query() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[("call_1", "calculator", r#"{"expr": "1/0"}"#)]),
        text("never reached"),
    ]));
    let processor = processor(client.clone(), calculator_registry());

    let err = processor.process_query("1/0", None).await.unwrap_err();

    assert!(matches!(err, Error::Tool(ToolError::ExecutionFailed { .. })));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_gateway_failure_propagates() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let processor = processor(client, calculator_registry());

    let err = processor.process_query("anything", None).await.unwrap_err();

    assert!(matches!(err, Error::Llm(LlmError::InvalidRequest { .. })));
}

#[tokio::test]
async fn test_tool_filter_limits_advertised_schemas() {
    let mut registry = calculator_registry();
    registry.register(FixedTool::new("weather", json!({"temp": 21})));
    registry.register(FixedTool::new("news", json!([])));

    let client = Arc::new(ScriptedClient::new(vec![text("a"), text("b")]));
    let processor = processor(client.clone(), registry);

    processor.process_query("q", None).await.unwrap();
    processor
        .process_query("q", Some(&names(&["news", "calculator", "missing"])))
        .await
        .unwrap();

    let seen = client.seen_tools.lock().unwrap();
    assert_eq!(seen[0], vec!["calculator", "weather", "news"]);
    assert_eq!(seen[1], vec!["calculator", "news"]);
}

#[tokio::test]
async fn test_structured_tool_result_is_stringified() {
    let mut registry = ToolRegistry::new();
    registry.register(FixedTool::new("weather", json!({"temp": 21, "sky": "clear"})));

    let client = Arc::new(ScriptedClient::new(vec![
        tool_turn(&[("w1", "weather", r#"{"city": "Paris"}"#)]),
        empty_turn(),
    ]));
    let processor = processor(client, registry);

    let execution = processor.execute_query("weather?", None).await.unwrap();

    let tool_message = execution.history.last().unwrap();
    let content: Value = serde_json::from_str(tool_message.get_text().unwrap()).unwrap();
    assert_eq!(content, json!({"temp": 21, "sky": "clear"}));
    // empty follow-up content adds no line
    assert_eq!(
        execution.answer,
        "\n[Calling tool weather with args {\"city\":\"Paris\"}]"
    );
}

#[tokio::test]
async fn test_request_carries_model_and_temperature() {
    let client = Arc::new(ScriptedClient::new(vec![text("ok")]));
    let processor = ProcessorBuilder::new(client.clone(), ToolRegistry::new())
        .with_model("gpt-4")
        .with_temperature(Some(0.7))
        .build();

    processor.process_query("hi", None).await.unwrap();

    let options = client.seen_options.lock().unwrap();
    assert_eq!(options[0].model.as_deref(), Some("gpt-4"));
    assert_eq!(options[0].temperature, Some(0.7));
}

/// Tool that never finishes on its own
struct StuckTool;

#[async_trait]
impl Tool for StuckTool {
    fn name(&self) -> &str {
        "stuck"
    }

    fn description(&self) -> &str {
        "Never returns"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _call: ToolCall) -> Result<ToolResult> {
        futures::future::pending::<()>().await;
        Ok(ToolResult::text("unreachable"))
    }
}

#[tokio::test]
async fn test_cancelled_query_stops_waiting_on_tool() {
    let mut registry = ToolRegistry::new();
    registry.register(StuckTool);
    let client = Arc::new(ScriptedClient::new(vec![tool_turn(&[("s1", "stuck", "{}")])]));
    let processor = processor(client.clone(), registry);

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        processor.process_query("hang", None),
    )
    .await;

    assert!(outcome.is_err(), "query should have been cancelled");
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_queries_have_independent_histories() {
    let client = Arc::new(ScriptedClient::repeating(text("same answer")));
    let processor = Arc::new(processor(client.clone(), calculator_registry()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let processor = processor.clone();
            tokio::spawn(async move {
                processor
                    .execute_query(&format!("question {}", i), None)
                    .await
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let execution = handle.await.unwrap();
        assert_eq!(execution.answer, "same answer");
        assert_eq!(execution.history.len(), 2);
        assert_eq!(execution.history[1].get_text(), Some(format!("question {}", i).as_str()));
    }
    assert_eq!(client.calls(), 8);
}
