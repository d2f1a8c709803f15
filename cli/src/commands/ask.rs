//! Single query command

use crate::config::CliConfigLoader;
use anyhow::Result;
use colored::*;
use std::collections::HashSet;
use toolrelay_core::{ProcessorBuilder, ToolRegistry};
use tracing::{info, warn};

/// Answer one query and print the assembled result to stdout
pub async fn ask_command(
    query: String,
    tools: Vec<String>,
    show_history: bool,
    config_loader: CliConfigLoader,
) -> Result<()> {
    let settings = config_loader.load().await?;
    info!("Using model: {}", settings.llm.model);

    let registry = ToolRegistry::with_builtin_tools();

    // --tool flags take precedence over the configured list
    let selected: Option<HashSet<String>> = if tools.is_empty() {
        settings.tools.map(|names| names.into_iter().collect())
    } else {
        Some(tools.into_iter().collect())
    };

    if let Some(names) = &selected {
        for name in names {
            if registry.get(name).is_err() {
                warn!("ignoring unknown tool: {}", name);
            }
        }
    }

    let mut builder = ProcessorBuilder::from_llm_config(&settings.llm, registry)?
        .with_system_prompt(settings.system_prompt);
    if let Some(max_rounds) = settings.max_tool_rounds {
        builder = builder.with_max_tool_rounds(max_rounds);
    }
    let processor = builder.build();

    let execution = processor.execute_query(&query, selected.as_ref()).await?;

    println!("{}", execution.answer);

    if execution.budget_exhausted() {
        eprintln!(
            "{}",
            format!(
                "Stopped after {} tool rounds; the model still wanted to call tools.",
                execution.tool_rounds
            )
            .yellow()
        );
    }

    if show_history {
        eprintln!("{}", serde_json::to_string_pretty(&execution.history)?);
    }

    info!(
        model_calls = execution.model_calls,
        tool_rounds = execution.tool_rounds,
        duration_ms = execution.duration_ms,
        "query complete"
    );
    if let Some(usage) = execution.usage {
        info!(
            "tokens used: {} prompt + {} completion = {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }

    Ok(())
}
