//! # toolrelay CLI
//!
//! Command-line interface for toolrelay - ask an LLM a question and let it
//! call tools to answer it.
//!
//! ## Usage
//!
//! - `toolrelay ask "What time is it in Tokyo?"` - Answer a single query
//! - `toolrelay ask --tool calculator "What is 17 * 23?"` - Restrict the tools offered
//! - `toolrelay tools` - Show available tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{ask_command, tools_command};
use config::CliConfigLoader;

/// toolrelay - answer queries with an LLM and callable tools
#[derive(Parser)]
#[command(name = "toolrelay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Answer a query by relaying between an LLM and a set of tools")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature override
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Maximum number of tool rounds per query
    #[arg(long, global = true)]
    max_rounds: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask {
        /// The question to answer
        query: String,

        /// Offer only this tool to the model (repeatable)
        #[arg(short, long = "tool", value_name = "NAME")]
        tools: Vec<String>,

        /// Print the final conversation history as JSON to stderr
        #[arg(long)]
        show_history: bool,
    },

    /// Show available tools
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(temperature) = cli.temperature {
        loader = loader.with_temperature_override(temperature);
    }

    if let Some(max_rounds) = cli.max_rounds {
        loader = loader.with_max_rounds_override(max_rounds);
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the answer
    toolrelay_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Commands::Ask {
            query,
            tools,
            show_history,
        } => ask_command(query, tools, show_history, config_loader).await,
        Commands::Tools => tools_command().await,
    }
}
