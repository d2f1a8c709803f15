//! Tools listing command

use anyhow::Result;
use colored::*;
use toolrelay_core::ToolRegistry;
use tracing::info;

/// Longest description shown per tool
const DESCRIPTION_WIDTH: usize = 72;

/// Show available tools
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    let registry = ToolRegistry::with_builtin_tools();

    println!("{}\n", "Available tools".bold());
    for summary in registry.catalog(DESCRIPTION_WIDTH) {
        println!("  {}", summary.name.cyan().bold());
        println!("    {}\n", summary.description);
    }

    println!(
        "{}",
        "Limit a query to some of them with: toolrelay ask --tool <NAME> \"...\"".dimmed()
    );

    Ok(())
}
