//! # toolrelay Core
//!
//! Core library for toolrelay - answers a single natural-language query by
//! relaying between an LLM completion endpoint and a fixed set of callable
//! tools.
//!
//! The heart of the crate is [`QueryProcessor`], which alternates between
//! asking the model and executing the tools it requests, keeps the
//! conversation history for the lifetime of one query, and stops either when
//! the model answers without requesting tools or when the tool-round budget
//! is spent.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

// Re-export commonly used types
pub use agent::{ProcessorBuilder, ProcessorConfig, QueryExecution, QueryProcessor, StopReason};
pub use config::{ModelParams, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use tools::{Tool, ToolDescriptor, ToolRegistry, ToolResult};

/// Current version of the toolrelay-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing on stderr
///
/// `debug` forces the `debug` level; otherwise `RUST_LOG` is honored and
/// falls back to `info`.
pub fn init_tracing_with_debug(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
