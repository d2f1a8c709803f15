//! Query processing: the model/tool orchestration loop

pub mod config;
pub mod core;
pub mod execution;
pub mod transcript;

pub use config::{ProcessorBuilder, ProcessorConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SYSTEM_PROMPT};
pub use self::core::QueryProcessor;
pub use execution::{QueryExecution, StopReason};
pub use transcript::{Fragment, Transcript};
