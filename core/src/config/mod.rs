//! Minimal configuration module for toolrelay core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{ModelParams, ResolvedLlmConfig, DEFAULT_BASE_URL};
