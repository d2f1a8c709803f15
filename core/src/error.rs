//! Error types and handling for toolrelay core

use thiserror::Error;

/// Result type alias for toolrelay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for toolrelay core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool resolution and execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Any other error object returned by the endpoint
    #[error("API error ({code}): {message}")]
    ApiError { code: String, message: String },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// Tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// The model asked for a tool that is not registered
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    /// The argument payload of a tool call is not a JSON object
    #[error("Malformed arguments for tool '{name}': {message}")]
    MalformedArguments { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },
}

impl Error {
    /// Whether this error means a requested tool does not exist
    pub fn is_tool_not_found(&self) -> bool {
        matches!(self, Error::Tool(ToolError::NotFound { .. }))
    }
}
