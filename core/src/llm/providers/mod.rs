//! Concrete LLM client implementations

pub mod openai;

pub use openai::OpenAiClient;
