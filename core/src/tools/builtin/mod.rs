//! Built-in tools

pub mod calculator;
pub mod current_time;
pub mod web_fetch;

pub use calculator::CalculatorTool;
pub use current_time::CurrentTimeTool;
pub use web_fetch::WebFetchTool;
