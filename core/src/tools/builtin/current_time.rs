//! Current date/time tool

use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{json, Value};

/// Reports the current date and time
pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. \
         Optionally shifted to a fixed UTC offset in hours (e.g. 8 for UTC+8)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "utc_offset_hours": {
                    "type": "number",
                    "description": "Offset from UTC in hours, between -12 and 14. Defaults to 0."
                }
            }
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let offset_hours = call
            .get_optional_parameter::<f64>("utc_offset_hours")?
            .unwrap_or(0.0);
        let now = shifted_now(Utc::now(), offset_hours)?;

        Ok(ToolResult::json(json!({
            "datetime": now.to_rfc3339(),
            "date": now.format("%Y-%m-%d").to_string(),
            "time": now.format("%H:%M:%S").to_string(),
            "weekday": now.format("%A").to_string(),
            "utc_offset": now.offset().to_string(),
        })))
    }
}

fn shifted_now(now: DateTime<Utc>, offset_hours: f64) -> Result<DateTime<FixedOffset>> {
    if !(-12.0..=14.0).contains(&offset_hours) {
        return Err(ToolError::InvalidParameters {
            message: format!("utc_offset_hours out of range: {}", offset_hours),
        }
        .into());
    }

    let seconds = (offset_hours * 3600.0).round() as i32;
    let offset = FixedOffset::east_opt(seconds).ok_or_else(|| ToolError::InvalidParameters {
        message: format!("invalid utc offset: {}", offset_hours),
    })?;

    Ok(now.with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shifted_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 20, 30, 0).unwrap();

        let shifted = shifted_now(now, 8.0).unwrap();
        assert_eq!(shifted.format("%Y-%m-%d %H:%M").to_string(), "2024-02-01 04:30");

        let shifted = shifted_now(now, -5.5).unwrap();
        assert_eq!(shifted.format("%H:%M").to_string(), "15:00");

        assert!(shifted_now(now, 20.0).is_err());
    }

    #[tokio::test]
    async fn test_execute_returns_structured_time() {
        let result = CurrentTimeTool::new()
            .execute(ToolCall::new("current_time", json!({})))
            .await
            .unwrap();

        assert_eq!(result.content["utc_offset"], "+00:00");
        assert!(result.content["datetime"].is_string());

        let result = CurrentTimeTool::new()
            .execute(ToolCall::new("current_time", json!({"utc_offset_hours": 9})))
            .await
            .unwrap();
        assert_eq!(result.content["utc_offset"], "+09:00");
    }

    #[tokio::test]
    async fn test_execute_rejects_mistyped_offset() {
        let err = CurrentTimeTool::new()
            .execute(ToolCall::new("current_time", json!({"utc_offset_hours": "8"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::Error::Tool(crate::error::ToolError::InvalidParameters { .. })
        ));
    }
}
