//! Tool trait definition

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::context::ToolContext;

/// A tool that can be called by the dispatcher
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches LLM tool_use name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Whether the tool changes stored trips
    fn mutates(&self) -> bool {
        false
    }

    /// Execute the tool
    ///
    /// Tools never fail outright: problems come back as `ToolResult::error`.
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
    /// Trip created, updated or inspected by the call
    pub trip_id: Option<i64>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            is_error: false,
            trip_id: None,
        }
    }

    /// Successful result carrying a serialized payload
    pub fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(content) => Self::success(content),
            Err(e) => Self::error(format!("Failed to serialize result: {}", e)),
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            content: content.into(),
            is_error: true,
            trip_id: None,
        }
    }

    /// Attach the affected trip
    pub fn with_trip(mut self, trip_id: Option<i64>) -> Self {
        self.trip_id = trip_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("Trip saved");
        assert!(!result.is_error);
        assert_eq!(result.content, "Trip saved");
        assert_eq!(result.trip_id, None);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("Trip 4 not found");
        assert!(result.is_error);
        assert_eq!(result.content, "Trip 4 not found");
    }

    #[test]
    fn test_tool_result_json_with_trip() {
        let result = ToolResult::json(&serde_json::json!({ "status": "created" })).with_trip(Some(3));
        assert!(!result.is_error);
        assert!(result.content.contains("\"created\""));
        assert_eq!(result.trip_id, Some(3));
    }
}
