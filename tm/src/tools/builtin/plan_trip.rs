//! plan_trip tool - validate, deduplicate and save a new trip request

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::planning::{PlanStatus, TripRequest};
use crate::tools::context::{opt_f64, opt_i64, opt_str, opt_str_list};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

pub struct PlanTripTool;

/// Build a TripRequest from tool arguments
pub(crate) fn request_from_input(input: &Value) -> Result<TripRequest, ToolError> {
    Ok(TripRequest {
        destination: opt_str(input, "destination")?.unwrap_or_default(),
        start_date: opt_str(input, "start_date")?,
        end_date: opt_str(input, "end_date")?,
        duration_days: opt_i64(input, "duration_days")?,
        budget: opt_f64(input, "budget")?,
        travelers_count: opt_i64(input, "travelers_count")?
            .map(|n| u32::try_from(n).map_err(|_| ToolError::InvalidArgument(format!("travelers_count {} is out of range", n))))
            .transpose()?,
        preferences: opt_str_list(input, "preferences")?.unwrap_or_default(),
        country_code: opt_str(input, "country_code")?,
        notes: opt_str(input, "notes")?,
    })
}

#[async_trait]
impl Tool for PlanTripTool {
    fn name(&self) -> &'static str {
        "plan_trip"
    }

    fn description(&self) -> &'static str {
        "Plan and save a new trip. Validates the destination, dates and budget, and updates an \
         existing trip instead when the user is already planning the same destination for the same month."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "destination": { "type": "string", "description": "City or country" },
                "start_date": { "type": "string", "description": "YYYY-MM-DD, or 'Month YYYY' if only the month is known" },
                "end_date": { "type": "string", "description": "YYYY-MM-DD" },
                "duration_days": { "type": "integer", "description": "Trip length in days" },
                "budget": { "type": "number", "description": "Total budget in USD" },
                "travelers_count": { "type": "integer", "description": "Number of travelers (default 1)" },
                "preferences": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Interests such as food, culture, beaches"
                },
                "country_code": { "type": "string", "description": "ISO 3166 alpha-2 code" },
                "notes": { "type": "string" }
            },
            "required": ["destination"]
        })
    }

    fn mutates(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let request = match request_from_input(&input) {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        debug!(destination = %request.destination, user_id = ctx.user_id, "PlanTripTool::execute: called");

        match ctx.planner.plan_or_update_trip(ctx.user_id, request).await {
            Ok(outcome) => {
                // Clarifications point at the existing trip without changing it
                let touched = match outcome.status {
                    PlanStatus::Created | PlanStatus::Updated | PlanStatus::NeedsClarification => outcome.trip_id,
                    PlanStatus::ValidationError => None,
                };
                ToolResult::json(&outcome).with_trip(touched)
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
