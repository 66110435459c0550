//! update_trip tool - field-level changes to an existing trip

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::TripStatus;
use crate::planning::{PlannerError, TripPatch};
use crate::tools::context::{opt_f64, opt_i64, opt_str, opt_str_list};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

pub struct UpdateTripTool;

/// Build a TripPatch from tool arguments
pub(crate) fn patch_from_input(input: &Value) -> Result<TripPatch, ToolError> {
    let status = opt_str(input, "status")?
        .map(|s| s.parse::<TripStatus>().map_err(ToolError::InvalidArgument))
        .transpose()?;
    let travelers_count = opt_i64(input, "travelers_count")?
        .map(|n| u32::try_from(n).map_err(|_| ToolError::InvalidArgument(format!("travelers_count {} is out of range", n))))
        .transpose()?;
    Ok(TripPatch {
        destination: opt_str(input, "destination")?,
        start_date: opt_str(input, "start_date")?,
        end_date: opt_str(input, "end_date")?,
        duration_days: opt_i64(input, "duration_days")?,
        budget: opt_f64(input, "budget")?,
        travelers_count,
        status,
        preferences: opt_str_list(input, "preferences")?,
        notes: opt_str(input, "notes")?,
    })
}

#[async_trait]
impl Tool for UpdateTripTool {
    fn name(&self) -> &'static str {
        "update_trip"
    }

    fn description(&self) -> &'static str {
        "Update fields of an existing trip. Only the fields given are changed. Defaults to the trip under discussion."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trip_id": { "type": "integer", "description": "Trip id" },
                "destination": { "type": "string" },
                "start_date": { "type": "string", "description": "YYYY-MM-DD" },
                "end_date": { "type": "string", "description": "YYYY-MM-DD" },
                "duration_days": { "type": "integer" },
                "budget": { "type": "number", "description": "Total budget in USD" },
                "travelers_count": { "type": "integer" },
                "status": { "type": "string", "enum": ["planning", "booked", "completed", "cancelled"] },
                "preferences": { "type": "array", "items": { "type": "string" } },
                "notes": { "type": "string" }
            }
        })
    }

    fn mutates(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let prepared = ctx
            .resolve_trip_id(&input)
            .and_then(|id| patch_from_input(&input).map(|patch| (id, patch)));
        let (trip_id, patch) = match prepared {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        debug!(trip_id, ?patch, "UpdateTripTool::execute: called");

        if patch.is_empty() {
            return ToolResult::error("No fields to update were given");
        }
        if let Err(e) = ctx.owned_trip(trip_id).await {
            return ToolResult::error(e.to_string());
        }

        match ctx.planner.update_trip(trip_id, patch).await {
            Ok(outcome) => ToolResult::json(&json!({
                "status": "updated",
                "trip_id": trip_id,
                "changed": outcome.changed,
                "message": outcome.message,
            }))
            .with_trip(Some(trip_id)),
            Err(PlannerError::Validation(failure)) => ToolResult::error(failure.message).with_trip(Some(trip_id)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
