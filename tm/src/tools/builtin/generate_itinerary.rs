//! generate_itinerary tool - day-by-day plans, at most a few days per call

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::planning::ItineraryStatus;
use crate::tools::context::{opt_i64, opt_str_list};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

pub struct GenerateItineraryTool;

#[async_trait]
impl Tool for GenerateItineraryTool {
    fn name(&self) -> &'static str {
        "generate_itinerary"
    }

    fn description(&self) -> &'static str {
        "Generate a day-by-day itinerary for a trip. Long trips are generated a few days at a time; \
         pass start_day to continue where the last generation stopped."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trip_id": { "type": "integer", "description": "Trip id" },
                "preferences": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Overrides the trip's stored preferences"
                },
                "start_day": { "type": "integer", "description": "First day to generate (default 1)" }
            }
        })
    }

    fn mutates(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let prepared = (|| -> Result<_, ToolError> {
            let trip_id = ctx.resolve_trip_id(&input)?;
            let preferences = opt_str_list(&input, "preferences")?;
            let start_day = opt_i64(&input, "start_day")?
                .map(|d| {
                    u32::try_from(d)
                        .ok()
                        .filter(|d| *d >= 1)
                        .ok_or_else(|| ToolError::InvalidArgument(format!("start_day {} must be at least 1", d)))
                })
                .transpose()?;
            Ok((trip_id, preferences, start_day))
        })();
        let (trip_id, preferences, start_day) = match prepared {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        debug!(trip_id, ?start_day, "GenerateItineraryTool::execute: called");

        if let Err(e) = ctx.owned_trip(trip_id).await {
            return ToolResult::error(e.to_string());
        }

        match ctx.planner.generate_itinerary(trip_id, preferences, start_day).await {
            Ok(outcome) => {
                let failed = outcome.status == ItineraryStatus::GenerationError;
                let result = ToolResult::json(&outcome).with_trip(Some(trip_id));
                if failed {
                    ToolResult {
                        is_error: true,
                        ..result
                    }
                } else {
                    result
                }
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::domain::Trip;
    use crate::planning::TripPlanner;
    use crate::state::StateManager;

    #[tokio::test]
    async fn test_generation_error_is_reported() {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let user = planner.create_user("ada@example.com", "Ada").await.unwrap();
        let trip_id = planner.state().create_trip(Trip::new(user.id, "Rome")).await.unwrap();
        let ctx = ToolContext::new(planner, user.id);

        let result = GenerateItineraryTool
            .execute(json!({ "trip_id": trip_id }), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("generation_error"));

        let result = GenerateItineraryTool
            .execute(json!({ "trip_id": trip_id, "start_day": 0 }), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("start_day"));
    }
}
