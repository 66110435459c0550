//! Read-only trip tools: get_user_trips and get_trip_details

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::Trip;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Listing shape: enough to pick a trip, without itineraries
fn trip_summary(trip: &Trip) -> Value {
    json!({
        "id": trip.id,
        "destination": trip.destination,
        "start_date": trip.start_date,
        "end_date": trip.end_date,
        "duration_days": trip.duration_days,
        "budget": trip.budget,
        "travelers_count": trip.travelers_count,
        "status": trip.status,
        "preferences": trip.metadata.preferences,
        "itinerary_days": trip.metadata.itinerary.len(),
    })
}

pub struct GetUserTripsTool;

#[async_trait]
impl Tool for GetUserTripsTool {
    fn name(&self) -> &'static str {
        "get_user_trips"
    }

    fn description(&self) -> &'static str {
        "List all trips for the current user."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(user_id = ctx.user_id, "GetUserTripsTool::execute: called");
        match ctx.planner.list_trips(ctx.user_id).await {
            Ok(trips) if trips.is_empty() => ToolResult::success("The user has no trips yet."),
            Ok(trips) => {
                let listing: Vec<Value> = trips.iter().map(trip_summary).collect();
                ToolResult::json(&listing)
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

pub struct GetTripDetailsTool;

#[async_trait]
impl Tool for GetTripDetailsTool {
    fn name(&self) -> &'static str {
        "get_trip_details"
    }

    fn description(&self) -> &'static str {
        "Get full details of one trip, including its itinerary. Defaults to the trip under discussion."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trip_id": { "type": "integer", "description": "Trip id" }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let trip_id = match ctx.resolve_trip_id(&input) {
            Ok(id) => id,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        debug!(trip_id, "GetTripDetailsTool::execute: called");
        match ctx.owned_trip(trip_id).await {
            Ok(trip) => ToolResult::json(&trip).with_trip(Some(trip.id)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::planning::TripPlanner;
    use crate::state::StateManager;

    async fn ctx() -> (ToolContext, i64) {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let user = planner.create_user("ada@example.com", "Ada").await.unwrap();
        let mut trip = Trip::new(user.id, "Porto");
        trip.metadata.preferences = vec!["wine".to_string()];
        let trip_id = planner.state().create_trip(trip).await.unwrap();
        (ToolContext::new(planner, user.id), trip_id)
    }

    #[tokio::test]
    async fn test_get_user_trips() {
        let (ctx, _) = ctx().await;
        let result = GetUserTripsTool.execute(json!({}), &ctx).await;
        assert!(!result.is_error);
        let listing: Vec<Value> = serde_json::from_str(&result.content).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0]["destination"], "Porto");
        assert_eq!(listing[0]["preferences"][0], "wine");
    }

    #[tokio::test]
    async fn test_get_trip_details_uses_context_trip() {
        let (ctx, trip_id) = ctx().await;
        let ctx = ctx.with_trip(Some(trip_id));
        let result = GetTripDetailsTool.execute(json!({}), &ctx).await;
        assert!(!result.is_error);
        assert_eq!(result.trip_id, Some(trip_id));
        assert!(result.content.contains("Porto"));
    }

    #[tokio::test]
    async fn test_get_trip_details_missing() {
        let (ctx, _) = ctx().await;
        let result = GetTripDetailsTool.execute(json!({ "trip_id": 404 }), &ctx).await;
        assert!(result.is_error);
        assert!(result.content.contains("404"));

        let result = GetTripDetailsTool.execute(json!({}), &ctx).await;
        assert!(result.is_error);
        assert!(result.content.contains("No trip selected"));
    }
}
