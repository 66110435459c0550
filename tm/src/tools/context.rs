//! ToolContext - execution context for tools

use serde_json::Value;
use tracing::debug;

use super::ToolError;
use crate::domain::Trip;
use crate::planning::TripPlanner;

/// Execution context for tools - scoped to one user's chat turn
///
/// Trip-touching tools only ever see trips owned by `user_id`.
#[derive(Clone)]
pub struct ToolContext {
    /// Acting user
    pub user_id: i64,

    /// Trip the conversation is about: the bound trip, else the last one touched
    pub trip_id: Option<i64>,

    /// The user message being handled
    pub message: String,

    pub planner: TripPlanner,
}

impl ToolContext {
    pub fn new(planner: TripPlanner, user_id: i64) -> Self {
        debug!(user_id, "ToolContext::new: called");
        Self {
            user_id,
            trip_id: None,
            message: String::new(),
            planner,
        }
    }

    pub fn with_trip(mut self, trip_id: Option<i64>) -> Self {
        self.trip_id = trip_id;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Pick the trip a call refers to: explicit id first, then the context's
    pub fn resolve_trip_id(&self, input: &Value) -> Result<i64, ToolError> {
        match opt_i64(input, "trip_id")? {
            Some(id) => Ok(id),
            None => self.trip_id.ok_or(ToolError::NoTripSelected),
        }
    }

    /// Load a trip owned by the acting user
    ///
    /// Other users' trips are reported as not found.
    pub async fn owned_trip(&self, trip_id: i64) -> Result<Trip, ToolError> {
        debug!(trip_id, user_id = self.user_id, "ToolContext::owned_trip: called");
        match self.planner.get_trip(trip_id).await {
            Ok(trip) if trip.user_id == self.user_id => Ok(trip),
            Ok(_) => {
                debug!(trip_id, "ToolContext::owned_trip: trip belongs to another user");
                Err(ToolError::TripNotFound(trip_id))
            }
            Err(e) if e.is_not_found() => Err(ToolError::TripNotFound(trip_id)),
            Err(e) => Err(ToolError::InvalidArgument(e.to_string())),
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("user_id", &self.user_id)
            .field("trip_id", &self.trip_id)
            .field("message", &self.message)
            .finish()
    }
}

// Models send numbers as strings often enough that strict typing loses
// otherwise usable calls.

/// Optional string argument; blank strings count as absent
pub fn opt_str(input: &Value, key: &'static str) -> Result<Option<String>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ToolError::InvalidArgument(format!("{} must be a string, got {}", key, other))),
    }
}

/// Optional integer argument, accepting numeric strings
pub fn opt_i64(input: &Value, key: &'static str) -> Result<Option<i64>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgument(format!("{} must be a whole number", key))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('#')
            .parse()
            .map(Some)
            .map_err(|_| ToolError::InvalidArgument(format!("{} must be a whole number, got \"{}\"", key, s))),
        Some(other) => Err(ToolError::InvalidArgument(format!("{} must be a number, got {}", key, other))),
    }
}

/// Optional decimal argument, accepting "$1,200" style strings
pub fn opt_f64(input: &Value, key: &'static str) -> Result<Option<f64>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
            cleaned
                .parse()
                .map(Some)
                .map_err(|_| ToolError::InvalidArgument(format!("{} must be a number, got \"{}\"", key, s)))
        }
        Some(other) => Err(ToolError::InvalidArgument(format!("{} must be a number, got {}", key, other))),
    }
}

/// Optional list of strings; a single comma-separated string is split
pub fn opt_str_list(input: &Value, key: &'static str) -> Result<Option<Vec<String>>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(ToolError::InvalidArgument(format!("{} entries must be strings, got {}", key, other))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(Value::String(s)) => Ok(Some(
            s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect(),
        )),
        Some(other) => Err(ToolError::InvalidArgument(format!("{} must be a list, got {}", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::state::StateManager;
    use serde_json::json;

    #[test]
    fn test_argument_helpers() {
        let input = json!({
            "trip_id": "#12",
            "budget": "$1,500",
            "days": 4.0,
            "name": "  ",
            "prefs": "food, culture",
            "bad": true
        });
        assert_eq!(opt_i64(&input, "trip_id").unwrap(), Some(12));
        assert_eq!(opt_i64(&input, "days").unwrap(), Some(4));
        assert_eq!(opt_f64(&input, "budget").unwrap(), Some(1500.0));
        assert_eq!(opt_str(&input, "name").unwrap(), None);
        assert_eq!(opt_str(&input, "missing").unwrap(), None);
        assert_eq!(
            opt_str_list(&input, "prefs").unwrap(),
            Some(vec!["food".to_string(), "culture".to_string()])
        );
        assert!(opt_i64(&input, "bad").is_err());
        assert!(opt_f64(&json!({ "budget": "lots" }), "budget").is_err());
    }

    #[tokio::test]
    async fn test_resolve_trip_id() {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let ctx = ToolContext::new(planner, 1);
        assert!(matches!(ctx.resolve_trip_id(&json!({})), Err(ToolError::NoTripSelected)));

        let ctx = ctx.with_trip(Some(5));
        assert_eq!(ctx.resolve_trip_id(&json!({})).unwrap(), 5);
        assert_eq!(ctx.resolve_trip_id(&json!({ "trip_id": 8 })).unwrap(), 8);
    }

    #[tokio::test]
    async fn test_owned_trip_hides_other_users() {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let ada = planner.create_user("ada@example.com", "Ada").await.unwrap();
        let bob = planner.create_user("bob@example.com", "Bob").await.unwrap();
        let trip_id = planner
            .state()
            .create_trip(Trip::new(ada.id, "Rome"))
            .await
            .unwrap();

        let as_ada = ToolContext::new(planner.clone(), ada.id);
        assert_eq!(as_ada.owned_trip(trip_id).await.unwrap().destination, "Rome");

        let as_bob = ToolContext::new(planner, bob.id);
        assert!(matches!(as_bob.owned_trip(trip_id).await, Err(ToolError::TripNotFound(_))));
        assert!(matches!(as_bob.owned_trip(999).await, Err(ToolError::TripNotFound(999))));
    }
}
