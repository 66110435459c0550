//! Planner errors

use std::time::Duration;

use thiserror::Error;

use super::validation::ValidationFailure;
use crate::llm::LlmError;
use crate::state::StateError;

/// Failures of a single itinerary generation; the trip is left untouched
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No text-generation service is configured")]
    Unavailable,

    #[error("Itinerary generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Itinerary service failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not read the generated itinerary: {0}")]
    Parse(String),

    #[error("The generated itinerary had no usable days")]
    Empty,

    #[error("Day {start_day} is past the end of this {total_days}-day trip")]
    OutOfRange { start_day: u32, total_days: u32 },

    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Errors returned by TripPlanner operations
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("{0}")]
    Validation(ValidationFailure),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    State(StateError),

    #[error("Question answering failed: {0}")]
    Answer(String),
}

impl PlannerError {
    pub fn trip_not_found(id: i64) -> Self {
        Self::NotFound {
            what: "Trip",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound {
            what: "User",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StateError> for PlannerError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Conflict(msg) => Self::Conflict(msg),
            other => Self::State(other),
        }
    }
}
