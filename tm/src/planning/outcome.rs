//! Structured results returned by the planner

use serde::Serialize;

use super::validation::ValidationReason;
use crate::domain::{Activity, ItineraryDay, Trip};

/// Result kind of a plan-or-update request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Created,
    Updated,
    NeedsClarification,
    ValidationError,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::NeedsClarification => write!(f, "needs_clarification"),
            Self::ValidationError => write!(f, "validation_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub status: PlanStatus,
    /// Created or updated trip; the existing trip for clarifications
    pub trip_id: Option<i64>,
    pub message: String,
    pub trip: Option<Trip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidationReason>,
}

impl PlanOutcome {
    pub(crate) fn created(trip: Trip) -> Self {
        Self {
            status: PlanStatus::Created,
            trip_id: Some(trip.id),
            message: format!("Successfully planned trip to {}", trip.destination),
            trip: Some(trip),
            reason: None,
        }
    }

    pub(crate) fn updated(trip: Trip) -> Self {
        Self {
            status: PlanStatus::Updated,
            trip_id: Some(trip.id),
            message: format!(
                "You were already planning {} (trip {}), so I updated it",
                trip.destination, trip.id
            ),
            trip: Some(trip),
            reason: None,
        }
    }

    pub(crate) fn clarify(existing: &Trip) -> Self {
        Self {
            status: PlanStatus::NeedsClarification,
            trip_id: Some(existing.id),
            message: format!(
                "You already have a trip to {} in planning (trip {}). Is this the same trip, or a new one? \
                 Giving me the month you're travelling will help me tell them apart.",
                existing.destination, existing.id
            ),
            trip: None,
            reason: None,
        }
    }

    pub(crate) fn invalid(reason: ValidationReason, message: String) -> Self {
        Self {
            status: PlanStatus::ValidationError,
            trip_id: None,
            message,
            trip: None,
            reason: Some(reason),
        }
    }
}

/// Result kind of an itinerary generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryStatus {
    Generated,
    GenerationError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryOutcome {
    pub status: ItineraryStatus,
    pub trip_id: i64,
    pub days_generated: u32,
    pub total_days: u32,
    pub is_partial: bool,
    /// The trip's full itinerary after merging
    pub itinerary: Vec<ItineraryDay>,
    pub message: String,
}

impl ItineraryOutcome {
    pub(crate) fn failed(trip: &Trip, total_days: u32, message: String) -> Self {
        Self {
            status: ItineraryStatus::GenerationError,
            trip_id: trip.id,
            days_generated: 0,
            total_days,
            is_partial: trip.metadata.itinerary_config.as_ref().is_some_and(|c| c.is_partial),
            itinerary: trip.metadata.itinerary.clone(),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub trip: Trip,
    pub changed: Vec<String>,
    pub message: String,
}

/// Result of a manual itinerary edit
#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutcome {
    pub trip_id: i64,
    pub day: u32,
    pub activity: Activity,
}
