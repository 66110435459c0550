//! Trip planning core
//!
//! Validation, deduplication and the itinerary generation policy, plus the
//! `TripPlanner` service that applies them against the state actor.

pub mod dedup;
mod error;
pub mod itinerary;
mod outcome;
mod request;
mod service;
pub mod validation;

pub use error::{GenerationError, PlannerError};
pub use outcome::{ActivityOutcome, ItineraryOutcome, ItineraryStatus, PlanOutcome, PlanStatus, UpdateOutcome};
pub use request::{TripPatch, TripRequest};
pub use service::TripPlanner;
pub use validation::{ValidationFailure, ValidationReason, validate_stored, validate_trip};
