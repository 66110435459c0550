//! Domain types for TripMind
//!
//! Trip and User implement the Record trait for TripStore persistence.
//! Itinerary, booking, checklist and expense records live inside a trip's
//! metadata bag.

mod trip;
mod user;

pub use trip::{
    Activity, ActivityKind, BookingSource, ChecklistItem, Expense, FlightOption, HotelOption, ItineraryConfig,
    ItineraryDay, TransportOption, Trip, TripMetadata, TripStatus,
};
pub use user::User;
pub(crate) use trip::destination_key;
pub(crate) use user::normalize_email;

// Re-export tripstore types for convenience
pub use tripstore::{Filter, FilterOp, IndexValue, Record, Store, now_ms};
