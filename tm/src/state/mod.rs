//! State management with actor pattern
//!
//! StateManager owns the TripStore and processes messages via channels,
//! providing thread-safe access to persistent trips and users.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse, TripQuery};
