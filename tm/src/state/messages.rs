//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;
use tripstore::StoreError;

use crate::domain::{Trip, TripStatus, User};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<StoreError> for StateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::NotFound(format!("{}/{}", collection, id)),
            other => Self::StoreError(other.to_string()),
        }
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Filters for trip listings; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct TripQuery {
    pub user_id: Option<i64>,
    pub status: Option<TripStatus>,
    /// Compared against the trimmed, lowercased destination
    pub destination: Option<String>,
}

impl TripQuery {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: TripStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn destination(mut self, destination: &str) -> Self {
        self.destination = Some(crate::domain::destination_key(destination));
        self
    }
}

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Trip operations
    CreateTrip {
        trip: Trip,
        reply: oneshot::Sender<StateResponse<i64>>,
    },
    GetTrip {
        id: i64,
        reply: oneshot::Sender<StateResponse<Option<Trip>>>,
    },
    UpdateTrip {
        trip: Trip,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    DeleteTrip {
        id: i64,
        reply: oneshot::Sender<StateResponse<bool>>,
    },
    ListTrips {
        query: TripQuery,
        reply: oneshot::Sender<StateResponse<Vec<Trip>>>,
    },

    // User operations
    CreateUser {
        user: User,
        reply: oneshot::Sender<StateResponse<i64>>,
    },
    GetUser {
        id: i64,
        reply: oneshot::Sender<StateResponse<Option<User>>>,
    },
    GetUserByEmail {
        email: String,
        reply: oneshot::Sender<StateResponse<Option<User>>>,
    },
    ListUsers {
        reply: oneshot::Sender<StateResponse<Vec<User>>>,
    },
    /// Deletes the user and every trip they own; replies with the trip count
    DeleteUser {
        id: i64,
        reply: oneshot::Sender<StateResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
