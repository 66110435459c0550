//! Tool error types

use thiserror::Error;

/// Errors that can occur while preparing or running a tool call
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required parameter: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No trip selected. Tell me which trip (by id) you mean, or plan one first.")]
    NoTripSelected,

    #[error("Trip {0} not found")]
    TripNotFound(i64),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}
