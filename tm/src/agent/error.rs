//! Agent error types

use thiserror::Error;

use crate::llm::LlmError;
use crate::planning::PlannerError;

/// Errors raised while handling one chat message
///
/// These never reach the user verbatim: `TripAgent` turns them into an
/// apologetic reply tagged `error`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Classifier failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
