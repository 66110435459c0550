//! TripMind - conversational travel planner
//!
//! TripMind turns chat messages into structured trip records and
//! itineraries. An LLM (or a rule-based fallback) only translates language
//! into tool calls; everything that decides what gets stored lives here.
//!
//! # Core Concepts
//!
//! - **Validate before write**: destinations, dates and budgets are checked
//!   against static rules before any trip is created
//! - **One trip per plan**: repeated requests for the same destination and
//!   month update the existing planning trip instead of adding another
//! - **Capped itineraries**: long trips are generated a few days at a time
//!   and marked partial until complete
//!
//! # Modules
//!
//! - [`agent`] - Intent classification, policy checks, chat sessions, REPL
//! - [`planning`] - Validation, deduplication and itinerary policy
//! - [`tools`] - Tool system the dispatcher calls
//! - [`state`] - Actor owning the trip store
//! - [`domain`] - Trip and User records
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod dates;
pub mod domain;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod state;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentResponse, ChatSession, TripAgent};
pub use config::{Config, LlmConfig};
pub use domain::{Trip, TripStatus, User};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use planning::{PlanOutcome, PlanStatus, TripPatch, TripPlanner, TripRequest};
pub use state::{StateError, StateManager};
pub use tools::{Tool, ToolContext, ToolError, ToolExecutor, ToolResult};
