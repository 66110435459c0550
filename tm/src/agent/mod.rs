//! Conversational agent
//!
//! Turns chat messages into tool calls. A classifier picks the intent, the
//! policy guard decides whether the resulting calls may run now, and the
//! tool executor carries them out against the user's trips.

mod error;
mod intent;
mod policy;
mod repl;
mod session;

pub use error::AgentError;
pub use intent::{ClassifyRequest, Intent, IntentClassifier, LlmIntentClassifier, RuleIntentClassifier};
pub use policy::{PolicyGuard, Review};
pub use repl::{ChatRepl, print_response};
pub use session::{AgentResponse, ChatSession, TripAgent};
