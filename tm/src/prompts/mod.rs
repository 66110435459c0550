//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the dispatcher,
//! the itinerary writer and the question answerer.
//!
//! Template loading chain:
//! 1. `.tripmind/prompts/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DaySlot, DispatcherContext, ItineraryContext, PromptLoader, QuestionContext, TripView};
