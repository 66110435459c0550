//! Tool system for the trip dispatcher
//!
//! Every intent the dispatcher recognizes ends in a tool call. Tools run
//! with a `ToolContext` scoped to one user, so they only ever read or
//! change that user's trips.

mod context;
mod error;
mod executor;
mod traits;

pub mod builtin;

pub use context::{ToolContext, opt_f64, opt_i64, opt_str, opt_str_list};
pub use error::ToolError;
pub use executor::ToolExecutor;
pub use traits::{Tool, ToolResult};
