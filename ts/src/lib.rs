//! TripStore - generic persistent record storage
//!
//! Records are serialized to JSON and kept in a single SQLite database.
//! Each record type declares a collection name and a set of indexed fields;
//! the index table backs filtered queries without deserializing every row.
//!
//! Ids are integers assigned by SQLite when a record is first created.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{Filter, FilterOp, IndexValue, Record, now_ms};
pub use store::{DB_FILE_NAME, Store};
