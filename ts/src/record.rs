//! Record trait and query types

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A value stored in the index table
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
}

impl IndexValue {
    pub(crate) fn to_sql(&self) -> rusqlite::types::Value {
        match self {
            IndexValue::String(s) => rusqlite::types::Value::Text(s.clone()),
            IndexValue::Int(i) => rusqlite::types::Value::Integer(*i),
        }
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        IndexValue::String(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        IndexValue::String(s)
    }
}

impl From<i64> for IndexValue {
    fn from(i: i64) -> Self {
        IndexValue::Int(i)
    }
}

/// Comparison operator for a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// A single indexed-field condition; multiple filters are ANDed
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    /// Equality filter, the common case
    pub fn eq(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }
}

/// A persistable record
///
/// `id` is 0 until the store assigns one on create.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    fn updated_at(&self) -> i64;

    fn collection_name() -> &'static str;

    fn indexed_fields(&self) -> HashMap<String, IndexValue>;
}
