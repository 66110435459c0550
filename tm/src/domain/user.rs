//! User record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tripstore::{IndexValue, Record, now_ms};

/// A TripMind user; owns zero or more trips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique, stored lowercased
    pub email: String,

    /// Display name
    pub name: String,

    pub created_at: i64,

    pub updated_at: i64,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: 0,
            email: normalize_email(&email.into()),
            name: name.into().trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "users"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), IndexValue::String(normalize_email(&self.email)));
        fields
    }
}
