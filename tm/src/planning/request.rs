//! Inputs to the planner: new-trip requests and field patches

use serde::{Deserialize, Serialize};

use crate::domain::{Trip, TripStatus};

/// A prospective trip, as extracted from a chat message or CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripRequest {
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration_days: Option<i64>,
    /// USD
    pub budget: Option<f64>,
    pub travelers_count: Option<u32>,
    pub preferences: Vec<String>,
    pub country_code: Option<String>,
    pub notes: Option<String>,
}

impl TripRequest {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn dates(mut self, start: &str, end: &str) -> Self {
        self.start_date = Some(start.to_string());
        self.end_date = Some(end.to_string());
        self
    }

    pub fn start(mut self, start: &str) -> Self {
        self.start_date = Some(start.to_string());
        self
    }

    pub fn duration(mut self, days: i64) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn budget(mut self, usd: f64) -> Self {
        self.budget = Some(usd);
        self
    }

    pub fn preferences<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.preferences = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Drop blank optional strings so "" never overwrites a stored value
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        self.destination = self.destination.trim().to_string();
        self.start_date = blank_to_none(self.start_date);
        self.end_date = blank_to_none(self.end_date);
        self.country_code = blank_to_none(self.country_code).map(|c| c.to_uppercase());
        self.notes = blank_to_none(self.notes);
        self.preferences = self
            .preferences
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn has_start_date(&self) -> bool {
        self.start_date.is_some()
    }

    /// Build a fresh planning trip for `user_id` from this request
    pub fn to_trip(&self, user_id: i64) -> Trip {
        let mut trip = Trip::new(user_id, self.destination.clone());
        trip.start_date = self.start_date.clone();
        trip.end_date = self.end_date.clone();
        trip.duration_days = self.duration_days;
        trip.budget = self.budget;
        trip.travelers_count = self.travelers_count.unwrap_or(1);
        trip.metadata.preferences = self.preferences.clone();
        trip.metadata.country_code = self.country_code.clone();
        trip.metadata.notes = self.notes.clone();
        trip.metadata.source = Some("user_input".to_string());
        trip
    }
}

/// Field-level changes to an existing trip; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPatch {
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration_days: Option<i64>,
    pub budget: Option<f64>,
    pub travelers_count: Option<u32>,
    pub status: Option<TripStatus>,
    /// Replaces the stored list when present
    pub preferences: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build the patched trip and the names of the fields that changed
    pub fn apply(&self, trip: &Trip) -> (Trip, Vec<&'static str>) {
        let mut next = trip.clone();
        let mut changed = Vec::new();

        if let Some(destination) = &self.destination
            && destination.trim() != trip.destination
        {
            next.destination = destination.trim().to_string();
            changed.push("destination");
        }
        if self.start_date.is_some() && self.start_date != trip.start_date {
            next.start_date = self.start_date.clone();
            changed.push("start_date");
        }
        if self.end_date.is_some() && self.end_date != trip.end_date {
            next.end_date = self.end_date.clone();
            changed.push("end_date");
        }
        if self.duration_days.is_some() && self.duration_days != trip.duration_days {
            next.duration_days = self.duration_days;
            changed.push("duration_days");
        }
        if self.budget.is_some() && self.budget != trip.budget {
            next.budget = self.budget;
            changed.push("budget");
        }
        if let Some(count) = self.travelers_count
            && count != trip.travelers_count
        {
            next.travelers_count = count;
            changed.push("travelers_count");
        }
        if let Some(status) = self.status
            && status != trip.status
        {
            next.status = status;
            changed.push("status");
        }
        if let Some(preferences) = &self.preferences
            && *preferences != trip.metadata.preferences
        {
            next.metadata = crate::domain::TripMetadata {
                preferences: preferences.clone(),
                ..trip.metadata.clone()
            };
            changed.push("preferences");
        }
        if self.notes.is_some() && self.notes != trip.metadata.notes {
            next.metadata = crate::domain::TripMetadata {
                notes: self.notes.clone(),
                ..next.metadata
            };
            changed.push("notes");
        }

        if !changed.is_empty() {
            next.touch();
        }
        (next, changed)
    }
}
