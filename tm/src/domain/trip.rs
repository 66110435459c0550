//! Trip record and its metadata bag

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tripstore::{IndexValue, Record, now_ms};

use crate::dates;

/// Trip lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Still being shaped; the only status eligible for deduplication
    #[default]
    Planning,
    Booked,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Booked => write!(f, "booked"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planning" => Ok(Self::Planning),
            "booked" => Ok(Self::Booked),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!(
                "Unknown trip status: {}. Use: planning, booked, completed, or cancelled",
                s
            )),
        }
    }
}

/// Category of an itinerary activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ActivityKind {
    #[default]
    Activity,
    Dining,
    Flight,
    Hotel,
    Transport,
}

impl From<String> for ActivityKind {
    /// Generated output uses loose labels; anything unknown is an activity
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "dining" | "food" | "meal" | "restaurant" | "breakfast" | "lunch" | "dinner" => Self::Dining,
            "flight" | "flights" => Self::Flight,
            "hotel" | "accommodation" | "lodging" | "check-in" => Self::Hotel,
            "transport" | "transportation" | "transfer" | "train" | "bus" | "taxi" => Self::Transport,
            _ => Self::Activity,
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activity => write!(f, "activity"),
            Self::Dining => write!(f, "dining"),
            Self::Flight => write!(f, "flight"),
            Self::Hotel => write!(f, "hotel"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// One scheduled item within an itinerary day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique within the owning trip
    #[serde(default)]
    pub id: String,

    /// Time of day, "HH:MM"
    #[serde(default)]
    pub time: String,

    #[serde(rename = "type", default)]
    pub kind: ActivityKind,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_ref: Option<String>,
}

/// One day of an itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// 1-based day number within the trip
    pub day: u32,

    /// Calendar date, or "Day N" when the trip has no start date
    pub date: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// Who produced a booking-like record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    #[default]
    AiSuggested,
    UserAdded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    #[serde(default)]
    pub airline: String,
    #[serde(default)]
    pub flight_number: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub departure: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub source: BookingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub check_in: String,
    #[serde(default)]
    pub check_out: String,
    #[serde(default)]
    pub price_per_night: Option<f64>,
    #[serde(default)]
    pub source: BookingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportOption {
    pub mode: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: BookingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// A spend entry, in USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Record of the last itinerary generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryConfig {
    pub destination: String,
    pub total_trip_days: u32,
    pub requested_days: u32,
    pub generated_days: u32,
    /// First day number covered by the last generation
    pub start_day: u32,
    /// RFC 3339
    pub generated_at: String,
    pub is_partial: bool,
    #[serde(default)]
    pub preferences: Vec<String>,
}

/// Open metadata bag attached to a trip
///
/// Known keys are typed; anything else is preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripMetadata {
    /// Ordered preference tags ("food", "culture", ...)
    pub preferences: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub itinerary: Vec<ItineraryDay>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary_config: Option<ItineraryConfig>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flights: Vec<FlightOption>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hotels: Vec<HotelOption>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transport: Vec<TransportOption>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistItem>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expenses: Vec<Expense>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TripMetadata {
    /// Total of recorded expenses in USD
    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Find an activity by id, returning its day number
    pub fn find_activity(&self, activity_id: &str) -> Option<(u32, &Activity)> {
        self.itinerary
            .iter()
            .find_map(|d| d.activities.iter().find(|a| a.id == activity_id).map(|a| (d.day, a)))
    }
}

/// A user's travel plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Store-assigned id (0 before creation)
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    pub destination: String,

    pub start_date: Option<String>,

    pub end_date: Option<String>,

    pub duration_days: Option<i64>,

    /// Total budget in USD
    pub budget: Option<f64>,

    pub travelers_count: u32,

    pub status: TripStatus,

    #[serde(default)]
    pub metadata: TripMetadata,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Trip {
    /// Create a new planning trip for a user
    pub fn new(user_id: i64, destination: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: 0,
            user_id,
            destination: destination.into().trim().to_string(),
            start_date: None,
            end_date: None,
            duration_days: None,
            budget: None,
            travelers_count: 1,
            status: TripStatus::Planning,
            metadata: TripMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Lowercased, trimmed destination used for matching
    pub fn destination_key(&self) -> String {
        destination_key(&self.destination)
    }

    /// True trip length in days
    ///
    /// Explicit duration wins, then the inclusive span of parseable dates,
    /// then `default_days`.
    pub fn total_days(&self, default_days: u32) -> u32 {
        if let Some(d) = self.duration_days
            && d > 0
        {
            return d as u32;
        }
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date)
            && let Some(span) = dates::span_days(start, end)
            && span >= 0
        {
            return span as u32 + 1;
        }
        debug!(trip_id = self.id, default_days, "Trip::total_days: falling back to default");
        default_days
    }

    /// Label for a 1-based day: its calendar date if the start date parses
    pub fn day_label(&self, day: u32) -> String {
        match self.start_date.as_deref().and_then(dates::parse_date) {
            Some(start) => (start + chrono::Days::new(u64::from(day.saturating_sub(1))))
                .format("%Y-%m-%d")
                .to_string(),
            None => format!("Day {}", day),
        }
    }

    /// One-line description for listings
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("#{} {}", self.id, self.destination)];
        match (&self.start_date, &self.end_date) {
            (Some(s), Some(e)) => parts.push(format!("{} to {}", s, e)),
            (Some(s), None) => parts.push(format!("from {}", s)),
            _ => {}
        }
        if let Some(d) = self.duration_days {
            parts.push(format!("{} days", d));
        }
        if let Some(b) = self.budget {
            parts.push(format!("${:.0}", b));
        }
        if self.travelers_count != 1 {
            parts.push(format!("{} travelers", self.travelers_count));
        }
        parts.push(format!("[{}]", self.status));
        parts.join(", ")
    }
}

/// Normalize a destination for matching
pub(crate) fn destination_key(destination: &str) -> String {
    destination.trim().to_lowercase()
}

impl Record for Trip {
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
        "trips"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("user_id".to_string(), IndexValue::Int(self.user_id));
        fields.insert("status".to_string(), IndexValue::String(self.status.to_string()));
        fields.insert("destination".to_string(), IndexValue::String(self.destination_key()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trip_defaults() {
        let trip = Trip::new(7, "  Tokyo ");
        assert_eq!(trip.id, 0);
        assert_eq!(trip.user_id, 7);
        assert_eq!(trip.destination, "Tokyo");
        assert_eq!(trip.travelers_count, 1);
        assert_eq!(trip.status, TripStatus::Planning);
        assert_eq!(trip.destination_key(), "tokyo");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TripStatus::Planning,
            TripStatus::Booked,
            TripStatus::Completed,
            TripStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<TripStatus>().unwrap(), status);
        }
        assert_eq!("Canceled".parse::<TripStatus>().unwrap(), TripStatus::Cancelled);
        assert!("archived".parse::<TripStatus>().is_err());
    }

    #[test]
    fn test_total_days_resolution() {
        let mut trip = Trip::new(1, "Lisbon");
        assert_eq!(trip.total_days(3), 3);

        trip.start_date = Some("2027-05-01".to_string());
        trip.end_date = Some("2027-05-07".to_string());
        assert_eq!(trip.total_days(3), 7);

        trip.duration_days = Some(10);
        assert_eq!(trip.total_days(3), 10);
    }

    #[test]
    fn test_day_label() {
        let mut trip = Trip::new(1, "Lisbon");
        assert_eq!(trip.day_label(2), "Day 2");

        trip.start_date = Some("2027-05-30".to_string());
        assert_eq!(trip.day_label(1), "2027-05-30");
        assert_eq!(trip.day_label(3), "2027-06-01");
    }

    #[test]
    fn test_activity_kind_from_loose_labels() {
        assert_eq!(ActivityKind::from("Restaurant".to_string()), ActivityKind::Dining);
        assert_eq!(ActivityKind::from("train".to_string()), ActivityKind::Transport);
        assert_eq!(ActivityKind::from("sightseeing".to_string()), ActivityKind::Activity);

        let activity: Activity = serde_json::from_value(serde_json::json!({
            "time": "19:00",
            "type": "food",
            "title": "Dinner"
        }))
        .unwrap();
        assert_eq!(activity.kind, ActivityKind::Dining);
        assert_eq!(serde_json::to_value(&activity).unwrap()["type"], "dining");
    }

    #[test]
    fn test_metadata_preserves_extra_keys() {
        let raw = serde_json::json!({
            "preferences": ["food", "culture"],
            "country_code": "JP",
            "visa_notes": "none needed",
            "checklist": [{ "text": "passport" }]
        });
        let meta: TripMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(meta.preferences, vec!["food", "culture"]);
        assert_eq!(meta.checklist[0].text, "passport");
        assert!(!meta.checklist[0].done);
        assert_eq!(meta.extra["visa_notes"], "none needed");

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["visa_notes"], "none needed");
        assert_eq!(back["preferences"][1], "culture");
    }

    #[test]
    fn test_indexed_fields() {
        let mut trip = Trip::new(3, "Paris");
        trip.status = TripStatus::Booked;
        let fields = trip.indexed_fields();
        assert_eq!(fields["user_id"], IndexValue::Int(3));
        assert_eq!(fields["status"], IndexValue::String("booked".to_string()));
        assert_eq!(fields["destination"], IndexValue::String("paris".to_string()));
    }

    #[test]
    fn test_summary_and_expenses() {
        let mut trip = Trip::new(1, "Rome");
        trip.id = 4;
        trip.budget = Some(2500.0);
        trip.travelers_count = 2;
        let summary = trip.summary();
        assert!(summary.starts_with("#4 Rome"));
        assert!(summary.contains("$2500"));
        assert!(summary.contains("2 travelers"));

        trip.metadata.expenses.push(Expense {
            description: "Museum".to_string(),
            amount: 30.5,
            category: "activity".to_string(),
            date: None,
        });
        assert!((trip.metadata.total_expenses() - 30.5).abs() < f64::EPSILON);
    }
}
