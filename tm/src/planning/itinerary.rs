//! Itinerary generation policy
//!
//! Long trips are generated in windows of at most `max-days-per-generation`
//! days. Generated output is parsed, clamped to the requested window and
//! merged into a new metadata value; the stored trip is only replaced once
//! the whole pipeline has succeeded.

use std::collections::BTreeSet;

use chrono::{NaiveTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::GenerationError;
use crate::domain::{
    Activity, BookingSource, FlightOption, HotelOption, ItineraryConfig, ItineraryDay, TransportOption, Trip,
    TripMetadata,
};
use crate::llm::strip_code_fences;
use crate::prompts::{DaySlot, ItineraryContext};

/// The span of days one generation call covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationWindow {
    /// First day, 1-based
    pub start_day: u32,
    /// Number of days requested
    pub days: u32,
    /// Full trip length
    pub total_days: u32,
}

impl GenerationWindow {
    /// Window starting at `start_day` (default 1), capped at `max_days`
    pub fn plan(total_days: u32, start_day: Option<u32>, max_days: u32) -> Result<Self, GenerationError> {
        let start_day = start_day.unwrap_or(1).max(1);
        debug!(total_days, start_day, max_days, "GenerationWindow::plan: called");
        if start_day > total_days {
            return Err(GenerationError::OutOfRange { start_day, total_days });
        }
        let remaining = total_days - start_day + 1;
        Ok(Self {
            start_day,
            days: remaining.min(max_days.max(1)),
            total_days,
        })
    }

    pub fn end_day(&self) -> u32 {
        self.start_day + self.days - 1
    }

    pub fn contains(&self, day: u32) -> bool {
        (self.start_day..=self.end_day()).contains(&day)
    }

    /// Prompt context for this window
    pub fn prompt_context(&self, trip: &Trip, preferences: &[String]) -> ItineraryContext {
        ItineraryContext {
            destination: trip.destination.clone(),
            start_day: self.start_day,
            end_day: self.end_day(),
            total_days: self.total_days,
            days: (self.start_day..=self.end_day())
                .map(|day| DaySlot {
                    day,
                    date: trip.day_label(day),
                })
                .collect(),
            travelers: trip.travelers_count,
            budget: trip.budget.map(|b| format!("{:.0}", b)),
            preferences: preferences.join(", "),
            include_bookings: self.start_day == 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawItinerary {
    #[serde(default, alias = "itinerary")]
    days: Vec<RawDay>,
    #[serde(default)]
    flights: Vec<FlightOption>,
    #[serde(default)]
    hotels: Vec<HotelOption>,
    #[serde(default)]
    transport: Vec<TransportOption>,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    #[serde(default)]
    day: Option<u32>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    activities: Vec<Activity>,
}

/// Parsed and window-clamped generator output
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedItinerary {
    pub days: Vec<ItineraryDay>,
    pub flights: Vec<FlightOption>,
    pub hotels: Vec<HotelOption>,
    pub transport: Vec<TransportOption>,
}

/// Parse generator output for `window`
///
/// Days without a number are numbered from the window start. Days outside
/// the window are dropped and duplicates keep their first occurrence.
pub fn parse_generated(text: &str, window: &GenerationWindow, trip: &Trip) -> Result<GeneratedItinerary, GenerationError> {
    debug!(len = text.len(), ?window, "parse_generated: called");
    let body = strip_code_fences(text);
    let raw: RawItinerary = serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    let mut seen = BTreeSet::new();
    let mut days = Vec::new();
    for (idx, raw_day) in raw.days.into_iter().enumerate() {
        let day = raw_day.day.unwrap_or(window.start_day + idx as u32);
        if !window.contains(day) {
            warn!(day, ?window, "parse_generated: dropping day outside window");
            continue;
        }
        if !seen.insert(day) {
            warn!(day, "parse_generated: dropping duplicate day");
            continue;
        }
        let mut activities: Vec<Activity> = raw_day
            .activities
            .into_iter()
            .filter(|a| !a.title.trim().is_empty())
            .collect();
        sort_activities(&mut activities);
        days.push(ItineraryDay {
            day,
            date: trip.day_label(day),
            title: raw_day.title,
            activities,
        });
    }

    if days.is_empty() {
        return Err(GenerationError::Empty);
    }
    days.sort_by_key(|d| d.day);

    Ok(GeneratedItinerary {
        days,
        flights: raw.flights,
        hotels: raw.hotels,
        transport: raw.transport,
    })
}

/// Merge generated days into a copy of the trip
///
/// Generated days replace same-numbered days; other days are kept.
/// AI-suggested bookings are replaced; user-added ones are kept.
pub fn merge_generated(
    trip: &Trip,
    generated: GeneratedItinerary,
    window: &GenerationWindow,
    preferences: &[String],
) -> Trip {
    debug!(trip_id = trip.id, days = generated.days.len(), "merge_generated: called");
    let replaced: BTreeSet<u32> = generated.days.iter().map(|d| d.day).collect();
    let mut itinerary: Vec<ItineraryDay> = trip
        .metadata
        .itinerary
        .iter()
        .filter(|d| !replaced.contains(&d.day))
        .cloned()
        .collect();

    let mut next_id = next_activity_number(&itinerary);
    let generated_days = generated.days.len() as u32;
    for mut day in generated.days {
        for activity in &mut day.activities {
            activity.id = format!("act-{}", next_id);
            next_id += 1;
        }
        itinerary.push(day);
    }
    itinerary.sort_by_key(|d| d.day);

    let covered = itinerary.iter().filter(|d| d.day <= window.total_days).count() as u32;
    let config = ItineraryConfig {
        destination: trip.destination.clone(),
        total_trip_days: window.total_days,
        requested_days: window.days,
        generated_days,
        start_day: window.start_day,
        generated_at: Utc::now().to_rfc3339(),
        is_partial: covered < window.total_days,
        preferences: preferences.to_vec(),
    };

    let metadata = TripMetadata {
        itinerary,
        itinerary_config: Some(config),
        flights: replace_suggested(&trip.metadata.flights, generated.flights, |f| f.source, |f, s| f.source = s),
        hotels: replace_suggested(&trip.metadata.hotels, generated.hotels, |h| h.source, |h, s| h.source = s),
        transport: replace_suggested(
            &trip.metadata.transport,
            generated.transport,
            |t| t.source,
            |t, s| t.source = s,
        ),
        ..trip.metadata.clone()
    };

    let mut next = Trip {
        metadata,
        ..trip.clone()
    };
    next.touch();
    next
}

/// Keep user-added records when suggestions arrive; keep everything when none do
fn replace_suggested<T: Clone>(
    existing: &[T],
    suggested: Vec<T>,
    source: impl Fn(&T) -> BookingSource,
    set_source: impl Fn(&mut T, BookingSource),
) -> Vec<T> {
    if suggested.is_empty() {
        return existing.to_vec();
    }
    let mut out: Vec<T> = existing
        .iter()
        .filter(|r| source(r) == BookingSource::UserAdded)
        .cloned()
        .collect();
    for mut record in suggested {
        set_source(&mut record, BookingSource::AiSuggested);
        out.push(record);
    }
    out
}

/// Insert an activity into a copy of the trip, keeping time order
///
/// Creates the day entry when the itinerary has none for `day`.
pub fn insert_activity(trip: &Trip, day: u32, mut activity: Activity) -> (Trip, Activity) {
    debug!(trip_id = trip.id, day, title = %activity.title, "insert_activity: called");
    let mut itinerary = trip.metadata.itinerary.clone();
    activity.id = format!("act-{}", next_activity_number(&itinerary));

    match itinerary.iter_mut().find(|d| d.day == day) {
        Some(entry) => {
            entry.activities.push(activity.clone());
            sort_activities(&mut entry.activities);
        }
        None => {
            debug!(day, "insert_activity: creating day entry");
            itinerary.push(ItineraryDay {
                day,
                date: trip.day_label(day),
                title: String::new(),
                activities: vec![activity.clone()],
            });
            itinerary.sort_by_key(|d| d.day);
        }
    }

    let mut next = Trip {
        metadata: TripMetadata {
            itinerary,
            ..trip.metadata.clone()
        },
        ..trip.clone()
    };
    next.touch();
    (next, activity)
}

/// Remove an activity by id from a copy of the trip
///
/// Returns `None` when no activity has that id.
pub fn remove_activity(trip: &Trip, activity_id: &str) -> Option<(Trip, u32, Activity)> {
    debug!(trip_id = trip.id, %activity_id, "remove_activity: called");
    let (day, removed) = trip
        .metadata
        .find_activity(activity_id)
        .map(|(day, a)| (day, a.clone()))?;

    let itinerary = trip
        .metadata
        .itinerary
        .iter()
        .map(|d| ItineraryDay {
            activities: d.activities.iter().filter(|a| a.id != activity_id).cloned().collect(),
            ..d.clone()
        })
        .collect();

    let mut next = Trip {
        metadata: TripMetadata {
            itinerary,
            ..trip.metadata.clone()
        },
        ..trip.clone()
    };
    next.touch();
    Some((next, day, removed))
}

/// One past the highest "act-N" number in use
fn next_activity_number(days: &[ItineraryDay]) -> u32 {
    days.iter()
        .flat_map(|d| &d.activities)
        .filter_map(|a| a.id.strip_prefix("act-").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .map_or(1, |n| n + 1)
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&time.to_uppercase(), "%I:%M %p"))
        .ok()
}

/// Stable sort by time of day; unreadable times go last
fn sort_activities(activities: &mut [Activity]) {
    activities.sort_by_key(|a| match parse_time(&a.time) {
        Some(t) => (0, t),
        None => (1, NaiveTime::MIN),
    });
}
