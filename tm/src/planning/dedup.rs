//! Planning-trip deduplication
//!
//! A new request for a destination the user is already planning either
//! refines that trip or becomes a separate one, decided by the month and
//! year of the start dates.

use tracing::debug;

use super::request::TripRequest;
use crate::dates;
use crate::domain::{Trip, TripMetadata, TripStatus, destination_key};

/// What to do with a validated request
#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    /// No matching trip, or a different month: create a new trip
    Insert,
    /// Refine this existing trip
    Update(Trip),
    /// Cannot tell whether the request means this trip; ask first
    Clarify(Trip),
}

/// Decide between insert, update and clarification
///
/// `candidates` are the user's trips; only `planning` trips with the same
/// normalized destination are considered, lowest id first.
pub fn decide(candidates: &[Trip], request: &TripRequest) -> DedupDecision {
    let key = destination_key(&request.destination);
    debug!(%key, candidates = candidates.len(), "decide: called");

    let Some(existing) = candidates
        .iter()
        .filter(|t| t.status == TripStatus::Planning && t.destination_key() == key)
        .min_by_key(|t| t.id)
    else {
        debug!("decide: no planning trip for destination");
        return DedupDecision::Insert;
    };

    let existing_month = existing.start_date.as_deref().and_then(dates::month_year);
    let new_month = request.start_date.as_deref().and_then(dates::month_year);
    debug!(existing_id = existing.id, ?existing_month, ?new_month, "decide: matched planning trip");

    match (existing_month, new_month) {
        (None, None) => DedupDecision::Clarify(existing.clone()),
        (None, Some(_)) => DedupDecision::Update(existing.clone()),
        (Some(a), Some(b)) if a != b => DedupDecision::Insert,
        (Some(_), Some(_)) => DedupDecision::Update(existing.clone()),
        // An unreadable new date might mean a different month
        (Some(_), None) if request.has_start_date() => DedupDecision::Clarify(existing.clone()),
        (Some(_), None) => DedupDecision::Update(existing.clone()),
    }
}

/// Build the refined trip: every field present in the request wins
///
/// Travelers only change when the request names more than one;
/// the country code is only filled when unset. Preferences are merged,
/// keeping the existing order and appending new tags.
pub fn merge_into(existing: &Trip, request: &TripRequest) -> Trip {
    debug!(existing_id = existing.id, "merge_into: called");
    let mut preferences = existing.metadata.preferences.clone();
    for tag in &request.preferences {
        if !preferences.iter().any(|p| p.eq_ignore_ascii_case(tag)) {
            preferences.push(tag.clone());
        }
    }

    let metadata = TripMetadata {
        preferences,
        country_code: existing
            .metadata
            .country_code
            .clone()
            .or_else(|| request.country_code.clone()),
        notes: request.notes.clone().or_else(|| existing.metadata.notes.clone()),
        ..existing.metadata.clone()
    };

    let mut merged = Trip {
        start_date: request.start_date.clone().or_else(|| existing.start_date.clone()),
        end_date: request.end_date.clone().or_else(|| existing.end_date.clone()),
        duration_days: request.duration_days.or(existing.duration_days),
        budget: request.budget.or(existing.budget),
        travelers_count: match request.travelers_count {
            Some(n) if n > 1 => n,
            _ => existing.travelers_count,
        },
        metadata,
        ..existing.clone()
    };
    // A new start without an end must not leave the old end before it
    if request.end_date.is_none()
        && let (Some(start), Some(end)) = (merged.start_date.as_deref(), merged.end_date.as_deref())
        && dates::span_days(start, end).is_some_and(|d| d < 0)
    {
        debug!(trip_id = existing.id, "merge_into: dropping stale end date");
        merged.end_date = None;
    }
    merged.touch();
    merged
}
