//! Trip field validation
//!
//! A plain function over static rules, run before any write. The first
//! failing rule wins. Unparseable dates are treated as absent.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use super::request::{TripPatch, TripRequest};
use crate::dates;
use crate::domain::Trip;

/// Largest budget accepted without confirmation, in USD
pub const MAX_BUDGET_USD: f64 = 500_000.0;

/// Longest trip accepted without confirmation, in days
pub const MAX_TRIP_DAYS: i64 = 365;

const SPACE: &[&str] = &[
    "moon",
    "mars",
    "venus",
    "jupiter",
    "saturn",
    "mercury",
    "neptune",
    "uranus",
    "pluto",
    "sun",
    "outer space",
    "space",
    "milky way",
    "andromeda",
    "international space station",
    "iss",
];

const FICTIONAL: &[&str] = &[
    "hogwarts",
    "narnia",
    "wakanda",
    "atlantis",
    "middle earth",
    "middle-earth",
    "mordor",
    "gotham",
    "asgard",
    "neverland",
    "oz",
    "el dorado",
    "shangri-la",
    "westeros",
    "tatooine",
    "rivendell",
    "shire",
];

const VAGUE: &[&str] = &[
    "somewhere",
    "somewhere warm",
    "somewhere cold",
    "somewhere nice",
    "somewhere sunny",
    "somewhere exotic",
    "anywhere",
    "beach",
    "paradise",
    "mountains",
    "nowhere",
    "everywhere",
    "abroad",
    "overseas",
    "city",
    "island",
];

/// Why a trip failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    MissingDestination,
    InvalidDestination,
    SpaceDestination,
    FictionalDestination,
    VagueDestination,
    InvalidBudget,
    NegativeBudget,
    ZeroBudget,
    BudgetTooHigh,
    PastDate,
    EndBeforeStart,
    TripTooLong,
    InvalidDuration,
    InvalidTravelers,
}

/// A failed rule with the message shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub reason: ValidationReason,
    pub message: String,
}

impl ValidationFailure {
    fn new(reason: ValidationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Validate a prospective trip against all rules, in order
pub fn validate_trip(request: &TripRequest, today: NaiveDate) -> Result<(), ValidationFailure> {
    debug!(destination = %request.destination, "validate_trip: called");
    check_destination(&request.destination)?;
    if let Some(budget) = request.budget {
        check_budget(budget)?;
    }
    check_dates(request.start_date.as_deref(), request.end_date.as_deref(), today)?;
    if let Some(days) = request.duration_days {
        check_duration(days)?;
    }
    check_travelers(request.travelers_count)?;
    Ok(())
}

/// Invariants a stored trip must keep after fields are merged or patched
///
/// The past-date rule is not applied here: a kept start date was valid when
/// it was first saved.
pub fn validate_stored(trip: &Trip) -> Result<(), ValidationFailure> {
    debug!(trip_id = trip.id, "validate_stored: called");
    check_travelers(Some(trip.travelers_count))?;
    check_date_order(trip.start_date.as_deref(), trip.end_date.as_deref())?;
    if let Some(days) = trip.duration_days {
        check_duration(days)?;
    }
    Ok(())
}

/// Field-level sanity for direct updates
///
/// Only the fields present in the patch are checked; past-date and
/// date-ordering rules are left to the caller's judgement.
pub fn validate_patch(patch: &TripPatch) -> Result<(), ValidationFailure> {
    debug!("validate_patch: called");
    if let Some(destination) = &patch.destination {
        check_destination(destination)?;
    }
    if let Some(budget) = patch.budget {
        check_budget(budget)?;
    }
    if let Some(days) = patch.duration_days {
        check_duration(days)?;
    }
    check_travelers(patch.travelers_count)?;
    Ok(())
}

fn check_travelers(count: Option<u32>) -> Result<(), ValidationFailure> {
    if count == Some(0) {
        return Err(ValidationFailure::new(
            ValidationReason::InvalidTravelers,
            "A trip needs at least 1 traveler.",
        ));
    }
    Ok(())
}

fn check_destination(destination: &str) -> Result<(), ValidationFailure> {
    let trimmed = destination.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::new(
            ValidationReason::MissingDestination,
            "I need a destination to plan a trip. Where would you like to go?",
        ));
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.chars().count() <= 1 || compact.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationFailure::new(
            ValidationReason::InvalidDestination,
            format!(
                "\"{}\" doesn't look like a destination. Which city or country did you have in mind?",
                trimmed
            ),
        ));
    }

    let key = deny_list_key(trimmed);
    if SPACE.contains(&key.as_str()) {
        debug!(%key, "check_destination: space destination");
        return Err(ValidationFailure::new(
            ValidationReason::SpaceDestination,
            format!(
                "{} isn't somewhere I can plan a trip to just yet! Did you mean somewhere on Earth?",
                capitalize(trimmed)
            ),
        ));
    }
    if FICTIONAL.contains(&key.as_str()) {
        debug!(%key, "check_destination: fictional destination");
        return Err(ValidationFailure::new(
            ValidationReason::FictionalDestination,
            format!(
                "{} only exists in stories, so I can't book it. Is there a real place you'd like to visit?",
                capitalize(trimmed)
            ),
        ));
    }
    if VAGUE.contains(&key.as_str()) {
        debug!(%key, "check_destination: vague destination");
        return Err(ValidationFailure::new(
            ValidationReason::VagueDestination,
            format!(
                "\"{}\" is a bit vague for me to plan. Which city or country are you thinking of?",
                trimmed
            ),
        ));
    }
    Ok(())
}

fn check_budget(budget: f64) -> Result<(), ValidationFailure> {
    if !budget.is_finite() {
        return Err(ValidationFailure::new(
            ValidationReason::InvalidBudget,
            "I couldn't read that budget as an amount. What budget in USD should I use?",
        ));
    }
    if budget < 0.0 {
        return Err(ValidationFailure::new(
            ValidationReason::NegativeBudget,
            "A budget can't be negative. What budget in USD should I use?",
        ));
    }
    if budget == 0.0 {
        return Err(ValidationFailure::new(
            ValidationReason::ZeroBudget,
            "A budget of $0 won't get you very far. What budget in USD should I use?",
        ));
    }
    if budget > MAX_BUDGET_USD {
        return Err(ValidationFailure::new(
            ValidationReason::BudgetTooHigh,
            format!(
                "A budget of ${:.0} is unusually high, please confirm the amount in USD.",
                budget
            ),
        ));
    }
    Ok(())
}

fn check_dates(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<(), ValidationFailure> {
    if let Some(start) = start {
        match dates::month_year(start) {
            Some((year, month)) if (year, month) < (today.year(), today.month()) => {
                let suggested = if month >= today.month() {
                    today.year()
                } else {
                    today.year() + 1
                };
                return Err(ValidationFailure::new(
                    ValidationReason::PastDate,
                    format!(
                        "{} {} has already passed. Did you mean {} {}?",
                        dates::month_name(month),
                        year,
                        dates::month_name(month),
                        suggested
                    ),
                ));
            }
            Some(_) => {}
            None => warn!(%start, "check_dates: unparseable start date, skipping past-date check"),
        }
    }

    check_date_order(start, end)
}

fn check_date_order(start: Option<&str>, end: Option<&str>) -> Result<(), ValidationFailure> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(());
    };
    match (dates::parse_date(start), dates::parse_date(end)) {
        (Some(s), Some(e)) => {
            let span = (e - s).num_days();
            if span <= 0 {
                return Err(ValidationFailure::new(
                    ValidationReason::EndBeforeStart,
                    "The end date must be after the start date. Could you double-check your dates?",
                ));
            }
            if span > MAX_TRIP_DAYS {
                return Err(ValidationFailure::new(
                    ValidationReason::TripTooLong,
                    format!(
                        "Those dates span {} days. Please confirm this long a trip before I save it.",
                        span
                    ),
                ));
            }
        }
        _ => warn!(%start, %end, "check_date_order: unparseable date, skipping ordering checks"),
    }
    Ok(())
}

fn check_duration(days: i64) -> Result<(), ValidationFailure> {
    if days <= 0 {
        return Err(ValidationFailure::new(
            ValidationReason::InvalidDuration,
            "A trip must be at least 1 day long.",
        ));
    }
    if days > MAX_TRIP_DAYS {
        return Err(ValidationFailure::new(
            ValidationReason::TripTooLong,
            format!("{} days is over a year. Please confirm this long a trip.", days),
        ));
    }
    Ok(())
}

/// Lowercase, collapse whitespace and drop a leading article
fn deny_list_key(destination: &str) -> String {
    let collapsed = destination
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = collapsed.strip_prefix(article) {
            return rest.to_string();
        }
    }
    collapsed
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
