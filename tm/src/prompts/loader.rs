//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::Trip;

/// Trip fields exposed to templates
#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    pub id: i64,
    pub destination: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration_days: Option<i64>,
    pub budget: Option<String>,
    pub travelers_count: u32,
    /// Comma-separated, in stored order
    pub preferences: String,
}

impl From<&Trip> for TripView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            destination: trip.destination.clone(),
            status: trip.status.to_string(),
            start_date: trip.start_date.clone(),
            end_date: trip.end_date.clone(),
            duration_days: trip.duration_days,
            budget: trip.budget.map(|b| format!("{:.0}", b)),
            travelers_count: trip.travelers_count,
            preferences: trip.metadata.preferences.join(", "),
        }
    }
}

/// Context for the dispatcher system prompt
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherContext {
    pub today: String,
    pub long_trip_days: i64,
    pub last_trip_id: Option<i64>,
    /// Bound trip for trip-scoped chats
    pub trip: Option<TripView>,
}

/// One day slot offered to the itinerary writer
#[derive(Debug, Clone, Serialize)]
pub struct DaySlot {
    pub day: u32,
    pub date: String,
}

/// Context for the itinerary prompt
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryContext {
    pub destination: String,
    pub start_day: u32,
    pub end_day: u32,
    pub total_days: u32,
    pub days: Vec<DaySlot>,
    pub travelers: u32,
    pub budget: Option<String>,
    pub preferences: String,
    /// Ask for flights and hotels too (first window only)
    pub include_bookings: bool,
}

/// Context for the question prompt
#[derive(Debug, Clone, Serialize)]
pub struct QuestionContext {
    pub topic: Option<String>,
    pub trip: Option<TripView>,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.tripmind/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that looks for overrides under `<root>/.tripmind/prompts/`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".tripmind/prompts");
        let exists = user_dir.exists();
        debug!(?user_dir, %exists, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            user_dir: exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle quotes
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template: user override first, then the embedded default
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    pub fn dispatcher(&self, context: &DispatcherContext) -> Result<String> {
        self.render("dispatcher", context)
    }

    pub fn itinerary(&self, context: &ItineraryContext) -> Result<String> {
        self.render("itinerary", context)
    }

    pub fn question(&self, context: &QuestionContext) -> Result<String> {
        self.render("question", context)
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn trip() -> Trip {
        let mut trip = Trip::new(1, "Tokyo");
        trip.id = 12;
        trip.budget = Some(3000.0);
        trip.metadata.preferences = vec!["food".to_string(), "culture".to_string()];
        trip
    }

    #[test]
    fn test_dispatcher_without_trip() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .dispatcher(&DispatcherContext {
                today: "2026-10-18".to_string(),
                long_trip_days: 90,
                last_trip_id: None,
                trip: None,
            })
            .unwrap();
        assert!(prompt.contains("Today is 2026-10-18"));
        assert!(prompt.contains("over 90 days"));
        assert!(!prompt.contains("CURRENT TRIP"));
    }

    #[test]
    fn test_dispatcher_with_current_trip() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .dispatcher(&DispatcherContext {
                today: "2026-10-18".to_string(),
                long_trip_days: 90,
                last_trip_id: Some(12),
                trip: Some(TripView::from(&trip())),
            })
            .unwrap();
        assert!(prompt.contains("CURRENT TRIP"));
        assert!(prompt.contains("Trip ID: 12"));
        assert!(prompt.contains("Budget: $3000"));
        assert!(prompt.contains("Preferences: food, culture"));
        assert!(prompt.contains("Start Date: Not set"));
        assert!(prompt.contains("most recently discussed is trip 12"));
    }

    #[test]
    fn test_itinerary_prompt_lists_days() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .itinerary(&ItineraryContext {
                destination: "Tokyo".to_string(),
                start_day: 1,
                end_day: 2,
                total_days: 10,
                days: vec![
                    DaySlot {
                        day: 1,
                        date: "2027-04-01".to_string(),
                    },
                    DaySlot {
                        day: 2,
                        date: "2027-04-02".to_string(),
                    },
                ],
                travelers: 2,
                budget: None,
                preferences: "food".to_string(),
                include_bookings: true,
            })
            .unwrap();
        assert!(prompt.contains("days 1 to 2 of a 10-day trip to Tokyo"));
        assert!(prompt.contains("- day 2: 2027-04-02"));
        assert!(prompt.contains("\"flights\""));
        assert!(!prompt.contains("&quot;"));
    }

    #[test]
    fn test_user_override_wins() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".tripmind/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("question.pmt"), "custom {{topic}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let prompt = loader
            .question(&QuestionContext {
                topic: Some("visas".to_string()),
                trip: None,
            })
            .unwrap();
        assert_eq!(prompt, "custom visas");
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.render("nonexistent", &serde_json::json!({})).is_err());
    }
}
