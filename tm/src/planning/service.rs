//! TripPlanner - the operations exposed to tools and the CLI
//!
//! Validation and deduplication always run before a write. Itinerary
//! generation builds the new trip in memory and only persists it once the
//! text-generation call, parsing and merging have all succeeded.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::dedup::{self, DedupDecision};
use super::error::{GenerationError, PlannerError};
use super::itinerary::{self, GenerationWindow};
use super::outcome::{ActivityOutcome, ItineraryOutcome, ItineraryStatus, PlanOutcome, UpdateOutcome};
use super::request::{TripPatch, TripRequest};
use super::validation::{validate_patch, validate_stored, validate_trip};
use crate::config::GenerationConfig;
use crate::dates;
use crate::domain::{Activity, Trip, TripStatus, User};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompts::{PromptLoader, QuestionContext, TripView};
use crate::state::{StateManager, TripQuery};

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Planning operations over the state actor and an optional LLM
#[derive(Clone)]
pub struct TripPlanner {
    state: StateManager,
    llm: Option<Arc<dyn LlmClient>>,
    prompts: Arc<PromptLoader>,
    config: GenerationConfig,
    max_tokens: u32,
}

impl TripPlanner {
    /// Planner without a text-generation service
    ///
    /// Itinerary generation and question answering fail until `with_llm`.
    pub fn new(state: StateManager, config: GenerationConfig) -> Self {
        debug!(?config, "TripPlanner::new: called");
        Self {
            state,
            llm: None,
            prompts: Arc::new(PromptLoader::embedded_only()),
            config,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        self.llm = Some(llm);
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn prompts(&self) -> &PromptLoader {
        &self.prompts
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.config
    }

    // === Trips ===

    /// Validate, deduplicate and persist a planning request
    pub async fn plan_or_update_trip(&self, user_id: i64, request: TripRequest) -> Result<PlanOutcome, PlannerError> {
        self.plan_or_update_trip_on(user_id, request, dates::today()).await
    }

    /// As `plan_or_update_trip`, with an explicit current date
    pub async fn plan_or_update_trip_on(
        &self,
        user_id: i64,
        request: TripRequest,
        today: NaiveDate,
    ) -> Result<PlanOutcome, PlannerError> {
        let request = request.normalized();
        debug!(user_id, destination = %request.destination, %today, "plan_or_update_trip: called");

        if let Err(failure) = validate_trip(&request, today) {
            info!(reason = ?failure.reason, destination = %request.destination, "Rejected trip request");
            return Ok(PlanOutcome::invalid(failure.reason, failure.message));
        }

        self.require_user(user_id).await?;

        let candidates = self
            .state
            .list_trips(
                TripQuery::for_user(user_id)
                    .status(TripStatus::Planning)
                    .destination(&request.destination),
            )
            .await?;

        match dedup::decide(&candidates, &request) {
            DedupDecision::Insert => {
                let mut trip = request.to_trip(user_id);
                trip.id = self.state.create_trip(trip.clone()).await?;
                info!(trip_id = trip.id, user_id, destination = %trip.destination, "Planned new trip");
                Ok(PlanOutcome::created(trip))
            }
            DedupDecision::Update(existing) => {
                let merged = dedup::merge_into(&existing, &request);
                if let Err(failure) = validate_stored(&merged) {
                    info!(trip_id = existing.id, reason = ?failure.reason, "Rejected merge into planning trip");
                    return Ok(PlanOutcome::invalid(failure.reason, failure.message));
                }
                self.state.update_trip(merged.clone()).await?;
                info!(trip_id = merged.id, user_id, "Merged request into planning trip");
                Ok(PlanOutcome::updated(merged))
            }
            DedupDecision::Clarify(existing) => {
                debug!(trip_id = existing.id, "plan_or_update_trip: needs clarification");
                Ok(PlanOutcome::clarify(&existing))
            }
        }
    }

    /// A user's trips, lowest id first
    pub async fn list_trips(&self, user_id: i64) -> Result<Vec<Trip>, PlannerError> {
        debug!(user_id, "list_trips: called");
        Ok(self.state.list_trips(TripQuery::for_user(user_id)).await?)
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Trip, PlannerError> {
        debug!(trip_id, "get_trip: called");
        self.state
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| PlannerError::trip_not_found(trip_id))
    }

    /// Apply a field-level patch
    pub async fn update_trip(&self, trip_id: i64, patch: TripPatch) -> Result<UpdateOutcome, PlannerError> {
        debug!(trip_id, ?patch, "update_trip: called");
        let trip = self.get_trip(trip_id).await?;
        validate_patch(&patch).map_err(PlannerError::Validation)?;

        let (next, changed) = patch.apply(&trip);
        validate_stored(&next).map_err(PlannerError::Validation)?;
        if changed.is_empty() {
            debug!(trip_id, "update_trip: nothing changed");
            return Ok(UpdateOutcome {
                message: format!("Trip to {} already has those details", next.destination),
                trip: next,
                changed: Vec::new(),
            });
        }

        self.state.update_trip(next.clone()).await.map_err(|e| match e {
            crate::state::StateError::NotFound(_) => PlannerError::trip_not_found(trip_id),
            other => other.into(),
        })?;
        info!(trip_id, ?changed, "Updated trip");
        Ok(UpdateOutcome {
            message: format!("Successfully updated trip to {}", next.destination),
            trip: next,
            changed: changed.into_iter().map(String::from).collect(),
        })
    }

    pub async fn delete_trip(&self, trip_id: i64) -> Result<(), PlannerError> {
        debug!(trip_id, "delete_trip: called");
        if self.state.delete_trip(trip_id).await? {
            info!(trip_id, "Deleted trip");
            Ok(())
        } else {
            Err(PlannerError::trip_not_found(trip_id))
        }
    }

    // === Itineraries ===

    /// Generate (or continue) a trip's itinerary
    ///
    /// At most `max-days-per-generation` days are produced per call. Failures
    /// of the generation step come back as a `generation_error` outcome with
    /// the trip untouched.
    pub async fn generate_itinerary(
        &self,
        trip_id: i64,
        preferences: Option<Vec<String>>,
        start_day: Option<u32>,
    ) -> Result<ItineraryOutcome, PlannerError> {
        debug!(trip_id, ?preferences, ?start_day, "generate_itinerary: called");
        let trip = self.get_trip(trip_id).await?;
        let total_days = trip.total_days(self.config.default_trip_days);
        let preferences = preferences
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| trip.metadata.preferences.clone());

        match self.generate(&trip, total_days, &preferences, start_day).await {
            Ok(outcome) => Ok(outcome),
            Err(GenerationError::OutOfRange { start_day, total_days }) => Ok(ItineraryOutcome::failed(
                &trip,
                total_days,
                format!(
                    "Day {} is past the end of your {}-day trip to {}.",
                    start_day, total_days, trip.destination
                ),
            )),
            Err(e) => {
                warn!(trip_id, error = %e, "Itinerary generation failed");
                Ok(ItineraryOutcome::failed(
                    &trip,
                    total_days,
                    format!(
                        "I couldn't generate the itinerary for {} this time ({}). Your trip is unchanged; please try again.",
                        trip.destination, e
                    ),
                ))
            }
        }
    }

    async fn generate(
        &self,
        trip: &Trip,
        total_days: u32,
        preferences: &[String],
        start_day: Option<u32>,
    ) -> Result<ItineraryOutcome, GenerationError> {
        let window = GenerationWindow::plan(total_days, start_day, self.config.max_days_per_generation)?;
        let llm = self.llm.as_ref().ok_or(GenerationError::Unavailable)?;

        let prompt = self
            .prompts
            .itinerary(&window.prompt_context(trip, preferences))
            .map_err(|e| GenerationError::Prompt(e.to_string()))?;
        let request = CompletionRequest {
            system_prompt: prompt,
            messages: vec![Message::user(format!(
                "Write days {} to {} for my trip to {} as JSON.",
                window.start_day,
                window.end_day(),
                trip.destination
            ))],
            tools: Vec::new(),
            max_tokens: self.max_tokens,
        };

        let limit = Duration::from_millis(self.config.generation_timeout_ms);
        debug!(trip_id = trip.id, ?window, ?limit, "generate: calling text generation");
        let response = tokio::time::timeout(limit, llm.complete(request))
            .await
            .map_err(|_| GenerationError::Timeout(limit))??;
        let text = response
            .content
            .ok_or_else(|| GenerationError::Parse("empty response".to_string()))?;

        let generated = itinerary::parse_generated(&text, &window, trip)?;
        let days_generated = generated.days.len() as u32;
        let next = itinerary::merge_generated(trip, generated, &window, preferences);
        self.state
            .update_trip(next.clone())
            .await
            .map_err(|e| GenerationError::Parse(format!("could not save itinerary: {}", e)))?;

        let is_partial = next.metadata.itinerary_config.as_ref().is_some_and(|c| c.is_partial);
        info!(trip_id = trip.id, days_generated, total_days, is_partial, "Generated itinerary");

        let message = if is_partial {
            let next_day = next
                .metadata
                .itinerary
                .iter()
                .map(|d| d.day)
                .fold(1, |expected, day| if day == expected { expected + 1 } else { expected });
            format!(
                "Your trip is {} days long, so I generated days {} to {}. Ask me to continue from day {} or add the rest manually.",
                total_days,
                window.start_day,
                window.start_day + days_generated.saturating_sub(1),
                next_day
            )
        } else {
            format!(
                "Here is your {}-day itinerary for {}.",
                total_days, trip.destination
            )
        };

        Ok(ItineraryOutcome {
            status: ItineraryStatus::Generated,
            trip_id: trip.id,
            days_generated,
            total_days,
            is_partial,
            itinerary: next.metadata.itinerary,
            message,
        })
    }

    /// Add an activity to a day, keeping time order
    pub async fn add_activity(&self, trip_id: i64, day: u32, activity: Activity) -> Result<ActivityOutcome, PlannerError> {
        debug!(trip_id, day, "add_activity: called");
        let trip = self.get_trip(trip_id).await?;
        let total_days = trip.total_days(self.config.default_trip_days);
        if day == 0 || day > total_days {
            return Err(PlannerError::NotFound {
                what: "Day",
                id: format!("{} (trip has {} days)", day, total_days),
            });
        }

        let (next, activity) = itinerary::insert_activity(&trip, day, activity);
        self.state.update_trip(next).await?;
        info!(trip_id, day, activity_id = %activity.id, "Added activity");
        Ok(ActivityOutcome { trip_id, day, activity })
    }

    /// Remove an activity by id
    pub async fn remove_activity(&self, trip_id: i64, activity_id: &str) -> Result<ActivityOutcome, PlannerError> {
        debug!(trip_id, %activity_id, "remove_activity: called");
        let trip = self.get_trip(trip_id).await?;
        let (next, day, activity) =
            itinerary::remove_activity(&trip, activity_id).ok_or_else(|| PlannerError::NotFound {
                what: "Activity",
                id: activity_id.to_string(),
            })?;
        self.state.update_trip(next).await?;
        info!(trip_id, day, %activity_id, "Removed activity");
        Ok(ActivityOutcome { trip_id, day, activity })
    }

    // === Users ===

    /// Create a user; fails with `Conflict` on a duplicate email
    pub async fn create_user(&self, email: &str, name: &str) -> Result<User, PlannerError> {
        debug!(%email, "create_user: called");
        if !email.contains('@') {
            return Err(PlannerError::Conflict(format!("\"{}\" is not an email address", email)));
        }
        let mut user = User::new(email, name);
        user.id = self.state.create_user(user.clone()).await?;
        info!(user_id = user.id, email = %user.email, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, PlannerError> {
        debug!(user_id, "get_user: called");
        self.state
            .get_user(user_id)
            .await?
            .ok_or_else(|| PlannerError::user_not_found(user_id))
    }

    /// Look a user up by email, creating them on first use
    pub async fn get_or_create_user(&self, email: &str, name: &str) -> Result<User, PlannerError> {
        debug!(%email, "get_or_create_user: called");
        match self.state.get_user_by_email(email).await? {
            Some(user) => Ok(user),
            None => self.create_user(email, name).await,
        }
    }

    /// Delete a user and all of their trips; returns the number of trips removed
    pub async fn delete_user(&self, user_id: i64) -> Result<usize, PlannerError> {
        debug!(user_id, "delete_user: called");
        self.state.delete_user(user_id).await.map_err(|e| match e {
            crate::state::StateError::NotFound(_) => PlannerError::user_not_found(user_id),
            other => other.into(),
        })
    }

    async fn require_user(&self, user_id: i64) -> Result<(), PlannerError> {
        self.get_user(user_id).await.map(|_| ())
    }

    // === Questions ===

    /// Answer a free-form travel question without touching any trip
    pub async fn answer_question(
        &self,
        question: &str,
        topic: Option<String>,
        trip_id: Option<i64>,
    ) -> Result<String, PlannerError> {
        debug!(%question, ?topic, ?trip_id, "answer_question: called");
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| PlannerError::Answer("no text-generation service is configured".to_string()))?;

        let trip = match trip_id {
            Some(id) => self.state.get_trip(id).await?,
            None => None,
        };
        let system_prompt = self
            .prompts
            .question(&QuestionContext {
                topic,
                trip: trip.as_ref().map(TripView::from),
            })
            .map_err(|e| PlannerError::Answer(e.to_string()))?;

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(question)],
            tools: Vec::new(),
            max_tokens: self.max_tokens,
        };
        let limit = Duration::from_millis(self.config.generation_timeout_ms);
        let response = tokio::time::timeout(limit, llm.complete(request))
            .await
            .map_err(|_| PlannerError::Answer(format!("timed out after {:?}", limit)))?
            .map_err(|e| PlannerError::Answer(e.to_string()))?;
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| PlannerError::Answer("empty response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityKind;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::CompletionResponse;
    use crate::planning::outcome::PlanStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    async fn planner(responses: Vec<CompletionResponse>) -> (TripPlanner, i64) {
        let state = StateManager::spawn_in_memory().unwrap();
        let planner = TripPlanner::new(state, GenerationConfig::default())
            .with_llm(Arc::new(MockLlmClient::new(responses)), 2048);
        let user = planner.create_user("ada@example.com", "Ada").await.unwrap();
        (planner, user.id)
    }

    fn days_json(days: std::ops::RangeInclusive<u32>) -> String {
        let days: Vec<_> = days
            .map(|d| {
                serde_json::json!({
                    "day": d,
                    "title": "Explore",
                    "activities": [
                        { "time": "09:00", "type": "activity", "title": "Walk" },
                        { "time": "13:00", "type": "dining", "title": "Lunch" },
                        { "time": "19:00", "type": "dining", "title": "Dinner" }
                    ]
                })
            })
            .collect();
        serde_json::json!({ "days": days }).to_string()
    }

    #[tokio::test]
    async fn test_plan_creates_then_updates_same_month() {
        let (planner, user) = planner(vec![]).await;

        let first = planner
            .plan_or_update_trip_on(user, TripRequest::new("Tokyo").start("2027-04-02"), today())
            .await
            .unwrap();
        assert_eq!(first.status, PlanStatus::Created);

        let second = planner
            .plan_or_update_trip_on(
                user,
                TripRequest::new("tokyo").dates("2027-04-10", "2027-04-15").budget(3000.0),
                today(),
            )
            .await
            .unwrap();
        assert_eq!(second.status, PlanStatus::Updated);
        assert_eq!(second.trip_id, first.trip_id);

        let trips = planner.list_trips(user).await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].budget, Some(3000.0));
        assert_eq!(trips[0].start_date.as_deref(), Some("2027-04-10"));
    }

    #[tokio::test]
    async fn test_plan_different_months_creates_two() {
        let (planner, user) = planner(vec![]).await;
        let a = planner
            .plan_or_update_trip_on(user, TripRequest::new("Paris").start("2027-03-01"), today())
            .await
            .unwrap();
        let b = planner
            .plan_or_update_trip_on(user, TripRequest::new("Paris").start("2027-05-01"), today())
            .await
            .unwrap();
        assert_eq!(a.status, PlanStatus::Created);
        assert_eq!(b.status, PlanStatus::Created);
        assert_ne!(a.trip_id, b.trip_id);
    }

    #[tokio::test]
    async fn test_plan_dateless_twice_needs_clarification() {
        let (planner, user) = planner(vec![]).await;
        let first = planner
            .plan_or_update_trip_on(user, TripRequest::new("Bali"), today())
            .await
            .unwrap();
        let second = planner
            .plan_or_update_trip_on(user, TripRequest::new("Bali"), today())
            .await
            .unwrap();
        assert_eq!(second.status, PlanStatus::NeedsClarification);
        assert_eq!(second.trip_id, first.trip_id);
        assert_eq!(planner.list_trips(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plan_invalid_writes_nothing() {
        let (planner, user) = planner(vec![]).await;
        let outcome = planner
            .plan_or_update_trip_on(user, TripRequest::new("Mars"), today())
            .await
            .unwrap();
        assert_eq!(outcome.status, PlanStatus::ValidationError);
        assert!(outcome.message.contains("Earth"));
        assert!(outcome.trip_id.is_none());
        assert!(planner.list_trips(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_unknown_user() {
        let (planner, _) = planner(vec![]).await;
        let err = planner
            .plan_or_update_trip_on(999, TripRequest::new("Oslo"), today())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_generate_long_trip_is_partial() {
        let (planner, user) = planner(vec![CompletionResponse::text(days_json(1..=5))]).await;
        let trip_id = planner
            .plan_or_update_trip_on(user, TripRequest::new("Tokyo").duration(10), today())
            .await
            .unwrap()
            .trip_id
            .unwrap();

        let outcome = planner.generate_itinerary(trip_id, None, None).await.unwrap();
        assert_eq!(outcome.status, ItineraryStatus::Generated);
        assert!(outcome.is_partial);
        assert!(outcome.days_generated <= 5);
        assert!(outcome.message.contains("continue from day 6"));

        let trip = planner.get_trip(trip_id).await.unwrap();
        assert_eq!(trip.metadata.itinerary_config.unwrap().total_trip_days, 10);
    }

    #[tokio::test]
    async fn test_generate_failure_leaves_trip_untouched() {
        let (planner, user) = planner(vec![CompletionResponse::text("Sorry, I can't help with that.")]).await;
        let trip_id = planner
            .plan_or_update_trip_on(user, TripRequest::new("Lima").duration(3), today())
            .await
            .unwrap()
            .trip_id
            .unwrap();
        let before = planner.get_trip(trip_id).await.unwrap();

        let outcome = planner.generate_itinerary(trip_id, None, None).await.unwrap();
        assert_eq!(outcome.status, ItineraryStatus::GenerationError);
        assert_eq!(outcome.days_generated, 0);
        assert_eq!(planner.get_trip(trip_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_generate_without_llm() {
        let state = StateManager::spawn_in_memory().unwrap();
        let planner = TripPlanner::new(state, GenerationConfig::default());
        let user = planner.create_user("bo@example.com", "Bo").await.unwrap();
        let trip_id = planner
            .plan_or_update_trip_on(user.id, TripRequest::new("Lima"), today())
            .await
            .unwrap()
            .trip_id
            .unwrap();
        let outcome = planner.generate_itinerary(trip_id, None, None).await.unwrap();
        assert_eq!(outcome.status, ItineraryStatus::GenerationError);
    }

    #[tokio::test]
    async fn test_generate_missing_trip() {
        let (planner, _) = planner(vec![]).await;
        assert!(planner.generate_itinerary(42, None, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_trip() {
        let (planner, user) = planner(vec![]).await;
        let trip_id = planner
            .plan_or_update_trip_on(user, TripRequest::new("Rome"), today())
            .await
            .unwrap()
            .trip_id
            .unwrap();

        let patch = TripPatch {
            budget: Some(2000.0),
            status: Some(TripStatus::Booked),
            ..TripPatch::default()
        };
        let outcome = planner.update_trip(trip_id, patch).await.unwrap();
        assert_eq!(outcome.changed, vec!["budget", "status"]);
        assert_eq!(planner.get_trip(trip_id).await.unwrap().status, TripStatus::Booked);

        let bad = TripPatch {
            budget: Some(-1.0),
            ..TripPatch::default()
        };
        assert!(matches!(
            planner.update_trip(trip_id, bad).await.unwrap_err(),
            PlannerError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_missing_trip_has_no_side_effects() {
        let (planner, user) = planner(vec![]).await;
        let err = planner
            .update_trip(
                77,
                TripPatch {
                    budget: Some(10.0),
                    ..TripPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(planner.list_trips(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activity_editing() {
        let (planner, user) = planner(vec![]).await;
        let trip_id = planner
            .plan_or_update_trip_on(user, TripRequest::new("Rome").duration(2), today())
            .await
            .unwrap()
            .trip_id
            .unwrap();
        let activity = Activity {
            id: String::new(),
            time: "10:00".to_string(),
            kind: ActivityKind::Activity,
            title: "Colosseum".to_string(),
            location: None,
            description: None,
            notes: None,
            booking_ref: None,
        };

        let added = planner.add_activity(trip_id, 2, activity.clone()).await.unwrap();
        assert_eq!(added.activity.id, "act-1");
        assert!(planner.add_activity(trip_id, 3, activity).await.unwrap_err().is_not_found());

        let removed = planner.remove_activity(trip_id, "act-1").await.unwrap();
        assert_eq!(removed.day, 2);
        assert!(planner.remove_activity(trip_id, "act-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_users() {
        let (planner, user) = planner(vec![]).await;
        assert!(matches!(
            planner.create_user("ADA@example.com", "Again").await.unwrap_err(),
            PlannerError::Conflict(_)
        ));
        let same = planner.get_or_create_user("ada@example.com", "Ada").await.unwrap();
        assert_eq!(same.id, user);

        planner
            .plan_or_update_trip_on(user, TripRequest::new("Rome"), today())
            .await
            .unwrap();
        assert_eq!(planner.delete_user(user).await.unwrap(), 1);
        assert!(planner.delete_user(user).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_answer_question() {
        let (planner, _) = planner(vec![CompletionResponse::text("Spring is lovely.")]).await;
        let answer = planner
            .answer_question("When should I visit Kyoto?", Some("weather".to_string()), None)
            .await
            .unwrap();
        assert_eq!(answer, "Spring is lovely.");
    }

    #[tokio::test]
    async fn test_answer_question_llm_error() {
        let (planner, _) = planner(vec![]).await;
        let err = planner.answer_question("Is Bali safe?", None, None).await.unwrap_err();
        assert!(matches!(err, PlannerError::Answer(_)));
    }
}
