//! Intent classification
//!
//! A chat message is classified into one of a fixed set of intents. Every
//! intent except `Conversation` carries the tool call that carries it out.
//! Two classifiers are provided: one backed by LLM tool calling and one
//! built from keyword rules that never touches the network.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::AgentError;
use crate::dates;
use crate::llm::{CompletionRequest, LlmClient, Message, ToolCall, ToolDefinition};

/// What a message asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Greeting or small talk: reply only
    Conversation(String),
    Question(ToolCall),
    PlanTrip(ToolCall),
    ListTrips(ToolCall),
    ShowTrip(ToolCall),
    UpdateTrip(ToolCall),
    GenerateItinerary(ToolCall),
    /// A tool name outside the known set; executing it reports the error
    Unsupported(ToolCall),
}

impl Intent {
    /// Map a tool call to its intent by tool name
    pub fn from_tool_call(call: ToolCall) -> Self {
        match call.name.as_str() {
            "answer_question" => Self::Question(call),
            "plan_trip" => Self::PlanTrip(call),
            "get_user_trips" => Self::ListTrips(call),
            "get_trip_details" => Self::ShowTrip(call),
            "update_trip" => Self::UpdateTrip(call),
            "generate_itinerary" => Self::GenerateItinerary(call),
            _ => Self::Unsupported(call),
        }
    }

    pub fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::Conversation(_) => None,
            Self::Question(c)
            | Self::PlanTrip(c)
            | Self::ListTrips(c)
            | Self::ShowTrip(c)
            | Self::UpdateTrip(c)
            | Self::GenerateItinerary(c)
            | Self::Unsupported(c) => Some(c),
        }
    }
}

/// Everything a classifier may look at for one round
pub struct ClassifyRequest<'a> {
    /// Rendered dispatcher prompt
    pub system_prompt: &'a str,
    /// Conversation so far, ending with the latest user message or tool results
    pub history: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

impl ClassifyRequest<'_> {
    /// Text of the latest message when it is plain user text
    pub fn latest_user_text(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|m| m.is_user_text())
            .and_then(|m| m.content.as_text())
    }
}

/// Decides what a message asks for
///
/// An empty result means the classifier has nothing more to do this turn
/// (typically after tool results came back) and the caller should reply
/// from those results.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Vec<Intent>, AgentError>;
}

/// Classifier backed by LLM tool calling
pub struct LlmIntentClassifier {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Vec<Intent>, AgentError> {
        debug!(history = request.history.len(), "LlmIntentClassifier::classify: called");
        let response = self
            .llm
            .complete(CompletionRequest {
                system_prompt: request.system_prompt.to_string(),
                messages: request.history.to_vec(),
                tools: request.tools.to_vec(),
                max_tokens: self.max_tokens,
            })
            .await?;

        if !response.tool_calls.is_empty() {
            debug!(count = response.tool_calls.len(), "LlmIntentClassifier::classify: tool calls");
            return Ok(response.tool_calls.into_iter().map(Intent::from_tool_call).collect());
        }
        Ok(response
            .content
            .filter(|c| !c.trim().is_empty())
            .map(|c| vec![Intent::Conversation(c)])
            .unwrap_or_default())
    }
}

const PREFERENCE_TAGS: &[&str] = &[
    "food",
    "culture",
    "history",
    "museums",
    "art",
    "beaches",
    "hiking",
    "nature",
    "nightlife",
    "shopping",
    "adventure",
    "relaxation",
    "wine",
    "temples",
];

/// Deterministic classifier built from keyword rules
///
/// Good enough for scripted use and offline testing; it understands one
/// request per message and extracts only common phrasings.
pub struct RuleIntentClassifier {
    greeting: Regex,
    list_trips: Regex,
    show_trip: Regex,
    itinerary: Regex,
    update: Regex,
    plan: Regex,
    question: Regex,
    trip_ref: Regex,
    start_day: Regex,
    iso_date: Regex,
    month: Regex,
    duration: Regex,
    budget: Regex,
    travelers: Regex,
    today: NaiveDate,
}

impl RuleIntentClassifier {
    pub fn new() -> Result<Self, AgentError> {
        Self::on(dates::today())
    }

    /// Classifier that resolves bare month names relative to `today`
    pub fn on(today: NaiveDate) -> Result<Self, AgentError> {
        Ok(Self {
            greeting: Regex::new(
                r"(?i)^\s*(hi|hello|hey|hiya|good (morning|afternoon|evening)|thanks|thank you|cheers|ok|okay)\b[\s!.,]*(there|tripmind)?[\s!.]*$",
            )?,
            list_trips: Regex::new(r"(?i)\b(show|list|see|view|what are)\b.*\btrips\b|^\s*my trips\b")?,
            show_trip: Regex::new(r"(?i)\b(show|details?|view|open|see)\b.*\btrip\s*#?\d+")?,
            itinerary: Regex::new(r"(?i)\b(itinerary|day[- ]by[- ]day|plan (my|our|the) days|schedule for each day)\b")?,
            update: Regex::new(
                r"(?i)\b(change|update|set|make|increase|raise|lower|reduce|move|switch|mark)\b.*\b(budget|dates?|start|end|travell?ers|people|duration|days|status|booked|destination)\b",
            )?,
            plan: Regex::new(
                r"(?i)\b(?:trip|travel|go|going|visit|vacation|holiday|fly|getaway|plan(?:ning)?(?: a trip)?)\s+(?:to|in)\s+([A-Za-z][A-Za-z .'-]*?)(?:\s+(?:in|for|from|with|on|next|this|around|during|under|at)\b|[,.!?;]|$)",
            )?,
            question: Regex::new(r"(?i)(\?\s*$|^\s*(what|is|are|how|when|where|which|should|can|do|does|tell me)\b)")?,
            trip_ref: Regex::new(r"(?i)\btrip\s*#?(\d+)\b|#(\d+)\b")?,
            start_day: Regex::new(r"(?i)\b(?:from|starting(?: at| from)?|continue(?: from)?(?: with)?)\s+day\s+(\d+)")?,
            iso_date: Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b")?,
            month: Regex::new(
                r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)(?:\s+(\d{4}))?\b",
            )?,
            duration: Regex::new(r"(?i)\b(\d+)[\s-]*(day|night|week)s?\b|\ba (week|fortnight)\b")?,
            budget: Regex::new(
                r"(?i)(?:budget(?: of| is| to)?\s*|[$€£¥]\s*)(\d[\d,]*(?:\.\d+)?)\s*(k\b)?|(\d[\d,]*(?:\.\d+)?)\s*(k\b)?\s*(?:usd|dollars|eur|euros|gbp|pounds|sgd|aud|jpy|yen)\b",
            )?,
            travelers: Regex::new(r"(?i)\b(\d+)\s+(?:people|persons|travell?ers|adults|of us|guests)\b|\bfor (two|three|four|five|six)\b")?,
            today,
        })
    }

    fn call(name: &str, input: Value) -> ToolCall {
        ToolCall::new(format!("rule-{}", uuid::Uuid::now_v7()), name, input)
    }

    fn trip_id(&self, text: &str) -> Option<i64> {
        let caps = self.trip_ref.captures(text)?;
        caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
    }

    /// "June" alone means the next June that has not started yet
    fn month_date(&self, text: &str) -> Option<String> {
        let caps = self.month.captures(text)?;
        let name = caps.get(1)?.as_str();
        let month = (1..=12).find(|m| dates::month_name(*m).eq_ignore_ascii_case(name))?;
        let year = match caps.get(2).and_then(|y| y.as_str().parse::<i32>().ok()) {
            Some(y) => y,
            None if month < self.today.month() => self.today.year() + 1,
            None => self.today.year(),
        };
        Some(format!("{} {}", dates::month_name(month), year))
    }

    fn duration(&self, text: &str) -> Option<i64> {
        let caps = self.duration.captures(text)?;
        if let Some(word) = caps.get(3) {
            return Some(if word.as_str().eq_ignore_ascii_case("week") { 7 } else { 14 });
        }
        let n: i64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_lowercase();
        Some(match unit.as_str() {
            "week" => n * 7,
            "night" => n + 1,
            _ => n,
        })
    }

    fn budget(&self, text: &str) -> Option<f64> {
        let caps = self.budget.captures(text)?;
        let (number, thousands) = match caps.get(1) {
            Some(n) => (n, caps.get(2)),
            None => (caps.get(3)?, caps.get(4)),
        };
        let value: f64 = number.as_str().replace(',', "").parse().ok()?;
        Some(if thousands.is_some() { value * 1000.0 } else { value })
    }

    fn travelers(&self, text: &str) -> Option<i64> {
        let caps = self.travelers.captures(text)?;
        if let Some(n) = caps.get(1) {
            return n.as_str().parse().ok();
        }
        match caps.get(2)?.as_str().to_lowercase().as_str() {
            "two" => Some(2),
            "three" => Some(3),
            "four" => Some(4),
            "five" => Some(5),
            "six" => Some(6),
            _ => None,
        }
    }

    fn preferences(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
        PREFERENCE_TAGS
            .iter()
            .filter(|tag| words.iter().any(|w| w == *tag || *w == tag.trim_end_matches('s')))
            .map(|tag| tag.to_string())
            .collect()
    }

    /// Trip fields mentioned anywhere in the message
    fn trip_fields(&self, text: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        let isos: Vec<&str> = self.iso_date.find_iter(text).map(|m| m.as_str()).collect();
        match isos.as_slice() {
            [start, end, ..] => {
                fields.insert("start_date".into(), json!(start));
                fields.insert("end_date".into(), json!(end));
            }
            [start] => {
                fields.insert("start_date".into(), json!(start));
            }
            [] => {
                if let Some(month) = self.month_date(text) {
                    fields.insert("start_date".into(), json!(month));
                }
            }
        }
        if let Some(days) = self.duration(text) {
            fields.insert("duration_days".into(), json!(days));
        }
        if let Some(budget) = self.budget(text) {
            fields.insert("budget".into(), json!(budget));
        }
        if let Some(n) = self.travelers(text) {
            fields.insert("travelers_count".into(), json!(n));
        }
        let preferences = Self::preferences(text);
        if !preferences.is_empty() {
            fields.insert("preferences".into(), json!(preferences));
        }
        fields
    }

    fn classify_text(&self, text: &str) -> Intent {
        debug!(%text, "RuleIntentClassifier::classify_text: called");
        if self.greeting.is_match(text) {
            return Intent::Conversation(
                "Hi! Tell me where you'd like to go and roughly when, and I'll start planning.".to_string(),
            );
        }
        if self.list_trips.is_match(text) && self.trip_id(text).is_none() {
            return Intent::ListTrips(Self::call("get_user_trips", json!({})));
        }
        if self.show_trip.is_match(text)
            && let Some(id) = self.trip_id(text)
        {
            return Intent::ShowTrip(Self::call("get_trip_details", json!({ "trip_id": id })));
        }
        if self.itinerary.is_match(text) {
            let mut input = Map::new();
            if let Some(id) = self.trip_id(text) {
                input.insert("trip_id".into(), json!(id));
            }
            if let Some(day) = self.start_day.captures(text).and_then(|c| c.get(1)) {
                input.insert("start_day".into(), json!(day.as_str().parse::<i64>().unwrap_or(1)));
            }
            let preferences = Self::preferences(text);
            if !preferences.is_empty() {
                input.insert("preferences".into(), json!(preferences));
            }
            return Intent::GenerateItinerary(Self::call("generate_itinerary", Value::Object(input)));
        }
        if self.update.is_match(text) {
            let mut input = self.trip_fields(text);
            if let Some(id) = self.trip_id(text) {
                input.insert("trip_id".into(), json!(id));
            }
            let lower = text.to_lowercase();
            for status in ["booked", "completed", "cancelled", "canceled"] {
                if lower.contains(status) {
                    input.insert("status".into(), json!(status));
                }
            }
            if !input.is_empty() {
                return Intent::UpdateTrip(Self::call("update_trip", Value::Object(input)));
            }
        }
        if let Some(caps) = self.plan.captures(text)
            && let Some(dest) = caps.get(1)
        {
            let mut input = self.trip_fields(text);
            input.insert("destination".into(), json!(dest.as_str().trim()));
            return Intent::PlanTrip(Self::call("plan_trip", Value::Object(input)));
        }
        if self.question.is_match(text) {
            return Intent::Question(Self::call("answer_question", json!({ "question": text.trim() })));
        }
        Intent::Conversation(
            "I can plan trips, update them, write itineraries and answer travel questions. \
             Try \"Plan a trip to Lisbon in May for 5 days\"."
                .to_string(),
        )
    }
}

#[async_trait]
impl IntentClassifier for RuleIntentClassifier {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Vec<Intent>, AgentError> {
        match request.latest_user_text() {
            Some(text) => Ok(vec![self.classify_text(text)]),
            None => {
                // Tool results came back; one rule round per message
                debug!("RuleIntentClassifier::classify: no new user text");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;

    fn rules() -> RuleIntentClassifier {
        RuleIntentClassifier::on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()).unwrap()
    }

    fn input(intent: &Intent) -> &Value {
        &intent.tool_call().unwrap().input
    }

    #[test]
    fn test_greeting() {
        assert!(matches!(rules().classify_text("Hi there!"), Intent::Conversation(_)));
        assert!(matches!(rules().classify_text("thanks"), Intent::Conversation(_)));
    }

    #[test]
    fn test_plan_trip_extraction() {
        let intent = rules().classify_text("I want to go to Tokyo in June for 5 days with a budget of $3,000, love food and temples");
        assert!(matches!(intent, Intent::PlanTrip(_)));
        let input = input(&intent);
        assert_eq!(input["destination"], "Tokyo");
        assert_eq!(input["start_date"], "June 2027");
        assert_eq!(input["duration_days"], 5);
        assert_eq!(input["budget"], 3000.0);
        assert_eq!(input["preferences"], json!(["food", "temples"]));
    }

    #[test]
    fn test_plan_trip_dates_and_travelers() {
        let intent = rules().classify_text("Plan a trip to Paris from 2027-05-01 to 2027-05-06 for 2 people");
        let input = input(&intent);
        assert_eq!(input["destination"], "Paris");
        assert_eq!(input["start_date"], "2027-05-01");
        assert_eq!(input["end_date"], "2027-05-06");
        assert_eq!(input["travelers_count"], 2);
    }

    #[test]
    fn test_month_this_year_when_upcoming() {
        let intent = rules().classify_text("trip to Oslo in December");
        assert_eq!(input(&intent)["start_date"], "December 2026");
    }

    #[test]
    fn test_list_and_show() {
        assert!(matches!(rules().classify_text("show my trips"), Intent::ListTrips(_)));
        let intent = rules().classify_text("show me details for trip #4");
        assert!(matches!(intent, Intent::ShowTrip(_)));
        assert_eq!(input(&intent)["trip_id"], 4);
    }

    #[test]
    fn test_update() {
        let intent = rules().classify_text("change the budget to $2000");
        assert!(matches!(intent, Intent::UpdateTrip(_)));
        assert_eq!(input(&intent)["budget"], 2000.0);

        let intent = rules().classify_text("mark trip 3 as booked");
        assert_eq!(input(&intent)["status"], "booked");
        assert_eq!(input(&intent)["trip_id"], 3);
    }

    #[test]
    fn test_itinerary() {
        let intent = rules().classify_text("continue the itinerary from day 6");
        assert!(matches!(intent, Intent::GenerateItinerary(_)));
        assert_eq!(input(&intent)["start_day"], 6);
    }

    #[test]
    fn test_question_and_fallback() {
        let intent = rules().classify_text("Is Bali safe in March?");
        assert!(matches!(intent, Intent::Question(_)));
        assert_eq!(input(&intent)["question"], "Is Bali safe in March?");
        assert!(matches!(rules().classify_text("blorp"), Intent::Conversation(_)));
    }

    #[test]
    fn test_from_tool_call() {
        let call = ToolCall::new("1", "plan_trip", json!({}));
        assert!(matches!(Intent::from_tool_call(call), Intent::PlanTrip(_)));
        let call = ToolCall::new("2", "book_flight", json!({}));
        assert!(matches!(Intent::from_tool_call(call), Intent::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_rules_stop_after_tool_results() {
        let history = vec![
            Message::user("show my trips"),
            Message::user_blocks(vec![crate::llm::ContentBlock::tool_result("1", "[]", false)]),
        ];
        let request = ClassifyRequest {
            system_prompt: "",
            history: &history,
            tools: &[],
        };
        assert!(rules().classify(request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_classifier_maps_tool_calls() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::tools(vec![ToolCall::new("c1", "get_user_trips", json!({}))]),
            CompletionResponse::text("Hello! Where to?"),
        ]));
        let classifier = LlmIntentClassifier::new(llm.clone(), 512);
        let history = vec![Message::user("what trips do I have")];
        let request = || ClassifyRequest {
            system_prompt: "system",
            history: &history,
            tools: &[],
        };

        let intents = classifier.classify(request()).await.unwrap();
        assert!(matches!(intents.as_slice(), [Intent::ListTrips(_)]));

        let intents = classifier.classify(request()).await.unwrap();
        assert_eq!(intents, vec![Intent::Conversation("Hello! Where to?".to_string())]);
        assert_eq!(llm.requests()[0].system_prompt, "system");
    }
}
