//! Chat sessions and the per-message tool loop

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use super::intent::{ClassifyRequest, Intent, IntentClassifier, LlmIntentClassifier, RuleIntentClassifier};
use super::policy::{PolicyGuard, Review};
use super::AgentError;
use crate::config::{AgentConfig, ClassifierKind, Config, PolicyConfig};
use crate::dates;
use crate::domain::Trip;
use crate::llm::{ContentBlock, LlmClient, Message, ToolCall};
use crate::planning::TripPlanner;
use crate::prompts::{DispatcherContext, TripView};
use crate::tools::{ToolContext, ToolExecutor, ToolResult};

const ERROR_REPLY: &str = "I encountered an issue. Could you try rephrasing?";

/// Reply to one chat message
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub reply: String,
    /// Tool name, or one of conversation, clarification,
    /// confirmation_required, cancelled, error
    pub action_taken: String,
    /// Trip created, changed or shown by this message
    pub trip: Option<Trip>,
}

impl AgentResponse {
    fn new(reply: impl Into<String>, action_taken: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            action_taken: action_taken.into(),
            trip: None,
        }
    }
}

/// A request held back until the user confirms it
#[derive(Debug, Clone)]
struct PendingAction {
    calls: Vec<ToolCall>,
}

/// One user's conversation
#[derive(Debug, Clone)]
pub struct ChatSession {
    user_id: i64,
    /// Trip this chat is scoped to, if any
    trip_id: Option<i64>,
    history: Vec<Message>,
    last_trip_id: Option<i64>,
    pending: Option<PendingAction>,
}

impl ChatSession {
    pub fn new(user_id: i64) -> Self {
        debug!(user_id, "ChatSession::new: called");
        Self {
            user_id,
            trip_id: None,
            history: Vec::new(),
            last_trip_id: None,
            pending: None,
        }
    }

    /// Session scoped to one trip: "the trip" always means `trip_id`
    pub fn for_trip(user_id: i64, trip_id: i64) -> Self {
        Self {
            trip_id: Some(trip_id),
            ..Self::new(user_id)
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn bound_trip(&self) -> Option<i64> {
        self.trip_id
    }

    pub fn last_trip_id(&self) -> Option<i64> {
        self.last_trip_id
    }

    /// Trip that unqualified references resolve to
    pub fn current_trip(&self) -> Option<i64> {
        self.trip_id.or(self.last_trip_id)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forget the conversation, keeping the user and bound trip
    pub fn clear(&mut self) {
        debug!("ChatSession::clear: called");
        self.history.clear();
        self.last_trip_id = None;
        self.pending = None;
    }

    /// Drop the oldest messages beyond `limit`, starting on a user turn
    fn trim_history(&mut self, limit: usize) {
        if self.history.len() <= limit {
            return;
        }
        let mut start = self.history.len() - limit;
        while start < self.history.len() && !self.history[start].is_user_text() {
            start += 1;
        }
        debug!(dropped = start, "ChatSession::trim_history: trimming");
        self.history.drain(..start);
    }
}

/// Routes chat messages to tools
pub struct TripAgent {
    planner: TripPlanner,
    classifier: Arc<dyn IntentClassifier>,
    executor: ToolExecutor,
    guard: PolicyGuard,
    config: AgentConfig,
    long_trip_days: i64,
}

impl TripAgent {
    pub fn new(
        planner: TripPlanner,
        classifier: Arc<dyn IntentClassifier>,
        policy: &PolicyConfig,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        debug!(?config, "TripAgent::new: called");
        Ok(Self {
            planner,
            classifier,
            executor: ToolExecutor::standard(),
            guard: PolicyGuard::new(policy)?,
            config,
            long_trip_days: policy.long_trip_confirm_days,
        })
    }

    /// Build the agent with the classifier named in config
    pub fn from_config(
        config: &Config,
        planner: TripPlanner,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Result<Self, AgentError> {
        debug!(classifier = ?config.agent.classifier, "TripAgent::from_config: called");
        let classifier: Arc<dyn IntentClassifier> = match (config.agent.classifier, llm) {
            (ClassifierKind::Llm, Some(llm)) => Arc::new(LlmIntentClassifier::new(llm, config.llm.max_tokens)),
            (ClassifierKind::Llm, None) => {
                return Err(AgentError::Config(
                    "the llm classifier needs a configured LLM; set agent.classifier to rules to run without one"
                        .to_string(),
                ));
            }
            (ClassifierKind::Rules, _) => Arc::new(RuleIntentClassifier::new()?),
        };
        Self::new(planner, classifier, &config.policy, config.agent.clone())
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    /// Handle one user message
    ///
    /// Never fails: unexpected errors become an apologetic reply with
    /// `action_taken = "error"`.
    pub async fn process_message(&self, session: &mut ChatSession, message: &str) -> AgentResponse {
        debug!(user_id = session.user_id, %message, "TripAgent::process_message: called");
        let response = match self.handle(session, message.trim()).await {
            Ok(response) => response,
            Err(e) => {
                error!(user_id = session.user_id, error = %e, "Failed to process message");
                session.history.push(Message::assistant(ERROR_REPLY));
                AgentResponse::new(ERROR_REPLY, "error")
            }
        };
        session.trim_history(self.config.history_limit);
        info!(action = %response.action_taken, trip_id = ?response.trip.as_ref().map(|t| t.id), "Message handled");
        response
    }

    async fn handle(&self, session: &mut ChatSession, message: &str) -> Result<AgentResponse, AgentError> {
        if message.is_empty() {
            return Ok(AgentResponse::new("Where would you like to go?", "conversation"));
        }

        if let Some(pending) = session.pending.take() {
            if self.guard.is_negative(message) {
                debug!("TripAgent::handle: pending request declined");
                let reply = "Okay, I won't make that change.";
                session.history.push(Message::user(message));
                session.history.push(Message::assistant(reply));
                return Ok(AgentResponse::new(reply, "cancelled"));
            }
            if self.guard.is_affirmative(message) {
                debug!("TripAgent::handle: pending request confirmed");
                session.history.push(Message::user(message));
                return Ok(self.run_confirmed(session, message, pending).await);
            }
            // Anything else is a new request; the pending one lapses
            debug!("TripAgent::handle: pending request dropped");
        }

        session.history.push(Message::user(message));
        let system_prompt = self.system_prompt(session).await?;
        let tools = self.executor.definitions();
        let mut results: Vec<(ToolCall, ToolResult)> = Vec::new();
        let mut action = "conversation".to_string();
        let mut reply = None;

        for round in 1..=self.config.max_tool_rounds.max(1) {
            debug!(round, "TripAgent::handle: classify round");
            let intents = self
                .classifier
                .classify(ClassifyRequest {
                    system_prompt: &system_prompt,
                    history: &session.history,
                    tools: &tools,
                })
                .await?;
            let calls: Vec<ToolCall> = intents.iter().filter_map(Intent::tool_call).cloned().collect();
            if calls.is_empty() {
                reply = intents.into_iter().find_map(|intent| match intent {
                    Intent::Conversation(text) => Some(text),
                    _ => None,
                });
                break;
            }

            match self.guard.review(message, &calls) {
                Review::Proceed => {}
                Review::Clarify(question) => {
                    session.history.push(Message::assistant(question.as_str()));
                    return Ok(AgentResponse::new(question, "clarification"));
                }
                Review::Confirm { prompt, calls } => {
                    session.pending = Some(PendingAction { calls });
                    session.history.push(Message::assistant(prompt.as_str()));
                    return Ok(AgentResponse::new(prompt, "confirmation_required"));
                }
            }

            session
                .history
                .push(Message::assistant_blocks(calls.iter().map(ContentBlock::tool_use).collect()));
            let round_results = self.run_calls(session, message, &calls).await;
            session.history.push(Message::user_blocks(
                round_results
                    .iter()
                    .map(|(call, result)| ContentBlock::tool_result(&call.id, &result.content, result.is_error))
                    .collect(),
            ));
            if let Some(last) = calls.last() {
                action = last.name.clone();
            }
            results.extend(round_results);
        }

        let reply = reply
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| summarize(&results));
        session.history.push(Message::assistant(reply.as_str()));
        Ok(AgentResponse {
            reply,
            action_taken: action,
            trip: self.touched_trip(&results).await,
        })
    }

    async fn run_confirmed(&self, session: &mut ChatSession, message: &str, pending: PendingAction) -> AgentResponse {
        let results = self.run_calls(session, message, &pending.calls).await;
        let reply = summarize(&results);
        session.history.push(Message::assistant(reply.as_str()));
        let action = pending
            .calls
            .last()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "conversation".to_string());
        AgentResponse {
            reply,
            action_taken: action,
            trip: self.touched_trip(&results).await,
        }
    }

    async fn run_calls(&self, session: &mut ChatSession, message: &str, calls: &[ToolCall]) -> Vec<(ToolCall, ToolResult)> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let ctx = ToolContext::new(self.planner.clone(), session.user_id)
                .with_trip(session.current_trip())
                .with_message(message);
            let result = self.executor.execute(call, &ctx).await;
            if let Some(trip_id) = result.trip_id {
                session.last_trip_id = Some(trip_id);
            }
            debug!(tool = %call.name, is_error = result.is_error, "TripAgent::run_calls: tool finished");
            results.push((call.clone(), result));
        }
        results
    }

    async fn system_prompt(&self, session: &ChatSession) -> Result<String, AgentError> {
        let trip = match session.trip_id {
            Some(id) => Some(self.planner.get_trip(id).await?),
            None => None,
        };
        self.planner
            .prompts()
            .dispatcher(&DispatcherContext {
                today: dates::today().to_string(),
                long_trip_days: self.long_trip_days,
                last_trip_id: session.last_trip_id,
                trip: trip.as_ref().map(TripView::from),
            })
            .map_err(|e| AgentError::Prompt(e.to_string()))
    }

    async fn touched_trip(&self, results: &[(ToolCall, ToolResult)]) -> Option<Trip> {
        let trip_id = results.iter().rev().find_map(|(_, r)| r.trip_id)?;
        self.planner.get_trip(trip_id).await.ok()
    }
}

/// Plain-text reply built from tool results
pub(crate) fn summarize(results: &[(ToolCall, ToolResult)]) -> String {
    if results.is_empty() {
        return "I'm not sure how to help with that. Could you rephrase?".to_string();
    }
    results
        .iter()
        .map(|(call, result)| describe(call, result))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn describe(call: &ToolCall, result: &ToolResult) -> String {
    let parsed: Option<Value> = serde_json::from_str(&result.content).ok();
    if let Some(message) = parsed.as_ref().and_then(|v| v.get("message")).and_then(Value::as_str) {
        return message.to_string();
    }
    if result.is_error {
        return result.content.clone();
    }
    match (call.name.as_str(), parsed) {
        ("get_user_trips", Some(Value::Array(items))) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| {
                    let when = item
                        .get("start_date")
                        .and_then(Value::as_str)
                        .map(|d| format!(", {}", d))
                        .unwrap_or_default();
                    format!(
                        "- #{} {}{} [{}]",
                        item.get("id").and_then(Value::as_i64).unwrap_or_default(),
                        item.get("destination").and_then(Value::as_str).unwrap_or("?"),
                        when,
                        item.get("status").and_then(Value::as_str).unwrap_or("planning"),
                    )
                })
                .collect();
            format!("Your trips:\n{}", lines.join("\n"))
        }
        ("get_trip_details", Some(value)) => match serde_json::from_value::<Trip>(value) {
            Ok(trip) => describe_trip(&trip),
            Err(_) => result.content.clone(),
        },
        _ => result.content.clone(),
    }
}

fn describe_trip(trip: &Trip) -> String {
    let mut out = trip.summary();
    if !trip.metadata.preferences.is_empty() {
        out.push_str(&format!("\nPreferences: {}", trip.metadata.preferences.join(", ")));
    }
    for day in &trip.metadata.itinerary {
        out.push_str(&format!("\n{}: {} ({} activities)", day.date, day.title, day.activities.len()));
    }
    out
}
