//! answer_question tool - free-form travel questions, no state changes

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::context::opt_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

pub struct AnswerQuestionTool;

#[async_trait]
impl Tool for AnswerQuestionTool {
    fn name(&self) -> &'static str {
        "answer_question"
    }

    fn description(&self) -> &'static str {
        "Answer a general travel question (weather, safety, visas, what to see). Never changes a trip."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "The question, restated in full" },
                "topic": { "type": "string", "description": "Short topic, e.g. weather, safety, visas" }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let (question, topic) = match (opt_str(&input, "question"), opt_str(&input, "topic")) {
            (Ok(q), Ok(t)) => (q, t),
            (Err(e), _) | (_, Err(e)) => return ToolResult::error(e.to_string()),
        };
        let question = question.unwrap_or_else(|| ctx.message.clone());
        if question.trim().is_empty() {
            return ToolResult::error(ToolError::MissingArgument("question").to_string());
        }
        debug!(%question, ?topic, "AnswerQuestionTool::execute: called");

        match ctx.planner.answer_question(&question, topic, ctx.trip_id).await {
            Ok(answer) => ToolResult::success(answer),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::planning::TripPlanner;
    use crate::state::StateManager;

    #[tokio::test]
    async fn test_requires_a_question() {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let ctx = ToolContext::new(planner, 1);
        let result = AnswerQuestionTool.execute(json!({}), &ctx).await;
        assert!(result.is_error);
        assert!(result.content.contains("question"));
    }

    #[tokio::test]
    async fn test_falls_back_to_message_and_reports_missing_service() {
        let planner = TripPlanner::new(StateManager::spawn_in_memory().unwrap(), GenerationConfig::default());
        let ctx = ToolContext::new(planner, 1).with_message("Is Bali safe?");
        let result = AnswerQuestionTool.execute(json!({}), &ctx).await;
        assert!(result.is_error);
        assert!(result.content.contains("text-generation"));
    }
}
