use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::PlannerSettings;
use crate::error::PilotError;

use super::client::ApiClient;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: TodoPriority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeadlinePriority {
    Urgent,
    Important,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineItem {
    pub id: String,
    pub title: String,
    pub course: String,
    pub due_date: String,
    pub priority: DeadlinePriority,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyBlock {
    pub id: String,
    pub title: String,
    pub course: String,
    pub duration: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Tip,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total_tasks: u32,
    pub high_priority_count: u32,
    pub upcoming_deadlines: u32,
    pub estimated_study_time: String,
}

/// Response of `POST /api/ai-planner/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiPlan {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default)]
    pub deadlines: Vec<DeadlineItem>,
    #[serde(default, rename = "studyBlocks")]
    pub study_blocks: Vec<StudyBlock>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub summary: PlanSummary,
    pub generated_at: String,
    #[serde(default)]
    pub course_count: u32,
    #[serde(default)]
    pub assignment_count: u32,
}

/// Plan generation with the retry policy layered on top of
/// [`ApiClient::generate_plan`].
///
/// Only [`PilotError::is_retryable`] failures are retried. A timeout is
/// returned straight away: the generator is most likely still busy.
pub struct Planner {
    api: ApiClient,
    max_retries: u32,
    retry_delay: Duration,
}

impl Planner {
    pub fn new(api: ApiClient, settings: &PlannerSettings) -> Self {
        Self {
            api,
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }

    /// Generate a plan, retrying transient failures. Cancelling `cancel`
    /// aborts the attempt in flight and any retry still to come.
    pub async fn generate(&self, force_regenerate: bool, cancel: &CancellationToken) -> Result<AiPlan, PilotError> {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(PilotError::Cancelled);
            }
            attempt += 1;
            tracing::info!(attempt, force_regenerate, "generating study plan");

            // a timed-out attempt cancels its own token, not the caller's
            let call = cancel.child_token();
            match self.api.generate_plan(force_regenerate, &call).await {
                Ok(plan) => {
                    tracing::info!(
                        attempt,
                        todos = plan.todos.len(),
                        deadlines = plan.deadlines.len(),
                        study_blocks = plan.study_blocks.len(),
                        insights = plan.insights.len(),
                        "study plan ready"
                    );
                    return Ok(plan);
                }
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    tracing::warn!(attempt, error = %e, "plan generation failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(PilotError::Cancelled),
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        tracing::warn!(attempt, "plan generation timed out, not retrying");
                    }
                    return Err(e);
                }
            }
        }
    }
}
