//! Workflow and step records.
//!
//! Steps are append-only and addressed by `position`, which starts at 1 and
//! is never reused. A step's status only moves forward; once it is completed
//! or failed its output and error are frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::AgentRole;
use crate::error::RelayError;

// ─── Step status ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        )
    }
}

// ─── Workflow state ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    InProgress,
    AwaitingReview,
    NeedsRevision,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::AwaitingReview => "awaiting_review",
            Self::NeedsRevision => "needs_revision",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Step ───────────────────────────────────────────────────────────────

/// What an agent produced for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub raw_response: String,
    /// Structured reply, when the raw text was valid JSON.
    pub parsed: Option<Value>,
}

impl StepOutput {
    /// The structured reply if there is one, otherwise the raw text.
    pub fn as_value(&self) -> Value {
        self.parsed
            .clone()
            .unwrap_or_else(|| Value::String(self.raw_response.clone()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStep {
    pub position: u32,
    pub agent: AgentRole,
    pub instruction: String,
    status: StepStatus,
    input_context: Map<String, Value>,
    output: Option<StepOutput>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl WorkflowStep {
    fn new(position: u32, agent: AgentRole, instruction: String) -> Self {
        Self {
            position,
            agent,
            instruction,
            status: StepStatus::Pending,
            input_context: Map::new(),
            output: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Snapshot of the context the step was started with.
    pub fn input_context(&self) -> &Map<String, Value> {
        &self.input_context
    }

    pub fn output(&self) -> Option<&StepOutput> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub(crate) fn start(&mut self, context: Map<String, Value>) -> Result<(), RelayError> {
        self.transition(StepStatus::InProgress)?;
        self.input_context = context;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn complete(&mut self, output: StepOutput) -> Result<(), RelayError> {
        self.transition(StepStatus::Completed)?;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: String) -> Result<(), RelayError> {
        self.transition(StepStatus::Failed)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: StepStatus) -> Result<(), RelayError> {
        if !self.status.can_transition_to(next) {
            return Err(RelayError::InvalidTransition(format!(
                "step {} cannot move from {} to {}",
                self.position,
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// One executed step, as recorded in the workflow's conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub position: u32,
    pub agent: AgentRole,
    pub instruction: String,
    pub success: bool,
    /// Parsed reply, raw text, or the error message of a failed step.
    pub result: Value,
    pub timestamp: DateTime<Utc>,
}

// ─── Workflow ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Workflow {
    id: String,
    user_request: String,
    pub(crate) state: WorkflowState,
    steps: Vec<WorkflowStep>,
    next_position: u32,
    pub(crate) iteration_count: u32,
    max_iterations: u32,
    conversation_log: Vec<ConversationEntry>,
    final_output: Option<String>,
}

impl Workflow {
    pub fn new(user_request: impl Into<String>, max_iterations: u32) -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("wf_{}", &hex[..8]),
            user_request: user_request.into(),
            state: WorkflowState::Pending,
            steps: Vec::new(),
            next_position: 1,
            iteration_count: 0,
            max_iterations: max_iterations.max(1),
            conversation_log: Vec::new(),
            final_output: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, position: u32) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.position == position)
    }

    pub(crate) fn step_mut(&mut self, position: u32) -> Option<&mut WorkflowStep> {
        self.steps.iter_mut().find(|s| s.position == position)
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Change the iteration cap. Values below 1 are raised to 1.
    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        self.max_iterations = max_iterations.max(1);
    }

    pub fn conversation_log(&self) -> &[ConversationEntry] {
        &self.conversation_log
    }

    pub fn final_output(&self) -> Option<&str> {
        self.final_output.as_deref()
    }

    /// Append a pending step and return its position.
    pub fn push_step(&mut self, agent: AgentRole, instruction: impl Into<String>) -> u32 {
        let position = self.next_position;
        self.next_position += 1;
        self.steps.push(WorkflowStep::new(position, agent, instruction.into()));
        position
    }

    /// Positions of pending steps, ascending.
    pub fn pending_positions(&self) -> Vec<u32> {
        let mut positions: Vec<u32> = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .map(|s| s.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Most recent completed step for `role`, by position.
    pub fn latest_completed(&self, role: AgentRole) -> Option<&WorkflowStep> {
        self.steps
            .iter()
            .filter(|s| s.agent == role && s.is_completed())
            .max_by_key(|s| s.position)
    }

    pub(crate) fn record_conversation(&mut self, entry: ConversationEntry) {
        self.conversation_log.push(entry);
    }

    pub(crate) fn set_final_output(&mut self, output: String) -> Result<(), RelayError> {
        if self.final_output.is_some() {
            return Err(RelayError::Internal(format!(
                "final output of workflow {} is already set",
                self.id
            )));
        }
        self.final_output = Some(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_id_format() {
        let wf = Workflow::new("check SLA", 5);
        assert!(wf.id().starts_with("wf_"));
        assert_eq!(wf.id().len(), 11);
        assert!(wf.id()[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(wf.state(), WorkflowState::Pending);
        assert!(wf.steps().is_empty());
    }

    #[test]
    fn test_positions_are_monotonic() {
        let mut wf = Workflow::new("r", 0);
        assert_eq!(wf.max_iterations(), 1);
        assert_eq!(wf.push_step(AgentRole::Classifier, "a"), 1);
        assert_eq!(wf.push_step(AgentRole::Research, "b"), 2);
        assert_eq!(wf.push_step(AgentRole::Reviewer, "c"), 3);
        assert_eq!(wf.pending_positions(), vec![1, 2, 3]);
    }

    #[test]
    fn test_step_transitions() {
        let mut wf = Workflow::new("r", 5);
        let pos = wf.push_step(AgentRole::Research, "find data");
        let step = wf.step_mut(pos).unwrap();

        assert!(step
            .complete(StepOutput { raw_response: "x".into(), parsed: None })
            .is_err());
        step.start(Map::new()).unwrap();
        assert!(step.start(Map::new()).is_err());
        step.complete(StepOutput { raw_response: "done".into(), parsed: None })
            .unwrap();
        assert!(step.fail("late".into()).is_err());
        assert_eq!(step.output().unwrap().raw_response, "done");
        assert!(step.error().is_none());
        assert!(step.completed_at().is_some());
    }

    #[test]
    fn test_latest_completed_picks_highest_position() {
        let mut wf = Workflow::new("r", 5);
        for text in ["first", "second"] {
            let pos = wf.push_step(AgentRole::Reviewer, "review");
            let step = wf.step_mut(pos).unwrap();
            step.start(Map::new()).unwrap();
            step.complete(StepOutput { raw_response: text.into(), parsed: None })
                .unwrap();
        }
        wf.push_step(AgentRole::Reviewer, "pending review");
        let latest = wf.latest_completed(AgentRole::Reviewer).unwrap();
        assert_eq!(latest.output().unwrap().raw_response, "second");
    }

    #[test]
    fn test_final_output_set_once() {
        let mut wf = Workflow::new("r", 5);
        wf.set_final_output("answer".into()).unwrap();
        assert!(wf.set_final_output("again".into()).is_err());
        assert_eq!(wf.final_output(), Some("answer"));
    }

    #[test]
    fn test_step_output_as_value() {
        let raw = StepOutput { raw_response: "plain".into(), parsed: None };
        assert_eq!(raw.as_value(), Value::String("plain".into()));
        let parsed = StepOutput {
            raw_response: "{\"a\":1}".into(),
            parsed: Some(serde_json::json!({"a": 1})),
        };
        assert_eq!(parsed.as_value()["a"], 1);
    }
}
