//! Workflow Orchestrator: plans, runs, revises and finalizes workflows.
//!
//! ```text
//! pending ──► in_progress ──► awaiting_review ──► completed
//!                 ▲                  │
//!                 └── needs_revision ◄┘   (reviewer asked for more work)
//! ```
//!
//! Steps run one at a time in ascending position. Revision steps are only
//! ever appended, and each workflow runs at most `max_iterations` passes
//! before it is finalized regardless of what the reviewer says.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_stream::Stream;

use super::executor::AgentExecutor;
use super::model::{ConversationEntry, StepOutput, StepStatus, Workflow, WorkflowState, WorkflowStep};
use super::summary::WorkflowSummary;
use crate::agents::{AgentCatalog, AgentRole};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::events::{ChannelSink, ProgressSink, WorkflowEvent};

pub type WorkflowEventStream = Pin<Box<dyn Stream<Item = WorkflowEvent> + Send>>;

const REVISION_REVIEW_INSTRUCTION: &str =
    "Review the additional findings and determine if analysis is complete";
const FORCED_FORMATTER_INSTRUCTION: &str = "Create final response synthesizing all agent findings";

/// Where a workflow's initial steps came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Planner,
    Fallback,
}

/// Instruction used when a planned step has none, and for the fallback plan.
fn default_instruction(role: AgentRole, request: &str) -> String {
    match role {
        AgentRole::Planner => format!("Plan a workflow for this user request: {}", request),
        AgentRole::Classifier => format!("Classify and prioritize: {}", request),
        AgentRole::Research => format!("Research relevant data for: {}", request),
        AgentRole::Compliance => format!("Check compliance requirements for: {}", request),
        AgentRole::Reviewer => "Review all findings and identify gaps".to_string(),
        AgentRole::Formatter => "Create final response for user".to_string(),
    }
}

fn default_plan(request: &str) -> Vec<(AgentRole, String)> {
    [
        AgentRole::Classifier,
        AgentRole::Research,
        AgentRole::Compliance,
        AgentRole::Reviewer,
        AgentRole::Formatter,
    ]
    .into_iter()
    .map(|role| (role, default_instruction(role, request)))
    .collect()
}

/// Read `workflow_steps: [{agent, instruction}]` out of a planner reply.
fn planned_steps(parsed: &Value, request: &str) -> Vec<(AgentRole, String)> {
    let Some(items) = parsed.get("workflow_steps").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let role = item
                .get("agent")
                .and_then(|v| v.as_str())
                .map(AgentRole::parse_or_research)
                .unwrap_or(AgentRole::Research);
            let instruction = item
                .get("instruction")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_instruction(role, request));
            (role, instruction)
        })
        .collect()
}

/// Outputs of completed steps before `position`, keyed by role tag, plus the request.
fn step_context(workflow: &Workflow, position: u32) -> Map<String, Value> {
    let mut earlier: Vec<&WorkflowStep> = workflow
        .steps()
        .iter()
        .filter(|s| s.position < position && s.is_completed())
        .collect();
    earlier.sort_by_key(|s| s.position);

    let mut context = Map::new();
    for step in earlier {
        if let Some(output) = step.output() {
            // Later outputs of the same role replace earlier ones.
            context.insert(step.agent.as_str().to_string(), output.as_value());
        }
    }
    context.insert(
        "user_request".to_string(),
        Value::String(workflow.user_request().to_string()),
    );
    context
}

/// Coordinates workflows. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    executor: Arc<AgentExecutor>,
    default_max_iterations: u32,
    workflows: Arc<RwLock<HashMap<String, Workflow>>>,
}

impl WorkflowOrchestrator {
    pub fn new(executor: Arc<AgentExecutor>, default_max_iterations: u32) -> Self {
        Self {
            executor,
            default_max_iterations: default_max_iterations.max(1),
            workflows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &RelayConfig, catalog: Arc<AgentCatalog>) -> Result<Self, RelayError> {
        let executor = AgentExecutor::from_config(config, catalog)?;
        Ok(Self::new(Arc::new(executor), config.max_iterations))
    }

    // ─── Registry ───────────────────────────────────────────────────────

    /// Build a workflow that is not tracked by the registry.
    pub fn new_workflow(&self, user_request: impl Into<String>) -> Workflow {
        Workflow::new(user_request, self.default_max_iterations)
    }

    /// Register a new pending workflow and return its id.
    pub async fn create_workflow(&self, user_request: impl Into<String>) -> String {
        let workflow = self.new_workflow(user_request);
        let id = workflow.id().to_string();
        tracing::info!("[Orchestrator] Created workflow {}", id);
        self.workflows.write().await.insert(id.clone(), workflow);
        id
    }

    /// Summary of a registered workflow that has not been run yet.
    pub async fn workflow_summary(&self, workflow_id: &str) -> Result<WorkflowSummary, RelayError> {
        self.workflows
            .read()
            .await
            .get(workflow_id)
            .map(WorkflowSummary::from_workflow)
            .ok_or_else(|| RelayError::NotFound(format!("Workflow {} not found", workflow_id)))
    }

    /// Remove a registered workflow without running it.
    pub async fn discard(&self, workflow_id: &str) -> Result<WorkflowSummary, RelayError> {
        let workflow = self
            .workflows
            .write()
            .await
            .remove(workflow_id)
            .ok_or_else(|| RelayError::NotFound(format!("Workflow {} not found", workflow_id)))?;
        tracing::info!("[Orchestrator] Discarded workflow {}", workflow_id);
        Ok(WorkflowSummary::from_workflow(&workflow))
    }

    // ─── Planning ───────────────────────────────────────────────────────

    /// Ask the planner for steps, falling back to the default sequence.
    pub async fn plan(&self, workflow: &mut Workflow) -> PlanSource {
        let request = workflow.user_request().to_string();
        let instruction = default_instruction(AgentRole::Planner, &request);
        let result = self
            .executor
            .execute(AgentRole::Planner, &instruction, &Map::new(), None)
            .await;

        let planned = match (result.success, result.parsed_response.as_ref()) {
            (true, Some(parsed)) => planned_steps(parsed, &request),
            (true, None) => {
                tracing::warn!("[Orchestrator] Planner reply for {} was not JSON", workflow.id());
                Vec::new()
            }
            (false, _) => {
                tracing::warn!(
                    "[Orchestrator] Planner failed for {}: {}",
                    workflow.id(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
                Vec::new()
            }
        };

        let (steps, source) = if planned.is_empty() {
            tracing::warn!("[Orchestrator] Using default plan for {}", workflow.id());
            (default_plan(&request), PlanSource::Fallback)
        } else {
            (planned, PlanSource::Planner)
        };

        for (role, instruction) in steps {
            workflow.push_step(role, instruction);
        }
        tracing::info!(
            "[Orchestrator] Planned {} step(s) for {}",
            workflow.steps().len(),
            workflow.id()
        );
        source
    }

    // ─── Execution ──────────────────────────────────────────────────────

    /// Execute the step at `position`. Steps that are not pending are skipped.
    pub async fn execute_step(
        &self,
        workflow: &mut Workflow,
        position: u32,
        sink: &dyn ProgressSink,
    ) -> Result<(), RelayError> {
        let step = workflow.step(position).ok_or_else(|| {
            RelayError::NotFound(format!("Step {} of workflow {}", position, workflow.id()))
        })?;
        if step.status() != StepStatus::Pending {
            tracing::debug!(
                "[Orchestrator] Skipping step {} ({})",
                position,
                step.status().as_str()
            );
            return Ok(());
        }
        let agent = step.agent;
        let instruction = step.instruction.clone();

        let context = step_context(workflow, position);
        let knowledge_query = if self.executor.catalog().get(agent).can_query_knowledge {
            Some(workflow.user_request().to_string())
        } else {
            None
        };

        step_mut(workflow, position)?.start(context.clone())?;
        sink.emit(WorkflowEvent::step_started(position, agent, &instruction));

        let result = self
            .executor
            .execute(agent, &instruction, &context, knowledge_query.as_deref())
            .await;

        let step = step_mut(workflow, position)?;
        let entry_result = if result.success {
            let output = StepOutput {
                raw_response: result.raw_response.unwrap_or_default(),
                parsed: result.parsed_response,
            };
            let value = output.as_value();
            step.complete(output)?;
            value
        } else {
            let error = result.error.unwrap_or_else(|| "unknown error".to_string());
            step.fail(error.clone())?;
            json!({ "error": error })
        };

        sink.emit(WorkflowEvent::step_finished(
            position,
            agent,
            result.success,
            step.error(),
        ));

        workflow.record_conversation(ConversationEntry {
            position,
            agent,
            instruction,
            success: result.success,
            result: entry_result,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    // ─── Revision ───────────────────────────────────────────────────────

    /// Whether the most recent completed reviewer asked for more work.
    pub fn needs_revision(&self, workflow: &Workflow) -> bool {
        let Some(parsed) = workflow
            .latest_completed(AgentRole::Reviewer)
            .and_then(|s| s.output())
            .and_then(|o| o.parsed.as_ref())
        else {
            return false;
        };

        let has_work = parsed
            .get("additional_work_needed")
            .and_then(|v| v.as_array())
            .map(|items| !items.is_empty())
            .unwrap_or(false);
        let not_ready = parsed.get("ready_for_output") == Some(&Value::Bool(false));
        has_work || not_ready
    }

    /// Append the work the latest completed reviewer requested, followed by a
    /// fresh reviewer step.
    ///
    /// If the re-judging reviewer fails, the earlier reviewer stays the latest
    /// completed one and its requests are appended again on the next call.
    pub fn add_revision_steps(&self, workflow: &mut Workflow) -> Vec<WorkflowStep> {
        let Some(reviewer) = workflow.latest_completed(AgentRole::Reviewer) else {
            return Vec::new();
        };
        let review_position = reviewer.position;

        let work: Vec<(AgentRole, String)> = reviewer
            .output()
            .and_then(|o| o.parsed.as_ref())
            .and_then(|p| p.get("additional_work_needed"))
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let task = item
                            .get("task")
                            .or_else(|| item.get("instruction"))
                            .and_then(|v| v.as_str())
                            .map(str::trim)
                            .filter(|s| !s.is_empty())?;
                        let role = item
                            .get("agent")
                            .and_then(|v| v.as_str())
                            .map(AgentRole::parse_or_research)
                            .unwrap_or(AgentRole::Research);
                        Some((role, task.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if work.is_empty() {
            tracing::info!(
                "[Orchestrator] Reviewer step {} requested nothing actionable",
                review_position
            );
            return Vec::new();
        }

        let mut positions: Vec<u32> = work
            .into_iter()
            .map(|(role, task)| workflow.push_step(role, task))
            .collect();
        positions.push(workflow.push_step(AgentRole::Reviewer, REVISION_REVIEW_INSTRUCTION));

        tracing::info!(
            "[Orchestrator] Added {} revision step(s) to {}",
            positions.len(),
            workflow.id()
        );
        positions
            .into_iter()
            .filter_map(|p| workflow.step(p).cloned())
            .collect()
    }

    // ─── Run ────────────────────────────────────────────────────────────

    /// Drive a workflow to completion. A completed workflow is left untouched.
    pub async fn run_workflow(
        &self,
        workflow: &mut Workflow,
        sink: &dyn ProgressSink,
    ) -> Result<(), RelayError> {
        if workflow.state() == WorkflowState::Completed {
            tracing::debug!("[Orchestrator] Workflow {} already completed", workflow.id());
            return Ok(());
        }

        match self.drive(workflow, sink).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("[Orchestrator] Workflow {} failed: {}", workflow.id(), e);
                workflow.state = WorkflowState::Failed;
                Err(e)
            }
        }
    }

    async fn drive(&self, workflow: &mut Workflow, sink: &dyn ProgressSink) -> Result<(), RelayError> {
        workflow.state = WorkflowState::InProgress;

        if workflow.steps().is_empty() {
            sink.emit(WorkflowEvent::planning("Planning workflow..."));
            self.plan(workflow).await;
        }

        while workflow.iteration_count < workflow.max_iterations() {
            workflow.iteration_count += 1;
            workflow.state = WorkflowState::InProgress;
            tracing::info!(
                "[Orchestrator] {} iteration {}/{}",
                workflow.id(),
                workflow.iteration_count,
                workflow.max_iterations()
            );

            for position in workflow.pending_positions() {
                self.execute_step(workflow, position, sink).await?;
            }
            workflow.state = WorkflowState::AwaitingReview;

            if !self.needs_revision(workflow) {
                break;
            }
            // Keep iterating even when nothing was appended; the cap bounds the loop.
            let added = self.add_revision_steps(workflow);
            sink.emit(WorkflowEvent::revision(added.len()));
            workflow.state = WorkflowState::NeedsRevision;
        }

        if workflow.state == WorkflowState::NeedsRevision {
            tracing::warn!(
                "[Orchestrator] {} reached the iteration cap with revisions outstanding",
                workflow.id()
            );
        }

        let existing = workflow
            .latest_completed(AgentRole::Formatter)
            .and_then(|s| s.output())
            .map(|o| o.raw_response.clone());
        let final_output = match existing {
            Some(output) => output,
            None => {
                let position = workflow.push_step(AgentRole::Formatter, FORCED_FORMATTER_INSTRUCTION);
                self.execute_step(workflow, position, sink).await?;
                workflow
                    .step(position)
                    .and_then(|s| s.output())
                    .map(|o| o.raw_response.clone())
                    .unwrap_or_default()
            }
        };

        workflow.set_final_output(final_output)?;
        workflow.state = WorkflowState::Completed;
        sink.emit(WorkflowEvent::complete(format!(
            "Workflow completed after {} iteration(s)",
            workflow.iteration_count
        )));
        tracing::info!("[Orchestrator] Workflow {} completed", workflow.id());
        Ok(())
    }

    /// Run a registered workflow. It is removed from the registry.
    pub async fn run(
        &self,
        workflow_id: &str,
        max_iterations: Option<u32>,
        sink: &dyn ProgressSink,
    ) -> Result<WorkflowSummary, RelayError> {
        let mut workflow = self
            .workflows
            .write()
            .await
            .remove(workflow_id)
            .ok_or_else(|| RelayError::NotFound(format!("Workflow {} not found", workflow_id)))?;

        if let Some(n) = max_iterations {
            workflow.set_max_iterations(n);
        }
        self.run_workflow(&mut workflow, sink).await?;
        Ok(self.summary(&workflow))
    }

    /// Create and run a workflow for `user_request` in one call.
    pub async fn run_request(
        &self,
        user_request: impl Into<String>,
        max_iterations: Option<u32>,
        sink: &dyn ProgressSink,
    ) -> Result<WorkflowSummary, RelayError> {
        let mut workflow = self.new_workflow(user_request);
        if let Some(n) = max_iterations {
            workflow.set_max_iterations(n);
        }
        self.run_workflow(&mut workflow, sink).await?;
        Ok(self.summary(&workflow))
    }

    /// Run a workflow on a background task and stream its progress.
    ///
    /// The task is spawned on the stream's first poll, so the stream may be
    /// built outside a Tokio runtime but must be polled inside one. The
    /// stream ends with exactly one `result` event. Dropping it after the
    /// first poll does not stop the run.
    pub fn stream_workflow(
        &self,
        user_request: impl Into<String>,
        max_iterations: Option<u32>,
    ) -> WorkflowEventStream {
        let mut workflow = self.new_workflow(user_request);
        if let Some(n) = max_iterations {
            workflow.set_max_iterations(n);
        }
        let orchestrator = self.clone();

        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let (done_tx, done_rx) = oneshot::channel();

            tokio::spawn(async move {
                let sink = ChannelSink::new(tx);
                if let Err(e) = orchestrator.run_workflow(&mut workflow, &sink).await {
                    tracing::error!("[Orchestrator] Streamed workflow {} failed: {}", workflow.id(), e);
                }
                // Close the event channel before signalling completion.
                drop(sink);
                let _ = done_tx.send(WorkflowSummary::from_workflow(&workflow));
            });

            while let Some(event) = rx.recv().await {
                yield event;
            }
            if let Ok(summary) = done_rx.await {
                yield WorkflowEvent::Result { data: summary };
            }
        })
    }

    pub fn summary(&self, workflow: &Workflow) -> WorkflowSummary {
        WorkflowSummary::from_workflow(workflow)
    }
}

fn step_mut(workflow: &mut Workflow, position: u32) -> Result<&mut WorkflowStep, RelayError> {
    let id = workflow.id().to_string();
    workflow
        .step_mut(position)
        .ok_or_else(|| RelayError::Internal(format!("step {} vanished from workflow {}", position, id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_roles() {
        let plan = default_plan("Check SLA");
        let roles: Vec<AgentRole> = plan.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            roles,
            vec![
                AgentRole::Classifier,
                AgentRole::Research,
                AgentRole::Compliance,
                AgentRole::Reviewer,
                AgentRole::Formatter
            ]
        );
        assert_eq!(plan[0].1, "Classify and prioritize: Check SLA");
        assert_eq!(plan[4].1, "Create final response for user");
    }

    #[test]
    fn test_planned_steps_mapping() {
        let parsed = json!({
            "workflow_steps": [
                {"agent": "TRIAGE", "instruction": "Classify the incident"},
                {"agent": "LEGAL", "instruction": "Check contracts"},
                {"agent": "OUTPUT", "instruction": "  "},
                {"instruction": "no agent"}
            ]
        });
        let steps = planned_steps(&parsed, "req");
        assert_eq!(steps[0], (AgentRole::Classifier, "Classify the incident".to_string()));
        assert_eq!(steps[1].0, AgentRole::Research);
        assert_eq!(steps[2], (AgentRole::Formatter, "Create final response for user".to_string()));
        assert_eq!(steps[3].0, AgentRole::Research);

        assert!(planned_steps(&json!({"steps": []}), "req").is_empty());
    }

    #[test]
    fn test_step_context_excludes_later_and_pending() {
        let mut wf = Workflow::new("Check SLA", 5);
        let first = wf.push_step(AgentRole::Research, "a");
        let second = wf.push_step(AgentRole::Research, "b");
        let third = wf.push_step(AgentRole::Compliance, "c");
        for (pos, text) in [(first, "one"), (second, "two")] {
            let step = wf.step_mut(pos).unwrap();
            step.start(Map::new()).unwrap();
            step.complete(StepOutput { raw_response: text.into(), parsed: None })
                .unwrap();
        }

        let ctx = step_context(&wf, second);
        assert_eq!(ctx["research"], "one");
        assert_eq!(ctx["user_request"], "Check SLA");

        let ctx = step_context(&wf, third);
        assert_eq!(ctx["research"], "two");
        assert!(ctx.get("compliance").is_none());
    }
}
