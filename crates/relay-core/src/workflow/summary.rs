use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{ConversationEntry, StepStatus, Workflow, WorkflowState};
use crate::agents::AgentRole;

/// Read-only projection of a workflow, suitable for display or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub user_request: String,
    pub state: WorkflowState,
    pub iterations: u32,
    pub steps_executed: usize,
    pub steps_failed: usize,
    /// Distinct roles that appear in the workflow, sorted.
    pub agents_involved: Vec<AgentRole>,
    pub final_output: Option<String>,
    pub conversation_history: Vec<ConversationEntry>,
}

impl WorkflowSummary {
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let count = |status: StepStatus| workflow.steps().iter().filter(|s| s.status() == status).count();
        let agents: BTreeSet<AgentRole> = workflow.steps().iter().map(|s| s.agent).collect();

        Self {
            workflow_id: workflow.id().to_string(),
            user_request: workflow.user_request().to_string(),
            state: workflow.state(),
            iterations: workflow.iteration_count(),
            steps_executed: count(StepStatus::Completed),
            steps_failed: count(StepStatus::Failed),
            agents_involved: agents.into_iter().collect(),
            final_output: workflow.final_output().map(str::to_string),
            conversation_history: workflow.conversation_log().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_fresh_workflow() {
        let mut wf = Workflow::new("Prepare QBR", 3);
        wf.push_step(AgentRole::Reviewer, "review");
        wf.push_step(AgentRole::Classifier, "triage");
        wf.push_step(AgentRole::Reviewer, "review again");

        let summary = WorkflowSummary::from_workflow(&wf);
        assert_eq!(summary.workflow_id, wf.id());
        assert_eq!(summary.state, WorkflowState::Pending);
        assert_eq!(summary.steps_executed, 0);
        assert_eq!(
            summary.agents_involved,
            vec![AgentRole::Classifier, AgentRole::Reviewer]
        );
        assert!(summary.final_output.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["state"], "pending");
        assert!(json.get("conversation_history").is_some());
    }
}
