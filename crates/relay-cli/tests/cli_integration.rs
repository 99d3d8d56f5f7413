//! Integration tests for the relay-cli commands.
//!
//! These exercise the same code paths as the binary without touching the
//! network: catalog loading, table rendering and summary formatting.

use relay_cli::commands::{agents, load_catalog, render, scenarios};
use relay_core::workflow::ConversationEntry;
use relay_core::{AgentRole, WorkflowState, WorkflowSummary};

#[test]
fn test_agents_table_lists_every_role() {
    let catalog = load_catalog(None).unwrap();
    let table = agents::table(&catalog);
    for role in ["planner", "classifier", "research", "compliance", "reviewer", "formatter"] {
        assert!(table.contains(role), "missing {} in\n{}", role, table);
    }
    assert!(table.contains("research, compliance"));
}

#[test]
fn test_agents_table_with_override_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("triage.md"),
        "---\nrole: triage\nname: Incident Desk\n---\nClassify incoming incidents.",
    )
    .unwrap();

    let catalog = load_catalog(Some(dir.path().to_str().unwrap())).unwrap();
    let table = agents::table(&catalog);
    assert!(table.contains("Incident Desk"));
}

#[test]
fn test_scenarios_table() {
    let table = scenarios::table();
    assert!(table.contains("customer_qbr"));
    assert!(table.contains("Revenue & Product Strategy"));
    assert_eq!(table.lines().count(), 2 + 6);
}

#[test]
fn test_summary_text_truncates_history() {
    let summary = WorkflowSummary {
        workflow_id: "wf_1a2b3c4d".to_string(),
        user_request: "Check SLA exposure".to_string(),
        state: WorkflowState::Completed,
        iterations: 2,
        steps_executed: 6,
        steps_failed: 1,
        agents_involved: vec![AgentRole::Research, AgentRole::Formatter],
        final_output: Some("# Answer\nAll SLAs are at risk.".to_string()),
        conversation_history: vec![ConversationEntry {
            position: 1,
            agent: AgentRole::Research,
            instruction: "Research relevant data for: Check SLA exposure".to_string(),
            success: true,
            result: serde_json::Value::String("y".repeat(500)),
            timestamp: chrono::Utc::now(),
        }],
    };

    let text = render::summary_text(&summary);
    assert!(text.contains("Workflow ID : wf_1a2b3c4d"));
    assert!(text.contains("State       : completed"));
    assert!(text.contains("6 completed, 1 failed"));
    assert!(text.contains("Agents      : research, formatter"));
    assert!(text.contains("All SLAs are at risk."));
    assert!(text.contains(&format!("{}...", "y".repeat(300))));
    assert!(!text.contains(&"y".repeat(301)));
}

#[test]
fn test_summary_text_without_output() {
    let summary = WorkflowSummary {
        workflow_id: "wf_00000000".to_string(),
        user_request: "x".to_string(),
        state: WorkflowState::Completed,
        iterations: 1,
        steps_executed: 0,
        steps_failed: 5,
        agents_involved: vec![],
        final_output: Some(String::new()),
        conversation_history: vec![],
    };
    let text = render::summary_text(&summary);
    assert!(text.contains("(no output produced)"));
    assert!(!text.contains("CONVERSATION HISTORY"));
}
