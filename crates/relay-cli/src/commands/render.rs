//! Terminal rendering for workflow progress and results.

use console::style;
use relay_core::{WorkflowEvent, WorkflowSummary};

use super::truncate;

/// Responses in the conversation history are cut to this many characters.
pub const HISTORY_PREVIEW_CHARS: usize = 300;

const RULE: &str = "======================================================================";

pub fn banner() -> String {
    format!(
        "\n{}\n  Relay Multi-Agent Workflow System\n  Planner · Triage · Research · Compliance · Review · Output\n{}\n",
        RULE, RULE
    )
}

/// One progress line for `event`. The final `result` event has none.
pub fn event_line(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::Planning { message, .. } => Some(format!("🎯 {}", message)),
        WorkflowEvent::StepStarted { message, .. } => Some(format!("⚙️  {}", message)),
        WorkflowEvent::StepFinished { success, message, .. } => {
            let mark = if *success {
                style("✓").green().to_string()
            } else {
                style("✗").red().to_string()
            };
            Some(format!("   {} {}", mark, message))
        }
        WorkflowEvent::Revision { message, .. } => Some(format!("🔄 {}", message)),
        WorkflowEvent::Complete { message, .. } => Some(format!("✅ {}", message)),
        WorkflowEvent::Result { .. } => None,
    }
}

/// Summary block, final output, and truncated conversation history.
pub fn summary_text(summary: &WorkflowSummary) -> String {
    let agents: Vec<&str> = summary.agents_involved.iter().map(|a| a.as_str()).collect();
    let mut out = String::new();

    out.push_str(&format!("\n{}\n  WORKFLOW SUMMARY\n{}\n", RULE, RULE));
    out.push_str(&format!("  Workflow ID : {}\n", summary.workflow_id));
    out.push_str(&format!("  State       : {}\n", summary.state));
    out.push_str(&format!("  Iterations  : {}\n", summary.iterations));
    out.push_str(&format!(
        "  Steps       : {} completed, {} failed\n",
        summary.steps_executed, summary.steps_failed
    ));
    out.push_str(&format!("  Agents      : {}\n", agents.join(", ")));

    out.push_str(&format!("\n{}\n  FINAL OUTPUT\n{}\n\n", RULE, RULE));
    match summary.final_output.as_deref() {
        Some(text) if !text.is_empty() => out.push_str(text),
        _ => out.push_str("(no output produced)"),
    }
    out.push('\n');

    if !summary.conversation_history.is_empty() {
        out.push_str(&format!("\n{}\n  CONVERSATION HISTORY\n{}\n", RULE, RULE));
        for entry in &summary.conversation_history {
            let result = match entry.result.as_str() {
                Some(text) => text.to_string(),
                None => entry.result.to_string(),
            };
            out.push_str(&format!(
                "\n[{}] {}. {}\n  {}\n",
                entry.agent,
                entry.position,
                truncate(&entry.instruction, 100),
                truncate(&result, HISTORY_PREVIEW_CHARS)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::AgentRole;

    #[test]
    fn test_event_lines() {
        let line = event_line(&WorkflowEvent::planning("Planning workflow...")).unwrap();
        assert_eq!(line, "🎯 Planning workflow...");

        let line = event_line(&WorkflowEvent::step_started(2, AgentRole::Research, "Find SLA")).unwrap();
        assert!(line.contains("[research] Find SLA..."));

        let line = event_line(&WorkflowEvent::revision(3)).unwrap();
        assert!(line.starts_with("🔄"));
    }
}
