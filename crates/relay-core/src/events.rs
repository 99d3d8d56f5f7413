//! Progress events emitted while a workflow runs.
//!
//! Events are advisory: sinks observe them, nothing in the orchestrator
//! reads them back. A sink that fails (closed channel, dropped receiver)
//! is silently ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::agents::AgentRole;
use crate::workflow::WorkflowSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Planning {
        message: String,
        timestamp: DateTime<Utc>,
    },
    StepStarted {
        position: u32,
        agent: AgentRole,
        message: String,
        timestamp: DateTime<Utc>,
    },
    StepFinished {
        position: u32,
        agent: AgentRole,
        success: bool,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Revision {
        added: usize,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Complete {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Result {
        data: WorkflowSummary,
    },
}

impl WorkflowEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning { .. } => "planning",
            Self::StepStarted { .. } => "step_started",
            Self::StepFinished { .. } => "step_finished",
            Self::Revision { .. } => "revision",
            Self::Complete { .. } => "complete",
            Self::Result { .. } => "result",
        }
    }

    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// `[agent] <instruction, first 100 chars>...`
    pub fn step_started(position: u32, agent: AgentRole, instruction: &str) -> Self {
        let preview: String = instruction.chars().take(100).collect();
        Self::StepStarted {
            position,
            agent,
            message: format!("[{}] {}...", agent, preview),
            timestamp: Utc::now(),
        }
    }

    pub fn step_finished(position: u32, agent: AgentRole, success: bool, error: Option<&str>) -> Self {
        let message = match (success, error) {
            (true, _) => format!("[{}] completed", agent),
            (false, Some(e)) => format!("[{}] failed: {}", agent, e),
            (false, None) => format!("[{}] failed", agent),
        };
        Self::StepFinished {
            position,
            agent,
            success,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn revision(added: usize) -> Self {
        Self::Revision {
            added,
            message: format!("Revision needed, added {} step(s)", added),
            timestamp: Utc::now(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::Complete {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives progress events from a running workflow.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

/// Discards every event.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: WorkflowEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(WorkflowEvent) + Send + Sync,
{
    fn emit(&self, event: WorkflowEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WorkflowEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: WorkflowEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}
