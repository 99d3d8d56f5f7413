//! Relay Core: multi-agent business analysis orchestration.
//!
//! A fixed set of specialist agents (planner, classifier, research,
//! compliance, reviewer, formatter) is coordinated to answer a business
//! question: the planner proposes steps, each step runs against a
//! knowledge-search backend and a text-generation backend, the reviewer
//! decides whether more work is needed, and the formatter writes the answer.
//!
//! The crate has no HTTP framework dependency; the backends are traits
//! with `reqwest` clients provided for production use. Frontends:
//!
//! - `relay-cli` (the `relay` binary)
//! - anything that can hold an `Arc<WorkflowOrchestrator>`

pub mod agents;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod scenarios;
pub mod workflow;

// Convenience re-exports
pub use agents::{AgentCatalog, AgentDefinition, AgentRole};
pub use backend::{GenerationRequest, KnowledgeSearch, SearchHit, TextGeneration};
pub use config::RelayConfig;
pub use error::RelayError;
pub use events::{NoopSink, ProgressSink, WorkflowEvent};
pub use workflow::{AgentExecutor, Workflow, WorkflowOrchestrator, WorkflowState, WorkflowSummary};
