//! Workflow engine: plan, execute, review, revise, finalize.
//!
//! # Architecture
//!
//! ```text
//! user request ──► WorkflowOrchestrator ──► Workflow (steps, log, state)
//!                        │
//!                        ▼
//!                  AgentExecutor ──► AgentCatalog (instructions)
//!                        │
//!                        ├──► KnowledgeSearch (search index)
//!                        └──► TextGeneration  (chat completions)
//! ```

pub mod executor;
pub mod model;
pub mod orchestrator;
pub mod summary;

pub use executor::{AgentExecutor, ExecutionResult, GenerationParams};
pub use model::{ConversationEntry, StepOutput, StepStatus, Workflow, WorkflowState, WorkflowStep};
pub use orchestrator::{PlanSource, WorkflowEventStream, WorkflowOrchestrator};
pub use summary::WorkflowSummary;
