//! External collaborators: knowledge search and text generation.
//!
//! The orchestrator only sees the two traits below. Concrete HTTP clients
//! live in [`search`] and [`generation`]; tests inject fakes.
//!
//! ```text
//!   AgentExecutor ──► dyn KnowledgeSearch ──► SearchServiceClient (index REST API)
//!         │
//!         └────────► dyn TextGeneration  ──► ChatCompletionClient (azure / openai / anthropic)
//! ```

pub mod generation;
pub mod search;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub use generation::{ChatCompletionClient, GenerationProvider};
pub use search::SearchServiceClient;

/// Fields requested from the search index.
pub const SEARCH_SELECT_FIELDS: [&str; 4] = ["file_name", "content", "title", "source_url"];

/// A single document returned by the knowledge search service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub file_name: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// One generation call: system instruction, optional context block, user task.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub context: Option<String>,
    pub instruction: String,
    pub temperature: Option<f64>,
    pub max_tokens: u32,
}

#[async_trait::async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top: usize,
        select: &[&str],
    ) -> Result<Vec<SearchHit>, RelayError>;
}

#[async_trait::async_trait]
pub trait TextGeneration: Send + Sync {
    /// Returns the text of the model's reply.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, RelayError>;
}
