//! Agent Executor: runs a single agent against the backends.
//!
//! For one call the executor:
//! 1. Looks up the agent definition in the catalog
//! 2. Optionally enriches the context with knowledge search hits
//! 3. Assembles the context block and calls the generation backend
//! 4. Normalizes the reply (raw text plus best-effort JSON parse)
//!
//! It holds no per-workflow state; one executor serves every workflow.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::agents::{AgentCatalog, AgentRole};
use crate::backend::{GenerationRequest, KnowledgeSearch, TextGeneration, SEARCH_SELECT_FIELDS};
use crate::config::{
    RelayConfig, DEFAULT_MAX_TOKENS, DEFAULT_SEARCH_TOP_K, DEFAULT_TEMPERATURE,
};
use crate::error::RelayError;

/// Knowledge hit content is cut to this many characters.
pub const MAX_HIT_CONTENT_CHARS: usize = 1000;

/// Sampling parameters shared by every generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub search_top_k: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            search_top_k: DEFAULT_SEARCH_TOP_K,
        }
    }
}

/// Result of executing one agent.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub agent: AgentRole,
    pub raw_response: Option<String>,
    pub parsed_response: Option<Value>,
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failed(agent: AgentRole, error: String) -> Self {
        Self {
            agent,
            raw_response: None,
            parsed_response: None,
            success: false,
            error: Some(error),
        }
    }
}

pub struct AgentExecutor {
    catalog: Arc<AgentCatalog>,
    generator: Arc<dyn TextGeneration>,
    search: Option<Arc<dyn KnowledgeSearch>>,
    params: GenerationParams,
}

impl AgentExecutor {
    pub fn new(
        catalog: Arc<AgentCatalog>,
        generator: Arc<dyn TextGeneration>,
        search: Option<Arc<dyn KnowledgeSearch>>,
        params: GenerationParams,
    ) -> Self {
        Self {
            catalog,
            generator,
            search,
            params,
        }
    }

    /// Build an executor with HTTP backends from configuration.
    pub fn from_config(config: &RelayConfig, catalog: Arc<AgentCatalog>) -> Result<Self, RelayError> {
        let params = GenerationParams {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            search_top_k: config.search_top_k,
        };
        Ok(Self::new(
            catalog,
            config.generation_client()?,
            config.search_client()?,
            params,
        ))
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Run `role` on `instruction` with the given context.
    ///
    /// Backend failures come back as `success == false`, never as `Err`.
    pub async fn execute(
        &self,
        role: AgentRole,
        instruction: &str,
        context: &Map<String, Value>,
        knowledge_query: Option<&str>,
    ) -> ExecutionResult {
        if instruction.trim().is_empty() {
            return ExecutionResult::failed(role, "instruction must not be empty".to_string());
        }

        let definition = self.catalog.get(role);

        let mut hits = Vec::new();
        if definition.can_query_knowledge {
            if let (Some(query), Some(search)) = (knowledge_query, self.search.as_ref()) {
                match search
                    .search(query, self.params.search_top_k, &SEARCH_SELECT_FIELDS)
                    .await
                {
                    Ok(found) => {
                        tracing::debug!("[Executor] {} received {} knowledge hit(s)", role, found.len());
                        hits = found
                            .into_iter()
                            .map(|hit| {
                                json!({
                                    "title": hit.title.unwrap_or_else(|| hit.file_name.clone()),
                                    "file_name": hit.file_name,
                                    "content": truncate_chars(&hit.content, MAX_HIT_CONTENT_CHARS),
                                    "source_url": hit.source_url,
                                })
                            })
                            .collect();
                    }
                    Err(e) => {
                        tracing::warn!("[Executor] Knowledge search failed for {}: {}", role, e);
                        return ExecutionResult::failed(role, e.to_string());
                    }
                }
            }
        }

        let request = GenerationRequest {
            system_prompt: definition.system_prompt.clone(),
            context: build_context_block(context, &hits),
            instruction: instruction.to_string(),
            temperature: Some(self.params.temperature),
            max_tokens: self.params.max_tokens,
        };

        tracing::info!("[Executor] Calling {} agent", role);
        match self.generator.generate(&request).await {
            Ok(raw) => {
                let parsed = parse_response(&raw);
                if parsed.is_none() {
                    tracing::debug!("[Executor] {} reply is not JSON, keeping raw text", role);
                }
                ExecutionResult {
                    agent: role,
                    raw_response: Some(raw),
                    parsed_response: parsed,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("[Executor] {} agent failed: {}", role, e);
                ExecutionResult::failed(role, e.to_string())
            }
        }
    }
}

/// Assemble the context block sent alongside the instruction.
///
/// Returns `None` when there is neither prior output nor knowledge.
pub fn build_context_block(context: &Map<String, Value>, hits: &[Value]) -> Option<String> {
    let mut sections = Vec::new();
    if !context.is_empty() {
        sections.push(format!(
            "Previous agent outputs:\n{}",
            pretty(&Value::Object(context.clone()))
        ));
    }
    if !hits.is_empty() {
        sections.push(format!(
            "Knowledge Base Results:\n{}",
            pretty(&Value::Array(hits.to_vec()))
        ));
    }
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Best-effort JSON parse of a model reply.
///
/// Surrounding whitespace and a markdown code fence are stripped first.
pub fn parse_response(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop the info string (e.g. "json") on the opening fence line.
            let rest = match rest.split_once('\n') {
                Some((_, body)) => body,
                None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
            };
            let rest = rest.trim();
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    };
    serde_json::from_str(body).ok()
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
