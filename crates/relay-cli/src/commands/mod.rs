//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! relay-core orchestrator.

pub mod agents;
pub mod interactive;
pub mod render;
pub mod run;
pub mod scenarios;

use std::sync::Arc;

use relay_core::config::load_dotenv;
use relay_core::{AgentCatalog, RelayConfig, WorkflowOrchestrator};

/// Load the agent catalog, applying overrides from `agents_dir` if given.
pub fn load_catalog(agents_dir: Option<&str>) -> Result<AgentCatalog, String> {
    match agents_dir {
        Some(dir) => AgentCatalog::with_overrides_dir(dir).map_err(|e| e.to_string()),
        None => Ok(AgentCatalog::builtin()),
    }
}

/// Build an orchestrator from `.env` files and the process environment.
pub fn init_orchestrator(agents_dir: Option<&str>) -> Result<WorkflowOrchestrator, String> {
    load_dotenv();
    let config = RelayConfig::from_env().map_err(|e| e.to_string())?;
    let catalog = load_catalog(agents_dir)?;
    tracing::info!(
        "[CLI] Using {} provider (model: {}), knowledge search {}",
        config.generation.provider.as_str(),
        config.generation.model,
        if config.search.is_some() { "enabled" } else { "disabled" }
    );
    WorkflowOrchestrator::from_config(&config, Arc::new(catalog)).map_err(|e| e.to_string())
}

/// Pretty-print a serializable value as JSON to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize: {}", e))?;
    println!("{}", text);
    Ok(())
}

/// Cut `s` to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_load_catalog_missing_dir() {
        assert!(load_catalog(Some("/no/such/agents/dir")).is_err());
        assert_eq!(load_catalog(None).unwrap().all().len(), 6);
    }
}
