//! Agent overrides: replace built-in agent instructions from YAML files.
//!
//! Each file targets one role:
//!
//! ```yaml
//! role: "research"
//! name: "Research Analyst"
//! can_query_knowledge: true
//! system_prompt: |
//!   ## Research
//!   Gather evidence from the knowledge base results you are given.
//!   ...
//! ```
//!
//! Markdown files with YAML frontmatter are accepted as well; the body
//! becomes the system prompt.

use std::path::Path;

use serde::Deserialize;

use crate::error::RelayError;

/// One override file.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentOverride {
    /// Role tag or alias (e.g. "research", "TRIAGE")
    pub role: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub can_query_knowledge: Option<bool>,
}

impl AgentOverride {
    pub fn from_yaml(yaml: &str) -> Result<Self, RelayError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| RelayError::Configuration(format!("Failed to parse override YAML: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, RelayError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!(
                "Failed to read override file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a markdown file whose frontmatter carries the override fields.
    pub fn from_markdown(content: &str, origin: &str) -> Result<Self, RelayError> {
        let parts: Vec<&str> = content.splitn(3, "---").collect();
        if parts.len() < 3 {
            return Err(RelayError::Configuration(format!(
                "Invalid override markdown '{}': missing YAML frontmatter",
                origin
            )));
        }

        let mut ov = Self::from_yaml(parts[1].trim())?;
        let body = parts[2].trim();
        if !body.is_empty() {
            ov.system_prompt = Some(body.to_string());
        }
        Ok(ov)
    }
}

/// Load every override in `dir`. Files with other extensions are ignored.
pub fn load_overrides(dir: &str) -> Result<Vec<AgentOverride>, RelayError> {
    let dir_path = Path::new(dir);
    if !dir_path.is_dir() {
        return Err(RelayError::Configuration(format!(
            "Agent override directory '{}' does not exist",
            dir
        )));
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir_path)
        .map_err(|e| RelayError::Configuration(format!("Failed to read directory '{}': {}", dir, e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    // Deterministic application order when two files target the same role.
    entries.sort();

    let mut loaded = Vec::new();
    for path in entries {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let ov = match ext {
            "yaml" | "yml" => AgentOverride::from_file(&path)?,
            "md" => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    RelayError::Configuration(format!(
                        "Failed to read override markdown '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                AgentOverride::from_markdown(&content, &path.display().to_string())?
            }
            _ => continue,
        };
        tracing::info!("[Catalog] Loaded override for '{}' from {}", ov.role, path.display());
        loaded.push(ov);
    }

    Ok(loaded)
}
