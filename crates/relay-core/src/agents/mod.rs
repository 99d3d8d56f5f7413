//! Agent catalog: the fixed set of specialist agents and their capabilities.
//!
//! ```text
//!   planner ──► classifier ──► research ──► compliance ──► reviewer ──► formatter
//!                                 ▲              ▲             │
//!                                 └──────────────┴─────────────┘  (revision requests)
//! ```
//!
//! Roles form a closed set. Free-text role names coming back from the
//! planner or reviewer are mapped with [`AgentRole::parse`]; anything that
//! does not match is handled by the caller (the orchestrator substitutes
//! [`AgentRole::Research`]).

pub mod overrides;
pub mod prompts;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub use overrides::AgentOverride;

/// Role tag of a specialist agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Planner,
    Classifier,
    Research,
    Compliance,
    Reviewer,
    Formatter,
}

impl AgentRole {
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Planner,
        AgentRole::Classifier,
        AgentRole::Research,
        AgentRole::Compliance,
        AgentRole::Reviewer,
        AgentRole::Formatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Classifier => "classifier",
            Self::Research => "research",
            Self::Compliance => "compliance",
            Self::Reviewer => "reviewer",
            Self::Formatter => "formatter",
        }
    }

    /// Case-insensitive parse that also accepts the names the planner and
    /// reviewer prompts use (`TRIAGE`, `REVIEW`, `OUTPUT`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "planner" | "orchestrator" => Some(Self::Planner),
            "classifier" | "triage" => Some(Self::Classifier),
            "research" | "researcher" | "retriever" => Some(Self::Research),
            "compliance" | "checker" => Some(Self::Compliance),
            "reviewer" | "review" => Some(Self::Reviewer),
            "formatter" | "output" => Some(Self::Formatter),
            _ => None,
        }
    }

    /// Parse, falling back to [`AgentRole::Research`] for unknown names.
    pub fn parse_or_research(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!("[Catalog] Unknown agent '{}', substituting research", s);
            Self::Research
        })
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of one agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub role: AgentRole,
    pub name: String,
    pub system_prompt: String,
    pub can_query_knowledge: bool,
    pub can_delegate_to: BTreeSet<AgentRole>,
}

impl AgentDefinition {
    fn new(
        role: AgentRole,
        name: &str,
        system_prompt: &str,
        can_query_knowledge: bool,
        can_delegate_to: &[AgentRole],
    ) -> Self {
        Self {
            role,
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
            can_query_knowledge,
            can_delegate_to: can_delegate_to.iter().copied().collect(),
        }
    }

    fn builtin(role: AgentRole) -> Self {
        use AgentRole::*;
        match role {
            Planner => Self::new(
                Planner,
                "Planner",
                prompts::PLANNER_SYSTEM_PROMPT,
                false,
                &[Classifier, Research, Compliance, Reviewer, Formatter],
            ),
            Classifier => Self::new(
                Classifier,
                "Triage Agent",
                prompts::CLASSIFIER_SYSTEM_PROMPT,
                true,
                &[],
            ),
            Research => Self::new(
                Research,
                "Research Agent",
                prompts::RESEARCH_SYSTEM_PROMPT,
                true,
                &[],
            ),
            Compliance => Self::new(
                Compliance,
                "Compliance Agent",
                prompts::COMPLIANCE_SYSTEM_PROMPT,
                true,
                &[],
            ),
            Reviewer => Self::new(
                Reviewer,
                "Review Agent",
                prompts::REVIEWER_SYSTEM_PROMPT,
                false,
                &[Research, Compliance],
            ),
            Formatter => Self::new(
                Formatter,
                "Output Agent",
                prompts::FORMATTER_SYSTEM_PROMPT,
                false,
                &[],
            ),
        }
    }
}

/// Process-wide, read-only registry of agent definitions.
///
/// Built once at startup and shared behind an `Arc`; lookups need no locking.
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    // Indexed by `AgentRole as usize`, in `AgentRole::ALL` order.
    definitions: Vec<AgentDefinition>,
}

impl Default for AgentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AgentCatalog {
    /// Catalog with the built-in definitions for every role.
    pub fn builtin() -> Self {
        Self {
            definitions: AgentRole::ALL.iter().map(|r| AgentDefinition::builtin(*r)).collect(),
        }
    }

    /// Built-in catalog with overrides from `dir` applied.
    pub fn with_overrides_dir(dir: &str) -> Result<Self, RelayError> {
        let mut catalog = Self::builtin();
        let loaded = overrides::load_overrides(dir)?;
        for ov in &loaded {
            catalog.apply(ov)?;
        }
        tracing::info!("[Catalog] Applied {} override(s) from '{}'", loaded.len(), dir);
        Ok(catalog)
    }

    pub fn get(&self, role: AgentRole) -> &AgentDefinition {
        &self.definitions[role as usize]
    }

    /// Look up a definition by its role tag.
    pub fn lookup(&self, tag: &str) -> Result<&AgentDefinition, RelayError> {
        AgentRole::parse(tag)
            .map(|role| self.get(role))
            .ok_or_else(|| RelayError::Configuration(format!("Unknown agent role '{}'", tag)))
    }

    pub fn all(&self) -> &[AgentDefinition] {
        &self.definitions
    }

    /// Apply a single override to the catalog.
    pub fn apply(&mut self, ov: &AgentOverride) -> Result<(), RelayError> {
        let role = AgentRole::parse(&ov.role).ok_or_else(|| {
            RelayError::Configuration(format!("Override names unknown agent role '{}'", ov.role))
        })?;

        if role == AgentRole::Formatter && ov.can_query_knowledge == Some(true) {
            return Err(RelayError::Configuration(
                "The formatter agent cannot query the knowledge base".to_string(),
            ));
        }

        let def = &mut self.definitions[role as usize];
        if let Some(ref name) = ov.name {
            def.name = name.clone();
        }
        if let Some(ref prompt) = ov.system_prompt {
            def.system_prompt = prompt.clone();
        }
        if let Some(flag) = ov.can_query_knowledge {
            def.can_query_knowledge = flag;
        }
        tracing::debug!("[Catalog] Override applied for {}", role);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_role() {
        let catalog = AgentCatalog::builtin();
        assert_eq!(catalog.all().len(), AgentRole::ALL.len());
        for role in AgentRole::ALL {
            assert_eq!(catalog.get(role).role, role);
            assert!(!catalog.get(role).system_prompt.is_empty());
        }
    }

    #[test]
    fn test_capabilities() {
        let catalog = AgentCatalog::builtin();
        assert!(catalog.get(AgentRole::Research).can_query_knowledge);
        assert!(catalog.get(AgentRole::Classifier).can_query_knowledge);
        assert!(!catalog.get(AgentRole::Formatter).can_query_knowledge);
        assert!(!catalog.get(AgentRole::Reviewer).can_query_knowledge);
        assert!(catalog
            .get(AgentRole::Reviewer)
            .can_delegate_to
            .contains(&AgentRole::Research));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(AgentRole::parse("TRIAGE"), Some(AgentRole::Classifier));
        assert_eq!(AgentRole::parse("Review"), Some(AgentRole::Reviewer));
        assert_eq!(AgentRole::parse("OUTPUT"), Some(AgentRole::Formatter));
        assert_eq!(AgentRole::parse(" compliance "), Some(AgentRole::Compliance));
        assert_eq!(AgentRole::parse("LEGAL"), None);
        assert_eq!(AgentRole::parse_or_research("LEGAL"), AgentRole::Research);
    }

    #[test]
    fn test_lookup_unknown_is_configuration_error() {
        let catalog = AgentCatalog::builtin();
        assert_eq!(catalog.lookup("output").unwrap().role, AgentRole::Formatter);
        let err = catalog.lookup("janitor").unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }

    #[test]
    fn test_formatter_cannot_gain_knowledge_access() {
        let mut catalog = AgentCatalog::builtin();
        let ov = AgentOverride {
            role: "formatter".to_string(),
            name: None,
            system_prompt: None,
            can_query_knowledge: Some(true),
        };
        assert!(catalog.apply(&ov).is_err());
        assert!(!catalog.get(AgentRole::Formatter).can_query_knowledge);
    }

    #[test]
    fn test_role_serializes_as_tag() {
        let json = serde_json::to_string(&AgentRole::Compliance).unwrap();
        assert_eq!(json, "\"compliance\"");
    }
}
