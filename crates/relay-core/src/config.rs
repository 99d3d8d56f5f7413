//! Runtime configuration, read from the process environment.
//!
//! `.env.local` and `.env` in the working directory are loaded first (see
//! [`load_dotenv`]); variables already present in the environment win.

use std::path::Path;
use std::sync::Arc;

use crate::backend::{
    ChatCompletionClient, GenerationProvider, KnowledgeSearch, SearchServiceClient, TextGeneration,
};
use crate::error::RelayError;

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_SEARCH_TOP_K: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SEARCH_INDEX: &str = "foundryiq-documents";
pub const SEARCH_API_VERSION: &str = "2023-11-01";

const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4.1";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Connection settings for the text-generation backend.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub provider: GenerationProvider,
    pub base_url: String,
    pub api_key: String,
    /// Model id, or the deployment name for Azure.
    pub model: String,
    pub api_version: Option<String>,
    pub timeout_secs: u64,
}

/// Connection settings for the knowledge search index.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub endpoint: String,
    pub api_key: String,
    pub index: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub generation: GenerationSettings,
    /// `None` disables knowledge enrichment.
    pub search: Option<SearchSettings>,
    pub max_iterations: u32,
    pub temperature: f64,
    pub max_tokens: u32,
    pub search_top_k: usize,
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs = parse_var(&get, "RELAY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let provider_name = get("RELAY_PROVIDER").unwrap_or_else(|| "azure".to_string());
        let provider = GenerationProvider::from_str(&provider_name).ok_or_else(|| {
            RelayError::Configuration(format!(
                "Unknown RELAY_PROVIDER '{}' (expected azure, openai or anthropic)",
                provider_name
            ))
        })?;

        let require = |key: &str| {
            get(key).ok_or_else(|| {
                RelayError::Configuration(format!(
                    "{} must be set for provider '{}'",
                    key,
                    provider.as_str()
                ))
            })
        };

        let generation = match provider {
            GenerationProvider::Azure => GenerationSettings {
                provider,
                base_url: require("AZURE_OPENAI_ENDPOINT")?,
                api_key: require("AZURE_OPENAI_API_KEY")?,
                model: get("AZURE_OPENAI_DEPLOYMENT")
                    .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string()),
                api_version: Some(
                    get("AZURE_OPENAI_API_VERSION")
                        .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
                ),
                timeout_secs,
            },
            GenerationProvider::OpenAi => GenerationSettings {
                provider,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                api_key: require("OPENAI_API_KEY")?,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_version: None,
                timeout_secs,
            },
            GenerationProvider::Anthropic => GenerationSettings {
                provider,
                base_url: get("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
                api_key: require("ANTHROPIC_API_KEY")?,
                model: get("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                api_version: None,
                timeout_secs,
            },
        };

        let search = match (get("AZURE_SEARCH_ENDPOINT"), get("AZURE_SEARCH_API_KEY")) {
            (Some(endpoint), Some(api_key)) => Some(SearchSettings {
                endpoint,
                api_key,
                index: get("AZURE_SEARCH_INDEX").unwrap_or_else(|| DEFAULT_SEARCH_INDEX.to_string()),
                api_version: SEARCH_API_VERSION.to_string(),
                timeout_secs,
            }),
            _ => {
                tracing::warn!(
                    "[Config] AZURE_SEARCH_ENDPOINT/AZURE_SEARCH_API_KEY not set, knowledge search disabled"
                );
                None
            }
        };

        let max_iterations: u32 = parse_var(&get, "RELAY_MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?;

        Ok(Self {
            generation,
            search,
            max_iterations: max_iterations.max(1),
            temperature: parse_var(&get, "RELAY_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parse_var(&get, "RELAY_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            search_top_k: parse_var(&get, "RELAY_SEARCH_TOP_K", DEFAULT_SEARCH_TOP_K)?,
        })
    }

    pub fn generation_client(&self) -> Result<Arc<dyn TextGeneration>, RelayError> {
        Ok(Arc::new(ChatCompletionClient::new(self.generation.clone())?))
    }

    pub fn search_client(&self) -> Result<Option<Arc<dyn KnowledgeSearch>>, RelayError> {
        match self.search {
            Some(ref settings) => Ok(Some(Arc::new(SearchServiceClient::new(settings.clone())?))),
            None => Ok(None),
        }
    }
}

fn parse_var<G, T>(get: &G, key: &str, default: T) -> Result<T, RelayError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| RelayError::Configuration(format!("{} has an invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

/// Load `.env.local` then `.env` from the working directory.
///
/// Only sets variables that are not already present. Returns the files read.
pub fn load_dotenv() -> Vec<String> {
    let mut loaded = Vec::new();
    for filename in [".env.local", ".env"] {
        let path = Path::new(filename);
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        for (key, value) in parse_dotenv(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(&key, &value);
            }
        }
        tracing::info!("[Config] Loaded environment from '{}'", filename);
        loaded.push(filename.to_string());
    }
    loaded
}

/// Parse `KEY=VALUE` lines; comments and blank lines are skipped and
/// surrounding quotes stripped.
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            let value = if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                &value[1..value.len() - 1]
            } else {
                value
            };
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}
