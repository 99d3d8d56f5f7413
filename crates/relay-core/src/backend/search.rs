//! Knowledge search client: queries a search index over its REST API.
//!
//! POST {endpoint}/indexes/{index}/docs/search?api-version={version}
//! Headers:
//!   api-key: {api_key}
//!   content-type: application/json

use serde_json::{json, Value};

use super::{KnowledgeSearch, SearchHit};
use crate::config::SearchSettings;
use crate::error::RelayError;

pub struct SearchServiceClient {
    client: reqwest::Client,
    settings: SearchSettings,
}

impl SearchServiceClient {
    pub fn new(settings: SearchSettings) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RelayError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.index,
            self.settings.api_version
        )
    }
}

#[async_trait::async_trait]
impl KnowledgeSearch for SearchServiceClient {
    async fn search(
        &self,
        query: &str,
        top: usize,
        select: &[&str],
    ) -> Result<Vec<SearchHit>, RelayError> {
        let url = self.search_url();
        let body = json!({
            "search": query,
            "top": top,
            "select": select.join(","),
        });

        tracing::debug!("[SearchClient] Searching '{}' (top {})", self.settings.index, top);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.settings.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Backend(format!("Failed to read search response: {}", e)))?;

        if !status.is_success() {
            return Err(RelayError::Backend(format!(
                "Search service returned {}: {}",
                status, text
            )));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| RelayError::Backend(format!("Failed to parse search response: {}", e)))?;

        Ok(parse_hits(&json))
    }
}

/// Map the index's `value` array to hits, skipping documents without a file name.
fn parse_hits(json: &Value) -> Vec<SearchHit> {
    json.get("value")
        .and_then(|v| v.as_array())
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| {
                    let file_name = doc.get("file_name").and_then(|v| v.as_str())?;
                    Some(SearchHit {
                        file_name: file_name.to_string(),
                        content: doc
                            .get("content")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        title: doc.get("title").and_then(|v| v.as_str()).map(String::from),
                        source_url: doc
                            .get("source_url")
                            .and_then(|v| v.as_str())
                            .map(String::from),
                        score: doc.get("@search.score").and_then(|v| v.as_f64()),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
