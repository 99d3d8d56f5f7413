//! Chat completion client: calls the text-generation backend over HTTP.
//!
//! Three wire formats are supported:
//!
//! - `azure`: Azure OpenAI deployments (`api-key` header, `api-version` query)
//! - `openai`: any OpenAI-compatible `/chat/completions` endpoint (bearer auth)
//! - `anthropic`: the Anthropic Messages API (`/v1/messages`)
//!
//! The client is stateless apart from its connection pool and is shared by
//! every workflow in the process.

use serde_json::{json, Value};

use super::{GenerationRequest, TextGeneration};
use crate::config::GenerationSettings;
use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    Azure,
    OpenAi,
    Anthropic,
}

impl GenerationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "azure" | "azure-openai" => Some(Self::Azure),
            "openai" | "openai-compatible" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// HTTP client for the text-generation backend.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    settings: GenerationSettings,
}

impl ChatCompletionClient {
    pub fn new(settings: GenerationSettings) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RelayError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    fn endpoint_url(&self) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        match self.settings.provider {
            GenerationProvider::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base,
                self.settings.model,
                self.settings.api_version.as_deref().unwrap_or("2024-02-15-preview")
            ),
            GenerationProvider::OpenAi => format!("{}/chat/completions", base),
            GenerationProvider::Anthropic => format!("{}/v1/messages", base),
        }
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        match self.settings.provider {
            GenerationProvider::Azure | GenerationProvider::OpenAi => {
                let mut body = json!({
                    "messages": chat_messages(request),
                    "max_tokens": request.max_tokens,
                });
                // Azure routes by deployment in the URL; others need the model id.
                if self.settings.provider == GenerationProvider::OpenAi {
                    body["model"] = Value::String(self.settings.model.clone());
                }
                if let Some(temp) = request.temperature {
                    body["temperature"] = json!(temp);
                }
                body
            }
            GenerationProvider::Anthropic => {
                let mut system = request.system_prompt.clone();
                if let Some(ref ctx) = request.context {
                    system.push_str("\n\n");
                    system.push_str(ctx);
                }
                let mut body = json!({
                    "model": self.settings.model,
                    "max_tokens": request.max_tokens,
                    "system": system,
                    "messages": [
                        { "role": "user", "content": request.instruction }
                    ]
                });
                if let Some(temp) = request.temperature {
                    body["temperature"] = json!(temp);
                }
                body
            }
        }
    }
}

#[async_trait::async_trait]
impl TextGeneration for ChatCompletionClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, RelayError> {
        let url = self.endpoint_url();
        let body = self.request_body(request);

        tracing::debug!(
            "[ChatClient] POST {} (provider: {}, model: {})",
            url,
            self.settings.provider.as_str(),
            self.settings.model
        );

        let builder = self.client.post(&url).header("content-type", "application/json");
        let builder = match self.settings.provider {
            GenerationProvider::Azure => builder.header("api-key", &self.settings.api_key),
            GenerationProvider::OpenAi => {
                builder.header("Authorization", format!("Bearer {}", self.settings.api_key))
            }
            GenerationProvider::Anthropic => builder
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", "2023-06-01"),
        };

        let response = builder.json(&body).send().await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Backend(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(RelayError::Backend(format!("API returned {}: {}", status, text)));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| RelayError::Backend(format!("Failed to parse response JSON: {}", e)))?;

        let content = match self.settings.provider {
            GenerationProvider::Anthropic => extract_anthropic_text(&json),
            _ => extract_chat_completion_text(&json),
        };

        content.ok_or_else(|| RelayError::Backend("Response contained no text content".to_string()))
    }
}

/// OpenAI-style message list: system prompt, optional context, user task.
fn chat_messages(request: &GenerationRequest) -> Vec<Value> {
    let mut messages = vec![json!({ "role": "system", "content": request.system_prompt })];
    if let Some(ref ctx) = request.context {
        messages.push(json!({ "role": "system", "content": ctx }));
    }
    messages.push(json!({ "role": "user", "content": request.instruction }));
    messages
}

fn extract_chat_completion_text(json: &Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}

fn extract_anthropic_text(json: &Value) -> Option<String> {
    json.get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| {
            arr.iter()
                .filter_map(|block| {
                    if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                        block.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .reduce(|a, b| format!("{}\n{}", a, b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: GenerationProvider) -> GenerationSettings {
        GenerationSettings {
            provider,
            base_url: "https://example.test/".to_string(),
            api_key: "key".to_string(),
            model: "gpt-4.1".to_string(),
            api_version: Some("2024-02-15-preview".to_string()),
            timeout_secs: 30,
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: "You are the research agent.".to_string(),
            context: Some("Previous agent outputs:\n{}".to_string()),
            instruction: "Find SLA data".to_string(),
            temperature: Some(0.3),
            max_tokens: 2000,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let azure = ChatCompletionClient::new(settings(GenerationProvider::Azure)).unwrap();
        assert_eq!(
            azure.endpoint_url(),
            "https://example.test/openai/deployments/gpt-4.1/chat/completions?api-version=2024-02-15-preview"
        );
        let openai = ChatCompletionClient::new(settings(GenerationProvider::OpenAi)).unwrap();
        assert_eq!(openai.endpoint_url(), "https://example.test/chat/completions");
        let anthropic = ChatCompletionClient::new(settings(GenerationProvider::Anthropic)).unwrap();
        assert_eq!(anthropic.endpoint_url(), "https://example.test/v1/messages");
    }

    #[test]
    fn test_openai_body_has_context_as_second_system_message() {
        let client = ChatCompletionClient::new(settings(GenerationProvider::OpenAi)).unwrap();
        let body = client.request_body(&request());
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "system");
        assert_eq!(messages[2]["content"], "Find SLA data");
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_azure_body_omits_model() {
        let client = ChatCompletionClient::new(settings(GenerationProvider::Azure)).unwrap();
        let body = client.request_body(&request());
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_anthropic_body_merges_context_into_system() {
        let client = ChatCompletionClient::new(settings(GenerationProvider::Anthropic)).unwrap();
        let body = client.request_body(&request());
        let system = body["system"].as_str().unwrap();
        assert!(system.starts_with("You are the research agent."));
        assert!(system.contains("Previous agent outputs"));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text() {
        let openai = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(extract_chat_completion_text(&openai).as_deref(), Some("hello"));

        let anthropic = json!({"content": [
            {"type": "text", "text": "part one"},
            {"type": "tool_use", "id": "x"},
            {"type": "text", "text": "part two"}
        ]});
        assert_eq!(
            extract_anthropic_text(&anthropic).as_deref(),
            Some("part one\npart two")
        );
        assert!(extract_chat_completion_text(&json!({})).is_none());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(GenerationProvider::from_str("Azure"), Some(GenerationProvider::Azure));
        assert_eq!(GenerationProvider::from_str("claude"), Some(GenerationProvider::Anthropic));
        assert_eq!(GenerationProvider::from_str("bard"), None);
    }
}
