//! LLM client for code annotation.
//!
//! Supports the Ollama API for local inference and OpenAI-compatible chat
//! completion APIs (OpenAI, Groq, Together.ai).

mod config;
mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{build_annotation_prompt, ANNOTATION_SYSTEM_PROMPT, ANNOTATION_USER_MESSAGE};

/// LLM client for code analysis.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is available.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self.authorized(self.client.get(self.models_url())).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List available models.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let resp = self
            .authorized(self.client.get(self.models_url()))
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::Api(format!("HTTP {}", resp.status())));
        }

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelEntry>,
        }

        #[derive(Deserialize)]
        struct ModelEntry {
            id: String,
        }

        match self.config.provider {
            LlmProvider::Ollama => {
                let tags: TagsResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;
                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
            LlmProvider::OpenAI => {
                let models: ModelsResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;
                Ok(models.data.into_iter().map(|m| m.id).collect())
            }
        }
    }

    /// Ask the model to annotate `code`. Returns the raw model text; parsing
    /// and validation happen in the caller.
    pub async fn generate_annotations(
        &self,
        code: &str,
        context: Option<&str>,
    ) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let truncated = self.truncate_content(code);
        let system =
            build_annotation_prompt(self.config.get_annotation_prompt(), truncated, context);

        debug!(
            "Requesting annotations from {} ({} chars of code)",
            self.config.model,
            truncated.chars().count()
        );
        self.complete(&system, ANNOTATION_USER_MESSAGE).await
    }

    /// Run a single completion with the configured provider.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(system, user).await,
            LlmProvider::OpenAI => self.call_openai(system, user).await,
        }
    }

    /// Truncate content to the configured maximum number of characters.
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.config.max_content_chars) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }

    fn models_url(&self) -> String {
        match self.config.provider {
            LlmProvider::Ollama => format!("{}/api/tags", self.config.endpoint),
            LlmProvider::OpenAI => format!("{}/v1/models", self.config.endpoint),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.provider, &self.config.api_key) {
            (LlmProvider::OpenAI, Some(key)) => request.bearer_auth(key),
            _ => request,
        }
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.config.model,
            system,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(LlmError::ModelNotFound(self.config.model.clone()));
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }

    /// Call an OpenAI-compatible chat completion endpoint.
    async fn call_openai(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let resp = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("Empty completion response".to_string()))
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Model not available
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    /// LLM is disabled
    #[error("LLM is disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(config: LlmConfig) -> LlmClient {
        LlmClient::new(config).unwrap()
    }

    #[test]
    fn test_truncate_content_is_char_safe() {
        let mut config = LlmConfig::base_default();
        config.max_content_chars = 3;
        let client = client_with(config);

        assert_eq!(client.truncate_content("ééééé"), "ééé");
        assert_eq!(client.truncate_content("ab"), "ab");
    }

    #[test]
    fn test_models_url_per_provider() {
        let client = client_with(LlmConfig::base_default());
        assert_eq!(client.models_url(), "http://localhost:11434/api/tags");

        let mut config = LlmConfig::base_default().with_endpoint("https://api.openai.com");
        config.provider = LlmProvider::OpenAI;
        let client = client_with(config);
        assert_eq!(client.models_url(), "https://api.openai.com/v1/models");
    }

    #[tokio::test]
    async fn test_disabled_client_refuses_work() {
        let mut config = LlmConfig::base_default();
        config.enabled = false;
        let client = client_with(config);

        assert!(!client.is_available().await);
        assert!(matches!(
            client.generate_annotations("s(\"bd\")", None).await,
            Err(LlmError::Disabled)
        ));
    }
}
