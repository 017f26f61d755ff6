//! Engine backed by a local Ollama-compatible model server.

use crate::config::LocalModelConfig;
use crate::http_error::{error_message, map_http_error, map_request_error};
use ares_core::generation::{GenerationRequest, PatientEngine};
use ares_core::{AresError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND: &str = "local model server";

/// Talks to `/api/chat` on an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaPatientEngine {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaPatientEngine {
    /// Connects and verifies that the configured model is available.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotLoaded` if the server is unreachable or does not list
    /// the model.
    pub async fn connect(config: &LocalModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AresError::internal(format!("failed to build HTTP client: {e}")))?;

        let engine = Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        };

        let available = engine.list_models().await?;
        if !available.iter().any(|name| model_matches(name, &engine.model)) {
            return Err(AresError::model_not_loaded(format!(
                "model '{}' is not available on {} (found: {})",
                engine.model,
                engine.base_url,
                available.join(", ")
            )));
        }

        tracing::info!(model = %engine.model, url = %engine.base_url, "Connected to local model server");
        Ok(engine)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            AresError::model_not_loaded(format!("cannot reach {BACKEND} at {}: {e}", self.base_url))
        })?;

        if !response.status().is_success() {
            return Err(AresError::model_not_loaded(format!(
                "{BACKEND} returned {} for {url}",
                response.status()
            )));
        }

        let tags: TagsResponse = response.json().await.map_err(|e| {
            AresError::model_not_loaded(format!("unexpected model list from {BACKEND}: {e}"))
        })?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}

/// `phi3.5` matches `phi3.5`, `phi3.5:latest`, `phi3.5:3.8b`.
fn model_matches(available: &str, wanted: &str) -> bool {
    available == wanted
        || available
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with(':'))
}

fn chat_request<'a>(model: &'a str, request: &'a GenerationRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: request
            .prompt
            .turns
            .iter()
            .map(|turn| ChatTurn {
                role: turn.role.into(),
                content: &turn.content,
            })
            .collect(),
        stream: false,
        options: ChatOptions {
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            repeat_penalty: request.params.repetition_penalty,
            num_predict: request.params.max_new_tokens,
        },
    }
}

#[async_trait]
impl PatientEngine for OllamaPatientEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = chat_request(&self.model, request);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(BACKEND, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                return Err(AresError::model_not_loaded(format!(
                    "model '{}' is not loaded: {}",
                    self.model,
                    error_message(&text)
                )));
            }
            return Err(map_http_error(BACKEND, status, &text, None));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AresError::generation(format!("failed to parse {BACKEND} response: {e}"))
        })?;
        Ok(parsed.message.content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Deserialize)]
struct TagsModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ares_core::generation::GenerationParams;
    use ares_core::prompt::Prompt;
    use ares_core::session::ChatMessage;

    #[test]
    fn test_model_matches_tags() {
        assert!(model_matches("phi3.5", "phi3.5"));
        assert!(model_matches("phi3.5:latest", "phi3.5"));
        assert!(!model_matches("phi3.5-mini", "phi3.5"));
        assert!(!model_matches("llama3", "phi3.5"));
    }

    #[test]
    fn test_chat_request_body() {
        let prompt = Prompt {
            turns: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
        };
        let request = GenerationRequest::new(prompt, GenerationParams::default()).unwrap();
        let body = serde_json::to_value(chat_request("phi3.5", &request)).unwrap();

        assert_eq!(body["model"], "phi3.5");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["options"]["num_predict"], 80);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_model_not_loaded() {
        let config = LocalModelConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            ..LocalModelConfig::default()
        };
        let err = OllamaPatientEngine::connect(&config).await.unwrap_err();
        assert!(err.is_model_not_loaded());
    }
}
