//! Engine backed by a remote text-generation inference endpoint.

use crate::config::RemoteEndpointConfig;
use crate::http_error::{map_http_error, map_request_error, parse_retry_after};
use ares_core::generation::{GenerationRequest, PatientEngine};
use ares_core::{AresError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND: &str = "inference endpoint";

/// Sends the flattened transcript to a dedicated endpoint with a bearer
/// token.
#[derive(Clone)]
pub struct EndpointPatientEngine {
    client: Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for EndpointPatientEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointPatientEngine")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl EndpointPatientEngine {
    /// Creates the engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotLoaded` if the endpoint URL or token is missing.
    pub fn new(config: &RemoteEndpointConfig) -> Result<Self> {
        let url = non_blank(config.url.as_deref()).ok_or_else(|| {
            AresError::model_not_loaded("remote endpoint URL is not configured (HF_ENDPOINT_URL)")
        })?;
        let token = non_blank(config.token.as_deref()).ok_or_else(|| {
            AresError::model_not_loaded("remote endpoint token is not configured (HF_TOKEN)")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AresError::internal(format!("failed to build HTTP client: {e}")))?;

        tracing::info!(url = %url, "Using remote inference endpoint");
        Ok(Self {
            client,
            url: url.to_string(),
            token: token.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn endpoint_request(request: &GenerationRequest) -> EndpointRequest {
    EndpointRequest {
        inputs: request.prompt.to_transcript(),
        parameters: EndpointParameters {
            max_new_tokens: request.params.max_new_tokens,
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            repetition_penalty: request.params.repetition_penalty,
            return_full_text: false,
        },
    }
}

/// Pulls `generated_text` out of either response shape the endpoint uses.
fn extract_generated_text(response: EndpointResponse) -> Result<String> {
    let text = match response {
        EndpointResponse::List(items) => items.into_iter().next().map(|item| item.generated_text),
        EndpointResponse::Single(item) => Some(item.generated_text),
    };
    text.map(|t| t.trim().to_string())
        .ok_or_else(|| AresError::generation(format!("{BACKEND} returned no generated text")))
}

#[async_trait]
impl PatientEngine for EndpointPatientEngine {
    fn name(&self) -> &str {
        "remote"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = endpoint_request(request);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(BACKEND, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_error(BACKEND, status, &text, retry_after));
        }

        let parsed: EndpointResponse = response.json().await.map_err(|e| {
            AresError::generation(format!("failed to parse {BACKEND} response: {e}"))
        })?;
        extract_generated_text(parsed)
    }
}

#[derive(Serialize)]
struct EndpointRequest {
    inputs: String,
    parameters: EndpointParameters,
}

#[derive(Serialize)]
struct EndpointParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    return_full_text: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointResponse {
    List(Vec<GeneratedItem>),
    Single(GeneratedItem),
}

#[derive(Deserialize)]
struct GeneratedItem {
    #[serde(default)]
    generated_text: String,
}
