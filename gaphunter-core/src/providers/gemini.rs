//! Google Gemini API client.
//!
//! Implements [`CompletionClient`] against the native `generateContent`
//! endpoint. One request per call; no retries and no streaming.
//!
//! Request layout: a single `user` turn whose parts are, in order, the system
//! instruction text, one `inline_data` part per file, then the user
//! instruction text. Auth is the `?key=API_KEY` query parameter.

use crate::client::CompletionClient;
use crate::config::LlmConfig;
use crate::error::{CompletionError, ConfigError};
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini completion client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    /// Resolved once at construction; `None` is reported on first use.
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client from configuration.
    ///
    /// The key comes from `config.api_key` or the `config.api_key_env`
    /// environment variable. Its absence does not fail construction.
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .filter(|k| !k.trim().is_empty());
        Self::build(config, api_key)
    }

    /// Create a client with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, CompletionError> {
        Self::build(config, Some(api_key))
    }

    fn build(config: &LlmConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CompletionError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Whether an API key was found.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the JSON request body.
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut parts: Vec<Value> = Vec::with_capacity(request.files.len() + 2);
        parts.push(serde_json::json!({"text": request.system}));
        parts.extend(request.files.iter().map(|file| {
            serde_json::json!({
                "inline_data": {
                    "mime_type": file.media_type,
                    "data": file.data,
                }
            })
        }));
        parts.push(serde_json::json!({"text": request.user}));

        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": {
                "maxOutputTokens": self.max_tokens,
                "temperature": self.temperature,
            },
        })
    }

    /// Parse a Gemini API response JSON into a `CompletionResponse`.
    fn parse_response(body: &Value) -> Result<CompletionResponse, CompletionError> {
        let block_reason = body["promptFeedback"]["blockReason"]
            .as_str()
            .map(|s| s.to_string());

        let candidate = match body["candidates"].as_array().and_then(|c| c.first()) {
            Some(candidate) => candidate,
            None => {
                return Err(CompletionError::EmptyResponse {
                    reason: block_reason,
                });
            }
        };

        let finish_reason = candidate["finishReason"].as_str().map(|s| s.to_string());

        let text: String = candidate["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse {
                reason: finish_reason.or(block_reason),
            });
        }

        let usage_metadata = &body["usageMetadata"];
        let usage = TokenUsage {
            input_tokens: usage_metadata["promptTokenCount"].as_u64().unwrap_or(0) as usize,
            output_tokens: usage_metadata["candidatesTokenCount"].as_u64().unwrap_or(0) as usize,
        };

        let model = body["modelVersion"]
            .as_str()
            .unwrap_or("gemini")
            .to_string();

        Ok(CompletionResponse {
            text,
            model,
            finish_reason,
            usage,
        })
    }

    /// Map an HTTP status code to the appropriate `CompletionError`.
    ///
    /// Keeps the service's own `error.message` when the body carries one.
    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> CompletionError {
        let service_message = serde_json::from_str::<Value>(body_text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()));
        let message =
            service_message.unwrap_or_else(|| format!("HTTP {} from Gemini API: {}", status, body_text));

        match status.as_u16() {
            401 | 403 => CompletionError::AuthFailed { message },
            429 => CompletionError::QuotaExceeded { message },
            _ => CompletionError::ApiRequest { message },
        }
    }

    /// Map a transport-level failure.
    fn map_send_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if err.is_connect() {
            CompletionError::Connection {
                message: format!("Could not reach Gemini API: {}", err),
            }
        } else {
            CompletionError::ApiRequest {
                message: format!("Request to Gemini API failed: {}", err),
            }
        }
    }

    /// Build the endpoint URL without the key, safe for logging.
    fn endpoint_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingApiKey {
                var: self.api_key_env.clone(),
            })?;

        let body = self.build_request_body(&request);
        let url = self.endpoint_url("generateContent");

        debug!(
            model = self.model.as_str(),
            url = url.as_str(),
            files = request.files.len(),
            "Sending Gemini completion request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| CompletionError::ResponseParse {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| CompletionError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        let parsed = Self::parse_response(&response_json)?;
        debug!(
            model = parsed.model.as_str(),
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Gemini completion received"
        );
        Ok(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
