use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::backend::{BackendClient, BackendReply};
use super::types::BackendError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOKENS: u32 = 400;
const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Settings for a generic JSON text-generation endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Read `LLM_API_URL` and friends. Returns `None` when no endpoint is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("LLM_API_URL").filter(|value| !value.trim().is_empty())?;

        let mut config = Self::new(endpoint.trim());
        config.api_key = lookup("LLM_API_KEY").filter(|value| !value.is_empty());

        match lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            Some(0) => log::warn!("ignoring LLM_TIMEOUT_SECS=0; keeping the default timeout"),
            Some(secs) => config.timeout = Duration::from_secs(secs),
            None => {}
        }
        if let Some(tokens) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse::<u32>().ok()) {
            config.max_tokens = tokens;
        }
        if let Some(temperature) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse::<f32>().ok()) {
            config.temperature = temperature;
        }

        Some(config)
    }
}

#[derive(Debug, Serialize)]
struct PromptPayload<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// Backend that POSTs the prompt as JSON and parses the JSON reply
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn send_prompt(&self, prompt: &str) -> Result<BackendReply, BackendError> {
        let payload = PromptPayload {
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        log::debug!(
            "sending {} byte prompt to {}",
            prompt.len(),
            self.config.endpoint
        );

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|error| BackendError::MalformedBody(error.to_string()))?;

        Ok(BackendReply::from_json(value))
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}
