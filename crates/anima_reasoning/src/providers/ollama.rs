//! Ollama collaborator.
//!
//! Ollama exposes an OpenAI-compatible API at localhost:11434/v1; we use the
//! non-streaming chat completions endpoint.

use anima_core::config::LlmConfig;
use anima_core::{Collaborator, GenerationRequest};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        // The handle enforces the real bound; this only stops leaked sockets.
        Self::with_base_url(&config.model, base_url, config.timeout() * 2)
    }

    pub fn with_base_url(model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_payload(model: &str, request: &GenerationRequest) -> Value {
    let mut messages = Vec::new();
    if !request.style.is_empty() {
        messages.push(json!({"role": "system", "content": request.style}));
    }
    messages.push(json!({"role": "user", "content": request.prompt}));
    json!({
        "model": model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": false,
    })
}

fn parse_completion(resp: &Value) -> Result<String> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .context("Ollama response missing choices[0].message.content")
}

#[async_trait::async_trait]
impl Collaborator for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let payload = build_payload(&self.model, request);

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let err_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama error {}: {}", status, err_text);
        }

        let resp_json: Value = response.json().await?;
        parse_completion(&resp_json)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
