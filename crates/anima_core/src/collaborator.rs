//! Outbound contract with the language-generation collaborator.

use async_trait::async_trait;

/// One bounded generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Short system-style instruction ("Respond with JSON only.")
    pub style: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: style.into(),
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }
}

/// Returns free text, or an error meaning "unavailable". Callers treat
/// empty and malformed replies the same way as errors.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String>;

    fn name(&self) -> &str {
        "collaborator"
    }
}
