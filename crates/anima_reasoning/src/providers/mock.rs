//! Deterministic collaborators for tests and offline runs.

use anima_core::{Collaborator, GenerationRequest};
use anyhow::Result;
use std::sync::Mutex;
use std::time::Duration;

/// Replies chosen by prompt substring, first matching rule wins.
/// Requests are recorded so tests can assert on prompts and parameters.
#[derive(Debug, Default)]
pub struct ScriptedCollaborator {
    rules: Vec<(String, String)>,
    fallback: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same reply for every prompt.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub fn on(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    /// Sleep before answering; used to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone());
        match reply {
            Some(r) => Ok(r),
            None => anyhow::bail!("no scripted reply for prompt"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCollaborator;

#[async_trait::async_trait]
impl Collaborator for SilentCollaborator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        anyhow::bail!("collaborator offline")
    }

    fn name(&self) -> &str {
        "silent"
    }
}
