use anima_core::{Collaborator, GenerationRequest};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::json;

/// Why a collaborator call produced nothing usable.
///
/// Call sites never branch on the variant: any error means "run the
/// deterministic fallback now". The variants exist for logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("no collaborator configured")]
    Unavailable,
    #[error("collaborator timed out after {0:?}")]
    Timeout(Duration),
    #[error("collaborator returned an empty reply")]
    Empty,
    #[error("collaborator reply was malformed: {0}")]
    Invalid(String),
    #[error("collaborator transport failed: {0}")]
    Transport(String),
}

/// Optional collaborator with a hard per-call timeout.
#[derive(Clone)]
pub struct CollaboratorHandle {
    inner: Option<Arc<dyn Collaborator>>,
    timeout: Duration,
}

impl fmt::Debug for CollaboratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaboratorHandle")
            .field("collaborator", &self.inner.as_ref().map(|c| c.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for CollaboratorHandle {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl CollaboratorHandle {
    pub fn new(collaborator: Arc<dyn Collaborator>, timeout: Duration) -> Self {
        Self {
            inner: Some(collaborator),
            timeout,
        }
    }

    pub fn from_option(collaborator: Option<Arc<dyn Collaborator>>, timeout: Duration) -> Self {
        Self {
            inner: collaborator,
            timeout,
        }
    }

    /// A handle whose every call fails with `Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            inner: None,
            timeout: Duration::from_secs(8),
        }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One bounded call. Blank replies count as failure; no retries.
    pub async fn ask(&self, request: &GenerationRequest) -> Result<String, CollaboratorError> {
        let collaborator = self.inner.as_ref().ok_or(CollaboratorError::Unavailable)?;

        let reply = match tokio::time::timeout(self.timeout, collaborator.generate(request)).await {
            Err(_) => return Err(CollaboratorError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(CollaboratorError::Transport(e.to_string())),
            Ok(Ok(text)) => text,
        };

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(CollaboratorError::Empty);
        }
        Ok(trimmed.to_string())
    }

    /// `ask`, then leniently parse the reply as `T`.
    pub async fn ask_json<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<T, CollaboratorError> {
        let text = self.ask(request).await?;
        json::parse_lenient(&text).ok_or_else(|| CollaboratorError::Invalid(truncate(&text, 80)))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
