//! # Anima Reasoning
//!
//! Everything that talks to the language-generation collaborator:
//!
//! - [`CollaboratorHandle`]: optional collaborator plus a hard timeout, with
//!   every failure folded into a typed [`CollaboratorError`]
//! - [`json`]: lenient extraction of JSON objects/arrays from free text
//! - [`providers`]: an Ollama HTTP client and scripted test doubles

pub mod json;
pub mod llm;
pub mod providers;

pub use llm::{CollaboratorError, CollaboratorHandle};

use anima_core::config::LlmConfig;
use anima_core::Collaborator;
use std::sync::Arc;

/// Build the configured collaborator. `provider = "none"` yields `None`,
/// which every call site treats as "unavailable".
pub fn build_collaborator(config: &LlmConfig) -> anyhow::Result<Option<Arc<dyn Collaborator>>> {
    match config.provider.as_str() {
        "none" | "" => Ok(None),
        "ollama" => {
            let client = providers::ollama::OllamaClient::from_config(config)?;
            tracing::info!("Collaborator: ollama ({})", config.model);
            Ok(Some(Arc::new(client)))
        }
        other => anyhow::bail!("Unknown LLM provider: {}", other),
    }
}
